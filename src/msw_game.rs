// Game session and interaction state machine
// Turns per-frame input snapshots into tile transitions, and tracks win/loss

use bitflags::bitflags;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::msw_board::{Board, OpenOutcome, Pos, TileValue};

pub const BOARD_W: usize = 32;
pub const BOARD_H: usize = 24;
pub const MINE_COUNT: usize = 99;

/// Host cells covered by one tile
pub const TILE_W: i32 = 2;
pub const TILE_H: i32 = 1;

bitflags! {
    /// Mouse buttons currently held down
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct MouseButtons: u8 {
        const LEFT  = 1;
        const RIGHT = 1 << 1;
    }
}

bitflags! {
    /// Edge-triggered inputs raised during the current frame
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Triggers: u8 {
        const RIGHT_CLICK  = 1;
        const NEW_GAME     = 1 << 1;
        const TOGGLE_DEBUG = 1 << 2;
    }
}

/// Input snapshot for one frame
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    /// Pointer position in host cells, relative to the board origin
    pub cursor: Option<(i32, i32)>,
    pub held: MouseButtons,
    pub pressed: Triggers,
}

impl InputState {
    pub fn left(&self) -> bool {
        self.held.contains(MouseButtons::LEFT)
    }

    pub fn both(&self) -> bool {
        self.held.contains(MouseButtons::LEFT | MouseButtons::RIGHT)
    }

    /// Drop the edge-triggered flags once a frame has consumed them
    pub fn end_frame(&mut self) {
        self.pressed = Triggers::empty();
    }
}

/// Where the pointer interaction currently is
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PressState {
    #[default]
    Idle,
    /// Left button held on a tile, released over it opens it
    SinglePress(Pos),
    /// Both buttons held around a center tile
    Chord(Pos),
    /// Left button still held after a chord resolved on this tile
    Consumed(Pos),
}

impl PressState {
    /// The tile the current press is tracking, if any
    pub fn tracked(self) -> Option<Pos> {
        match self {
            PressState::Idle => None,
            PressState::SinglePress(p) | PressState::Chord(p) | PressState::Consumed(p) => Some(p),
        }
    }
}

/// One game session
#[derive(Debug, Clone)]
pub struct Game {
    pub board: Board,
    pub hovered: Option<Pos>,
    pub press: PressState,
    pub exploded: Option<Pos>,
    pub lost: bool,
    pub won: bool,
    pub show_debug: bool,
    mines: usize,
}

/// Wall-clock seed for a new layout
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Game {
    /// Start a new 32x24 game with a time-seeded layout
    pub fn new() -> Self {
        let seed = time_seed();
        log::debug!("New game, seed {}", seed);
        let mut rng = StdRng::seed_from_u64(seed);
        Game::with_board(Board::generate(BOARD_W, BOARD_H, MINE_COUNT, &mut rng))
    }

    /// Start a session on a prepared board
    pub fn with_board(board: Board) -> Self {
        let mines = board.mine_count();
        Game {
            board,
            hovered: None,
            press: PressState::Idle,
            exploded: None,
            lost: false,
            won: false,
            show_debug: false,
            mines,
        }
    }

    /// Replace the board and reset every piece of session state
    pub fn new_game(&mut self) {
        let show_debug = self.show_debug;
        *self = Game::new();
        self.show_debug = show_debug;
    }

    pub fn is_over(&self) -> bool {
        self.lost || self.won
    }

    /// Mines minus flags, may go negative
    pub fn mines_left(&self) -> isize {
        self.mines as isize - self.board.flag_count() as isize
    }

    fn hovered_tile(&self, cursor: Option<(i32, i32)>) -> Option<Pos> {
        let (cx, cy) = cursor?;
        let tx = cx.div_euclid(TILE_W);
        let ty = cy.div_euclid(TILE_H);
        self.board.at(tx, ty).map(|t| t.pos())
    }

    /// Advance one frame
    pub fn update(&mut self, input: &InputState) {
        if input.pressed.contains(Triggers::TOGGLE_DEBUG) {
            self.show_debug = !self.show_debug;
        }
        if input.pressed.contains(Triggers::NEW_GAME) {
            self.new_game();
            return;
        }
        if self.is_over() {
            return;
        }

        self.hovered = self.hovered_tile(input.cursor);
        if let Some(pos) = self.hovered {
            if input.both() {
                self.press_chord(pos);
            } else if let PressState::Chord(center) = self.press {
                self.resolve_chord(center, input.left());
            } else if input.left() {
                if self.press.tracked() != Some(pos) {
                    self.press_single(pos);
                }
            } else if let PressState::SinglePress(pressed) = self.press {
                self.release_single(pressed, pos);
            } else {
                if let PressState::Consumed(_) = self.press {
                    self.press = PressState::Idle;
                }
                if input.pressed.contains(Triggers::RIGHT_CLICK) {
                    if let Some(tile) = self.board.tile_mut(pos) {
                        tile.toggle_flag();
                    }
                }
            }
        }

        self.check_win();
    }

    /// Both buttons down: focus the center and its neighborhood
    fn press_chord(&mut self, center: Pos) {
        self.board.reset_focus();
        self.press = PressState::Chord(center);
        let around: Vec<Pos> = self.board.neighbors(center.0, center.1).collect();
        for p in std::iter::once(center).chain(around) {
            if let Some(tile) = self.board.tile_mut(p) {
                tile.focus();
            }
        }
    }

    /// A button came up during a chord: open the neighborhood if the flags add up
    fn resolve_chord(&mut self, center: Pos, left_held: bool) {
        self.board.reset_focus();
        self.press = if left_held {
            PressState::Consumed(center)
        } else {
            PressState::Idle
        };

        let Some(tile) = self.board.tile(center) else {
            return;
        };
        if !tile.is_opened() {
            return;
        }
        let TileValue::Count(n) = tile.value() else {
            return;
        };
        let flagged = self.board.flagged_neighbors(center.0, center.1);
        if flagged != n as usize {
            log::trace!("Chord at {:?} skipped, {} flags for value {}", center, flagged, n);
            return;
        }

        log::debug!("Chord at {:?}", center);
        let around: Vec<Pos> = self.board.neighbors(center.0, center.1).collect();
        for p in around {
            if self.board.tile(p).is_some_and(|t| t.is_flagged()) {
                continue;
            }
            self.open_at(p);
            if self.lost {
                break;
            }
        }
    }

    /// Left button down on a new tile
    fn press_single(&mut self, pos: Pos) {
        self.board.reset_focus();
        if let Some(tile) = self.board.tile_mut(pos) {
            tile.focus();
        }
        self.press = PressState::SinglePress(pos);
    }

    /// Left button released: open the pressed tile if still over it
    fn release_single(&mut self, pressed: Pos, hovered: Pos) {
        let focused = self.board.tile(pressed).is_some_and(|t| t.is_focused());
        self.board.reset_focus();
        self.press = PressState::Idle;
        if focused && pressed == hovered {
            self.open_at(pressed);
        }
    }

    fn open_at(&mut self, pos: Pos) {
        if let OpenOutcome::Mine = self.board.open(pos) {
            log::info!("Mine hit at {:?}", pos);
            self.lost = true;
            self.exploded = Some(pos);
        }
    }

    fn check_win(&mut self) {
        if self.lost || self.won {
            return;
        }
        if self.board.all_safe_opened() {
            log::info!("Board cleared");
            self.won = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(w: usize, h: usize, mines: &[Pos]) -> Game {
        Game::with_board(Board::from_mine_coords(w, h, mines).unwrap())
    }

    fn at(pos: Pos, held: MouseButtons) -> InputState {
        InputState {
            cursor: Some((pos.0 as i32 * TILE_W, pos.1 as i32 * TILE_H)),
            held,
            pressed: Triggers::empty(),
        }
    }

    fn click(g: &mut Game, pos: Pos) {
        g.update(&at(pos, MouseButtons::LEFT));
        g.update(&at(pos, MouseButtons::empty()));
    }

    fn right_click(g: &mut Game, pos: Pos) {
        let mut input = at(pos, MouseButtons::RIGHT);
        input.pressed = Triggers::RIGHT_CLICK;
        g.update(&input);
        g.update(&at(pos, MouseButtons::empty()));
    }

    fn chord(g: &mut Game, pos: Pos) {
        g.update(&at(pos, MouseButtons::LEFT));
        g.update(&at(pos, MouseButtons::LEFT | MouseButtons::RIGHT));
        g.update(&at(pos, MouseButtons::LEFT));
        g.update(&at(pos, MouseButtons::empty()));
    }

    fn opened(g: &Game, pos: Pos) -> bool {
        g.board.tile(pos).unwrap().is_opened()
    }

    /// 5x5, mines at (0,0) and (2,0); (1,1) has value 2
    fn two_mine_game() -> Game {
        game(5, 5, &[(0, 0), (2, 0)])
    }

    #[test]
    fn press_focuses_and_release_opens() {
        let mut g = two_mine_game();
        g.update(&at((1, 1), MouseButtons::LEFT));
        assert_eq!(g.press, PressState::SinglePress((1, 1)));
        assert!(g.board.tile((1, 1)).unwrap().is_focused());
        assert!(!opened(&g, (1, 1)));

        g.update(&at((1, 1), MouseButtons::empty()));
        assert_eq!(g.press, PressState::Idle);
        assert!(opened(&g, (1, 1)));
        assert!(g.board.tiles().all(|t| !t.is_focused()));
    }

    #[test]
    fn dragging_moves_focus_to_new_tile() {
        let mut g = two_mine_game();
        g.update(&at((1, 1), MouseButtons::LEFT));
        g.update(&at((3, 3), MouseButtons::LEFT));
        assert!(!g.board.tile((1, 1)).unwrap().is_focused());
        assert!(g.board.tile((3, 3)).unwrap().is_focused());
        g.update(&at((3, 3), MouseButtons::empty()));
        assert!(opened(&g, (3, 3)));
        assert!(!opened(&g, (1, 0)));
    }

    #[test]
    fn pressing_flagged_tile_never_opens_it() {
        let mut g = two_mine_game();
        right_click(&mut g, (4, 4));
        assert!(g.board.tile((4, 4)).unwrap().is_flagged());
        click(&mut g, (4, 4));
        assert!(!opened(&g, (4, 4)));
        assert!(g.board.tile((4, 4)).unwrap().is_flagged());
    }

    #[test]
    fn right_click_toggles_flag_twice() {
        let mut g = two_mine_game();
        right_click(&mut g, (3, 2));
        assert_eq!(g.mines_left(), 1);
        right_click(&mut g, (3, 2));
        assert!(!g.board.tile((3, 2)).unwrap().is_flagged());
        assert_eq!(g.mines_left(), 2);
    }

    #[test]
    fn held_right_without_edge_does_not_flag() {
        let mut g = two_mine_game();
        g.update(&at((3, 2), MouseButtons::RIGHT));
        assert!(!g.board.tile((3, 2)).unwrap().is_flagged());
    }

    #[test]
    fn cursor_off_board_changes_nothing() {
        let mut g = two_mine_game();
        let mut input = at((0, 0), MouseButtons::LEFT);
        input.cursor = Some((-1, 0));
        g.update(&input);
        assert_eq!(g.hovered, None);
        assert_eq!(g.press, PressState::Idle);
        input.cursor = Some((5 * TILE_W, 0));
        g.update(&input);
        assert_eq!(g.press, PressState::Idle);
    }

    #[test]
    fn chord_focuses_closed_neighborhood() {
        let mut g = two_mine_game();
        click(&mut g, (1, 1));
        right_click(&mut g, (0, 0));
        g.update(&at((1, 1), MouseButtons::LEFT | MouseButtons::RIGHT));
        assert_eq!(g.press, PressState::Chord((1, 1)));
        // center is open and (0,0) flagged: neither takes focus
        assert!(!g.board.tile((1, 1)).unwrap().is_focused());
        assert!(!g.board.tile((0, 0)).unwrap().is_focused());
        for p in [(1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            assert!(g.board.tile(p).unwrap().is_focused(), "{:?}", p);
        }
        assert!(!g.board.tile((3, 3)).unwrap().is_focused());
    }

    #[test]
    fn chord_with_matching_flags_opens_neighbors() {
        let mut g = two_mine_game();
        click(&mut g, (1, 1));
        right_click(&mut g, (0, 0));
        right_click(&mut g, (2, 0));
        chord(&mut g, (1, 1));
        for p in [(1, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            assert!(opened(&g, p), "{:?}", p);
        }
        assert!(!g.lost);
        assert!(g.board.tile((0, 0)).unwrap().is_flagged());
        // (0,2) is empty, so the reveal cascades through the rest of the board
        assert!(opened(&g, (4, 4)));
        assert!(g.won);
    }

    #[test]
    fn chord_with_too_few_flags_is_noop() {
        let mut g = two_mine_game();
        click(&mut g, (1, 1));
        right_click(&mut g, (0, 0));
        chord(&mut g, (1, 1));
        for p in [(1, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            assert!(!opened(&g, p), "{:?}", p);
        }
    }

    #[test]
    fn chord_with_too_many_flags_is_noop() {
        let mut g = two_mine_game();
        click(&mut g, (1, 1));
        right_click(&mut g, (0, 0));
        right_click(&mut g, (2, 0));
        right_click(&mut g, (1, 2));
        chord(&mut g, (1, 1));
        for p in [(1, 0), (0, 1), (2, 1), (0, 2), (2, 2)] {
            assert!(!opened(&g, p), "{:?}", p);
        }
    }

    #[test]
    fn chord_with_wrong_flag_hits_mine() {
        let mut g = two_mine_game();
        click(&mut g, (1, 1));
        right_click(&mut g, (0, 0));
        right_click(&mut g, (1, 0));
        chord(&mut g, (1, 1));
        assert!(g.lost);
        assert_eq!(g.exploded, Some((2, 0)));
        assert!(!g.won);
        // reveal stops at the mine
        assert!(!opened(&g, (0, 1)));
    }

    #[test]
    fn release_after_chord_does_not_open_center_tile() {
        let mut g = two_mine_game();
        // chord on a closed tile: nothing resolves, and releasing left afterwards must not open it
        g.update(&at((3, 3), MouseButtons::LEFT | MouseButtons::RIGHT));
        g.update(&at((3, 3), MouseButtons::LEFT));
        assert_eq!(g.press, PressState::Consumed((3, 3)));
        g.update(&at((3, 3), MouseButtons::empty()));
        assert_eq!(g.press, PressState::Idle);
        assert!(!opened(&g, (3, 3)));
    }

    #[test]
    fn consumed_press_restarts_on_another_tile() {
        let mut g = two_mine_game();
        g.update(&at((3, 3), MouseButtons::LEFT | MouseButtons::RIGHT));
        g.update(&at((3, 3), MouseButtons::LEFT));
        g.update(&at((4, 4), MouseButtons::LEFT));
        assert_eq!(g.press, PressState::SinglePress((4, 4)));
        g.update(&at((4, 4), MouseButtons::empty()));
        assert!(opened(&g, (4, 4)));
    }

    #[test]
    fn right_click_ignored_during_chord() {
        let mut g = two_mine_game();
        let mut input = at((3, 3), MouseButtons::LEFT | MouseButtons::RIGHT);
        input.pressed = Triggers::RIGHT_CLICK;
        g.update(&input);
        assert!(!g.board.tile((3, 3)).unwrap().is_flagged());
    }

    #[test]
    fn opening_mine_loses_and_locks_input() {
        let mut g = two_mine_game();
        click(&mut g, (0, 0));
        assert!(g.lost);
        assert_eq!(g.exploded, Some((0, 0)));
        click(&mut g, (4, 4));
        assert!(!opened(&g, (4, 4)));
        right_click(&mut g, (3, 3));
        assert!(!g.board.tile((3, 3)).unwrap().is_flagged());
    }

    #[test]
    fn clearing_safe_tiles_wins() {
        let mut g = game(3, 1, &[(0, 0)]);
        click(&mut g, (2, 0));
        assert!(g.won);
        assert!(!g.lost);
        assert!(g.is_over());
    }

    #[test]
    fn win_only_after_last_safe_tile() {
        let mut g = game(3, 1, &[(1, 0)]);
        click(&mut g, (0, 0));
        assert!(!g.won);
        click(&mut g, (2, 0));
        assert!(g.won);
    }

    #[test]
    fn debug_toggle_works_after_game_over() {
        let mut g = two_mine_game();
        click(&mut g, (0, 0));
        let mut input = InputState::default();
        input.pressed = Triggers::TOGGLE_DEBUG;
        g.update(&input);
        assert!(g.show_debug);
    }

    #[test]
    fn new_game_resets_session() {
        let mut g = two_mine_game();
        g.show_debug = true;
        right_click(&mut g, (4, 4));
        click(&mut g, (0, 0));
        assert!(g.lost);

        let mut input = InputState::default();
        input.pressed = Triggers::NEW_GAME;
        g.update(&input);

        assert!(!g.lost && !g.won);
        assert_eq!(g.exploded, None);
        assert_eq!(g.hovered, None);
        assert_eq!(g.press, PressState::Idle);
        assert!(g.show_debug);
        assert_eq!(g.board.width(), BOARD_W);
        assert_eq!(g.board.height(), BOARD_H);
        assert_eq!(g.board.mine_count(), MINE_COUNT);
        assert!(g.board.tiles().all(|t| !t.is_opened() && !t.is_flagged() && !t.is_focused()));
    }

    #[test]
    fn default_game_is_a_fresh_expert_board() {
        let g = Game::default();
        assert_eq!((g.board.width(), g.board.height()), (BOARD_W, BOARD_H));
        assert_eq!(g.mines_left(), MINE_COUNT as isize);
        assert_eq!(g.press, PressState::Idle);
        assert!(!g.is_over());
    }

    #[test]
    fn end_frame_clears_edges_only() {
        let mut input = at((1, 1), MouseButtons::LEFT);
        input.pressed = Triggers::RIGHT_CLICK | Triggers::NEW_GAME;
        input.end_frame();
        assert!(input.pressed.is_empty());
        assert!(input.left());
    }
}
