// Draw list construction
// Converts the session into per-tile draw commands the terminal host composites

use unicode_width::UnicodeWidthStr;

use crate::msw_board::{Pos, Tile, TileValue};
use crate::msw_color::{Rgb, Tint};
use crate::msw_game::{Game, TILE_H, TILE_W};

pub const OPEN_TINT: Tint = Tint::new(-0.1, -0.1, -0.1);
pub const FOCUS_TINT: Tint = Tint::new(0.1, 0.1, 0.0);
pub const LOSS_TINT: Tint = Tint::new(0.3, 0.0, 0.0);
pub const WIN_TINT: Tint = Tint::new(0.0, 0.3, 0.0);

/// One host cell of a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteCell {
    pub symbol: &'static str,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// Shared image for every tile: grey face with a darker inset edge on the right
pub const CLOSED_TILE: [SpriteCell; TILE_W as usize] = [
    SpriteCell {
        symbol: " ",
        fg: Rgb(128, 128, 128),
        bg: Rgb(180, 180, 180),
    },
    SpriteCell {
        symbol: "▕",
        fg: Rgb(128, 128, 128),
        bg: Rgb(180, 180, 180),
    },
];

pub const TEXT_COLOR: Rgb = Rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub pos: Pos,
    pub sprite: &'static [SpriteCell],
    /// Top-left host cell of the tile, relative to the board origin
    pub translate: (i32, i32),
    pub tint: Option<Tint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCommand {
    pub text: &'static str,
    pub at: (i32, i32),
}

/// Everything needed to paint the board for one frame, in paint order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub closed: Vec<DrawCommand>,
    pub opened: Vec<DrawCommand>,
    pub texts: Vec<TextCommand>,
}

/// Labels for mines and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub mine: &'static str,
    pub flag: &'static str,
}

impl Glyphs {
    pub fn new(unicode: bool) -> Self {
        if unicode {
            Glyphs { mine: "☼", flag: "⚑" }
        } else {
            Glyphs { mine: "M", flag: "F" }
        }
    }
}

const DIGITS: [&str; 9] = ["", "1", "2", "3", "4", "5", "6", "7", "8"];

/// Text shown on a tile, if any
pub fn tile_text(tile: &Tile, glyphs: &Glyphs) -> Option<&'static str> {
    if tile.is_opened() {
        match tile.value() {
            TileValue::Mine => Some(glyphs.mine),
            TileValue::Count(0) => None,
            TileValue::Count(n) => DIGITS.get(n as usize).copied(),
        }
    } else if tile.is_flagged() {
        Some(glyphs.flag)
    } else {
        None
    }
}

fn tile_tint(game: &Game, tile: &Tile) -> Option<Tint> {
    if game.lost && game.exploded == Some(tile.pos()) {
        Some(LOSS_TINT)
    } else if game.won {
        Some(WIN_TINT)
    } else if tile.is_opened() {
        Some(OPEN_TINT)
    } else if tile.is_focused() {
        Some(FOCUS_TINT)
    } else {
        None
    }
}

/// Top-left cell that centers `text` in the tile at `(x, y)`
pub fn centered_text_at(text: &str, (x, y): Pos) -> (i32, i32) {
    let width = text.width() as i32;
    let cx = TILE_W * x as i32 + (TILE_W - width).max(0) / 2;
    let cy = TILE_H * y as i32 + (TILE_H - 1) / 2;
    (cx, cy)
}

/// Build the frame's draw commands: closed tiles, then opened tiles, then text
pub fn draw_list(game: &Game, glyphs: &Glyphs) -> DrawList {
    let capacity = game.board.width() * game.board.height();
    let mut list = DrawList {
        closed: Vec::with_capacity(capacity),
        opened: Vec::with_capacity(capacity),
        texts: Vec::new(),
    };
    for tile in game.board.tiles() {
        let (x, y) = tile.pos();
        let cmd = DrawCommand {
            pos: (x, y),
            sprite: &CLOSED_TILE,
            translate: (TILE_W * x as i32, TILE_H * y as i32),
            tint: tile_tint(game, tile),
        };
        if tile.is_opened() {
            list.opened.push(cmd);
        } else {
            list.closed.push(cmd);
        }
        if let Some(text) = tile_text(tile, glyphs) {
            list.texts.push(TextCommand {
                text,
                at: centered_text_at(text, (x, y)),
            });
        }
    }
    list
}
