// Board and tile model
// Handles mine layout generation, neighbor counting, bounded lookup and flood-fill reveal

use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(test)]
use thiserror::Error;

/// Grid position `(x, y)`
pub type Pos = (usize, usize);

#[cfg(test)]
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid coordinates ({0}, {1})")]
    InvalidCoords(usize, usize),
}

/// What a tile holds: a mine, or the number of neighboring mines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileValue {
    Mine,
    Count(u8),
}

impl TileValue {
    pub const EMPTY: TileValue = TileValue::Count(0);

    pub fn is_mine(self) -> bool {
        matches!(self, TileValue::Mine)
    }

    pub fn is_empty(self) -> bool {
        self == TileValue::EMPTY
    }
}

/// A single cell on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    value: TileValue,
    x: usize,
    y: usize,
    opened: bool,
    flagged: bool,
    focused: bool,
}

impl Tile {
    pub fn new(value: TileValue, x: usize, y: usize) -> Self {
        Tile {
            value,
            x,
            y,
            opened: false,
            flagged: false,
            focused: false,
        }
    }

    pub fn value(&self) -> TileValue {
        self.value
    }

    pub fn pos(&self) -> Pos {
        (self.x, self.y)
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Open the tile, clearing any flag. Returns false if it was already open.
    pub fn open(&mut self) -> bool {
        if self.opened {
            return false;
        }
        self.opened = true;
        self.flagged = false;
        true
    }

    /// Flip the flag on a closed tile
    pub fn toggle_flag(&mut self) {
        if self.opened {
            return;
        }
        self.flagged = !self.flagged;
    }

    /// Show press feedback; opened and flagged tiles never take focus
    pub fn focus(&mut self) {
        if self.opened || self.flagged {
            return;
        }
        self.focused = true;
    }

    pub fn unfocus(&mut self) {
        self.focused = false;
    }
}

/// Result of opening a tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    Safe,
    Mine,
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterates the in-bounds Moore neighborhood of a position
#[derive(Debug)]
pub struct NeighborIter {
    center: Pos,
    bounds: (usize, usize),
    index: usize,
}

impl Iterator for NeighborIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(dx, dy)) = DISPLACEMENTS.get(self.index) {
            self.index += 1;
            let nx = self.center.0.checked_add_signed(dx);
            let ny = self.center.1.checked_add_signed(dy);
            if let (Some(nx), Some(ny)) = (nx, ny) {
                if nx < self.bounds.0 && ny < self.bounds.1 {
                    return Some((nx, ny));
                }
            }
        }
        None
    }
}

/// The minefield: a dense `w * h` grid of tiles stored row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    w: usize,
    h: usize,
    tiles: Vec<Tile>,
}

impl Board {
    /// Create a board with no mines, every tile at value 0
    pub fn blank(w: usize, h: usize) -> Self {
        let mut tiles = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                tiles.push(Tile::new(TileValue::EMPTY, x, y));
            }
        }
        Board { w, h, tiles }
    }

    /// Randomly place `mines` mines and compute neighbor counts.
    /// Positions come from a shuffled permutation of all tiles.
    pub fn generate<R: Rng + ?Sized>(w: usize, h: usize, mines: usize, rng: &mut R) -> Self {
        let mut board = Board::blank(w, h);
        let total = w * h;
        let mines = if mines > total {
            log::warn!("Requested {} mines but only {} tiles fit, filling the board", mines, total);
            total
        } else {
            mines
        };

        let mut perm: Vec<usize> = (0..total).collect();
        perm.shuffle(rng);
        for &i in perm.iter().take(mines) {
            board.tiles[i].value = TileValue::Mine;
        }
        board.compute_counts();
        board
    }

    /// Build a board with mines at exactly the given positions
    #[cfg(test)]
    pub fn from_mine_coords(w: usize, h: usize, mines: &[Pos]) -> Result<Self, BoardError> {
        let mut board = Board::blank(w, h);
        for &(x, y) in mines {
            if x >= w || y >= h {
                return Err(BoardError::InvalidCoords(x, y));
            }
            let idx = board.index(x, y);
            board.tiles[idx].value = TileValue::Mine;
        }
        board.compute_counts();
        Ok(board)
    }

    fn compute_counts(&mut self) {
        for idx in 0..self.tiles.len() {
            if self.tiles[idx].value.is_mine() {
                continue;
            }
            let (x, y) = self.tiles[idx].pos();
            let count = self
                .neighbors(x, y)
                .filter(|&(nx, ny)| self.tiles[self.index(nx, ny)].value.is_mine())
                .count();
            self.tiles[idx].value = TileValue::Count(count as u8);
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    fn checked_index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(self.index(x, y))
    }

    /// Tile at `(x, y)`, or `None` outside `[0, w) x [0, h)`
    pub fn at(&self, x: i32, y: i32) -> Option<&Tile> {
        self.checked_index(x, y).map(|i| &self.tiles[i])
    }

    pub fn tile(&self, (x, y): Pos) -> Option<&Tile> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(&self.tiles[self.index(x, y)])
    }

    pub fn tile_mut(&mut self, (x, y): Pos) -> Option<&mut Tile> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let idx = self.index(x, y);
        Some(&mut self.tiles[idx])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn neighbors(&self, x: usize, y: usize) -> NeighborIter {
        NeighborIter {
            center: (x, y),
            bounds: (self.w, self.h),
            index: 0,
        }
    }

    /// Clear press feedback on every tile
    pub fn reset_focus(&mut self) {
        for t in self.tiles.iter_mut() {
            t.unfocus();
        }
    }

    pub fn mine_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.value.is_mine()).count()
    }

    pub fn flag_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.flagged).count()
    }

    pub fn flagged_neighbors(&self, x: usize, y: usize) -> usize {
        self.neighbors(x, y)
            .filter(|&(nx, ny)| self.tiles[self.index(nx, ny)].flagged)
            .count()
    }

    /// True once every non-mine tile has been opened
    pub fn all_safe_opened(&self) -> bool {
        self.tiles.iter().all(|t| t.value.is_mine() || t.opened)
    }

    /// Open the tile at `pos`; an empty tile cascades to its neighbors
    pub fn open(&mut self, pos: Pos) -> OpenOutcome {
        let Some(tile) = self.tile_mut(pos) else {
            return OpenOutcome::NoChange;
        };
        if !tile.open() {
            return OpenOutcome::NoChange;
        }
        let value = tile.value;
        log::debug!("Open tile at {:?}, value: {:?}", pos, value);
        match value {
            TileValue::Mine => OpenOutcome::Mine,
            TileValue::Count(0) => {
                self.cascade(pos);
                OpenOutcome::Safe
            }
            TileValue::Count(_) => OpenOutcome::Safe,
        }
    }

    /// Flood-fill from an opened empty tile using an explicit worklist
    fn cascade(&mut self, from: Pos) {
        let mut to_visit: Vec<Pos> = vec![from];
        let mut opened = 0usize;
        while let Some((x, y)) = to_visit.pop() {
            let around: Vec<Pos> = self.neighbors(x, y).collect();
            for (nx, ny) in around {
                let idx = self.index(nx, ny);
                let next = &mut self.tiles[idx];
                if !next.open() {
                    continue;
                }
                opened += 1;
                if next.value.is_empty() {
                    to_visit.push((nx, ny));
                }
            }
        }
        log::trace!("Flood-fill from {:?} opened {} tiles", from, opened);
    }
}
