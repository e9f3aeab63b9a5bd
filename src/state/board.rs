//! Playfield grid holding locked tiles.

use std::ops::Range;

use serde::Serialize;
use utoipa::ToSchema;

/// Number of columns of the playfield.
pub const GRID_WIDTH: usize = 10;
/// Smallest accepted playfield height.
pub const MIN_GRID_HEIGHT: usize = 4;
/// Largest accepted playfield height.
pub const MAX_GRID_HEIGHT: usize = 40;

/// Colour of a locked or falling cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Red,
    Orange,
    Yellow,
    Green,
    LightBlue,
    Blue,
    Purple,
}

/// Fixed-size grid of cells, row 0 being the top of the well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<Tile>>,
}

impl Board {
    /// Build an empty board. The height is clamped to the supported range.
    pub fn new(width: usize, height: usize) -> Self {
        let height = height.clamp(MIN_GRID_HEIGHT, MAX_GRID_HEIGHT);
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at `(x, y)`; `None` for empty cells and positions outside the board.
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        self.index(x, y).and_then(|index| self.cells[index])
    }

    /// Write a tile, ignoring positions outside the board.
    pub fn set(&mut self, x: i32, y: i32, tile: Option<Tile>) {
        if let Some(index) = self.index(x, y) {
            self.cells[index] = tile;
        }
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Whether a falling cell may not occupy `(x, y)`.
    ///
    /// Side walls and the floor are solid. Rows above the top are open so freshly
    /// spawned pieces can hang partially outside the well.
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width as i32 {
            return true;
        }
        if y >= self.height as i32 {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.get(x, y).is_some()
    }

    /// Whether every cell of row `y` is occupied.
    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height && self.row(y).iter().all(Option::is_some)
    }

    /// Remove every full row within `rows`, collapsing the rows above it.
    ///
    /// Rows are scanned top to bottom so that collapsing one row never moves an
    /// unchecked row past the scan position. Returns the number of rows cleared.
    pub fn clear_full_rows(&mut self, rows: Range<i32>) -> u32 {
        let start = rows.start.max(0) as usize;
        let end = rows.end.clamp(0, self.height as i32) as usize;

        let mut cleared = 0;
        for y in start..end {
            if self.is_row_full(y) {
                self.collapse_row(y);
                cleared += 1;
            }
        }
        cleared
    }

    /// Borrow row `y` as a slice.
    pub fn row(&self, y: usize) -> &[Option<Tile>] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Iterate over rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Tile>]> {
        self.cells.chunks(self.width)
    }

    fn collapse_row(&mut self, y: usize) {
        let width = self.width;
        // shift everything above `y` down by one row
        self.cells.copy_within(0..y * width, width);
        self.cells[..width].fill(None);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, y: i32) {
        for x in 0..board.width() as i32 {
            board.set(x, y, Some(Tile::Red));
        }
    }

    #[test]
    fn walls_and_floor_are_blocked() {
        let board = Board::new(GRID_WIDTH, 20);
        assert!(board.is_blocked(-1, 5));
        assert!(board.is_blocked(10, 5));
        assert!(board.is_blocked(3, 20));
        assert!(!board.is_blocked(0, 19));
        assert!(!board.is_blocked(9, 0));
    }

    #[test]
    fn rows_above_top_are_open() {
        let board = Board::new(GRID_WIDTH, 20);
        assert!(!board.is_blocked(4, -2));
        assert!(board.is_blocked(-1, -2));
    }

    #[test]
    fn occupied_cells_block() {
        let mut board = Board::new(GRID_WIDTH, 20);
        board.set(4, 10, Some(Tile::Green));
        assert!(board.is_blocked(4, 10));
        assert!(!board.is_blocked(5, 10));
    }

    #[test]
    fn height_is_clamped() {
        assert_eq!(Board::new(GRID_WIDTH, 1).height(), MIN_GRID_HEIGHT);
        assert_eq!(Board::new(GRID_WIDTH, 500).height(), MAX_GRID_HEIGHT);
    }

    #[test]
    fn clearing_a_row_shifts_rows_above_down() {
        let mut board = Board::new(GRID_WIDTH, 6);
        board.set(2, 0, Some(Tile::Blue));
        board.set(3, 3, Some(Tile::Purple));
        fill_row(&mut board, 4);

        let cleared = board.clear_full_rows(0..6);

        assert_eq!(cleared, 1);
        assert_eq!(board.get(2, 1), Some(Tile::Blue));
        assert_eq!(board.get(3, 4), Some(Tile::Purple));
        assert!(board.row(0).iter().all(Option::is_none));
        assert!(!board.is_row_full(4));
    }

    #[test]
    fn clears_several_rows_and_respects_range() {
        let mut board = Board::new(GRID_WIDTH, 8);
        fill_row(&mut board, 5);
        fill_row(&mut board, 6);
        fill_row(&mut board, 7);

        assert_eq!(board.clear_full_rows(5..7), 2);
        // row 7 was outside the scanned range
        assert!(board.is_row_full(7));
        assert!(board.row(6).iter().all(Option::is_none));
    }

    #[test]
    fn clear_range_is_clamped_to_board() {
        let mut board = Board::new(GRID_WIDTH, 4);
        fill_row(&mut board, 3);
        assert_eq!(board.clear_full_rows(-3..10), 1);
    }
}
