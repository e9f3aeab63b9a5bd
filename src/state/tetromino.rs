//! The seven tetromino shapes and the falling piece.

use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::board::{Board, Tile};

/// Side length of the square pattern holding a tetromino.
pub const TETROMINO_SIZE: usize = 4;

/// 4×4 occupancy mask, indexed `[row][column]`.
pub type Mask = [[bool; TETROMINO_SIZE]; TETROMINO_SIZE];

/// Identity of a tetromino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    I,
    S,
    Z,
    O,
    T,
    J,
    L,
}

impl Shape {
    /// Every shape, in table order.
    pub const ALL: [Shape; 7] = [
        Shape::I,
        Shape::S,
        Shape::Z,
        Shape::O,
        Shape::T,
        Shape::J,
        Shape::L,
    ];

    /// Pick a shape uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Colour used when drawing or locking this shape.
    pub fn tile(self) -> Tile {
        match self {
            Shape::I => Tile::Yellow,
            Shape::S => Tile::Red,
            Shape::Z => Tile::Orange,
            Shape::O => Tile::Blue,
            Shape::T => Tile::Green,
            Shape::J => Tile::LightBlue,
            Shape::L => Tile::Purple,
        }
    }

    /// Spawn orientation of the shape.
    pub fn mask(self) -> Mask {
        let rows: [u8; TETROMINO_SIZE] = match self {
            Shape::I => [0b0010, 0b0010, 0b0010, 0b0010],
            Shape::S => [0b0010, 0b0110, 0b0100, 0b0000],
            Shape::Z => [0b0100, 0b0110, 0b0010, 0b0000],
            Shape::O => [0b0000, 0b0110, 0b0110, 0b0000],
            Shape::T => [0b0010, 0b0110, 0b0010, 0b0000],
            Shape::J => [0b0010, 0b0010, 0b0110, 0b0000],
            Shape::L => [0b0100, 0b0100, 0b0110, 0b0000],
        };
        let mut mask = [[false; TETROMINO_SIZE]; TETROMINO_SIZE];
        for (y, bits) in rows.iter().enumerate() {
            for (x, cell) in mask[y].iter_mut().enumerate() {
                // leftmost column is the most significant bit
                *cell = bits & (0b1000 >> x) != 0;
            }
        }
        mask
    }
}

/// Direction of a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Rotate a mask a quarter turn clockwise.
pub fn rotated_clockwise(mask: &Mask) -> Mask {
    let mut out = [[false; TETROMINO_SIZE]; TETROMINO_SIZE];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = mask[TETROMINO_SIZE - 1 - x][y];
        }
    }
    out
}

/// Rotate a mask a quarter turn counter-clockwise.
pub fn rotated_counter_clockwise(mask: &Mask) -> Mask {
    let mut out = [[false; TETROMINO_SIZE]; TETROMINO_SIZE];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = mask[x][TETROMINO_SIZE - 1 - y];
        }
    }
    out
}

/// The piece currently falling through the well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tetromino {
    shape: Shape,
    mask: Mask,
    rotation: u8,
    x: i32,
    y: i32,
}

impl Tetromino {
    /// Place a new piece horizontally centred with its first occupied row at the top.
    pub fn spawn(shape: Shape, board_width: usize) -> Self {
        let mask = shape.mask();
        let first_row = mask
            .iter()
            .position(|row| row.iter().any(|cell| *cell))
            .unwrap_or(0);
        Self {
            shape,
            mask,
            rotation: 0,
            x: (board_width as i32 - TETROMINO_SIZE as i32) / 2,
            y: -(first_row as i32),
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Quarter turns applied since spawning, modulo 4.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        mask_cells(&self.mask).map(|(cx, cy)| (self.x + cx, self.y + cy))
    }

    /// Whether `mask`, offset by `(dx, dy)` from the current position, hits anything.
    pub fn collides(&self, board: &Board, mask: &Mask, dx: i32, dy: i32) -> bool {
        mask_cells(mask).any(|(cx, cy)| board.is_blocked(self.x + cx + dx, self.y + cy + dy))
    }

    /// Move by `(dx, dy)` if the destination is free.
    pub fn shift(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        if self.collides(board, &self.mask, dx, dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// Rotate, nudging one column left or right when the turn would collide.
    pub fn rotate(&mut self, board: &Board, direction: Rotation) -> bool {
        let rotated = match direction {
            Rotation::Clockwise => rotated_clockwise(&self.mask),
            Rotation::CounterClockwise => rotated_counter_clockwise(&self.mask),
        };

        let Some(dx) = [0, -1, 1]
            .into_iter()
            .find(|dx| !self.collides(board, &rotated, *dx, 0))
        else {
            return false;
        };

        self.x += dx;
        self.mask = rotated;
        self.rotation = match direction {
            Rotation::Clockwise => (self.rotation + 1) % 4,
            Rotation::CounterClockwise => (self.rotation + 3) % 4,
        };
        true
    }

    /// Write the occupied cells into the board, dropping those outside it.
    pub fn lock(&self, board: &mut Board) {
        let tile = self.shape.tile();
        for (x, y) in self.cells() {
            board.set(x, y, Some(tile));
        }
    }

    /// Rows spanned by the piece's pattern, used to limit the line-clear scan.
    pub fn row_span(&self) -> std::ops::Range<i32> {
        self.y..self.y + TETROMINO_SIZE as i32
    }
}

fn mask_cells(mask: &Mask) -> impl Iterator<Item = (i32, i32)> + '_ {
    mask.iter().enumerate().flat_map(|(y, row)| {
        row.iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(move |(x, _)| (x as i32, y as i32))
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::board::GRID_WIDTH;

    #[test]
    fn every_shape_has_four_cells() {
        for shape in Shape::ALL {
            let count = shape.mask().iter().flatten().filter(|c| **c).count();
            assert_eq!(count, 4, "{shape:?}");
        }
    }

    #[test]
    fn spawn_is_centred_with_first_row_at_top() {
        let piece = Tetromino::spawn(Shape::O, GRID_WIDTH);
        assert_eq!(piece.x(), 3);
        assert_eq!(piece.y(), -1);
        assert_eq!(piece.cells().map(|(_, y)| y).min(), Some(0));

        let piece = Tetromino::spawn(Shape::I, GRID_WIDTH);
        assert_eq!(piece.y(), 0);
    }

    #[test]
    fn four_clockwise_turns_are_identity() {
        for shape in Shape::ALL {
            let original = shape.mask();
            let mut mask = original;
            for _ in 0..4 {
                mask = rotated_clockwise(&mask);
            }
            assert_eq!(mask, original);
        }
    }

    #[test]
    fn clockwise_turns_l_clockwise_on_screen() {
        // X. / X. / XX becomes XXX / X..
        let turned = rotated_clockwise(&Shape::L.mask());
        assert_eq!(
            turned,
            [
                [false, false, false, false],
                [false, true, true, true],
                [false, true, false, false],
                [false, false, false, false],
            ]
        );
    }

    #[test]
    fn counter_clockwise_undoes_clockwise() {
        for shape in Shape::ALL {
            let mask = shape.mask();
            assert_eq!(rotated_counter_clockwise(&rotated_clockwise(&mask)), mask);
        }
    }

    #[test]
    fn vertical_i_turns_horizontal() {
        let rotated = rotated_clockwise(&Shape::I.mask());
        assert_eq!(rotated[2], [true; 4]);
    }

    #[test]
    fn shift_stops_at_walls() {
        let board = Board::new(GRID_WIDTH, 20);
        let mut piece = Tetromino::spawn(Shape::O, GRID_WIDTH);
        let mut moves = 0;
        while piece.shift(&board, -1, 0) {
            moves += 1;
        }
        // O occupies columns 1..=2 of its mask
        assert_eq!(moves, 4);
        assert_eq!(piece.cells().map(|(x, _)| x).min(), Some(0));
    }

    #[test]
    fn rotation_wiggles_away_from_wall() {
        let board = Board::new(GRID_WIDTH, 20);
        let mut piece = Tetromino::spawn(Shape::I, GRID_WIDTH);
        piece.shift(&board, 0, 3);
        while piece.shift(&board, 1, 0) {}
        // vertical I sits in mask column 2, so the horizontal turn needs a kick
        let x_before = piece.x();
        assert!(piece.rotate(&board, Rotation::Clockwise));
        assert_eq!(piece.x(), x_before - 1);
        assert!(piece.cells().all(|(x, _)| (0..10).contains(&x)));
        assert_eq!(piece.rotation(), 1);
    }

    #[test]
    fn blocked_rotation_leaves_piece_untouched() {
        let mut board = Board::new(GRID_WIDTH, 20);
        let mut piece = Tetromino::spawn(Shape::I, GRID_WIDTH);
        piece.shift(&board, 0, 5);
        // wall off the rows the horizontal I would need
        for x in 0..GRID_WIDTH as i32 {
            if x != piece.x() + 2 {
                board.set(x, piece.y() + 2, Some(Tile::Red));
            }
        }
        let before = piece.clone();
        assert!(!piece.rotate(&board, Rotation::Clockwise));
        assert_eq!(piece, before);
    }

    #[test]
    fn counter_clockwise_rotation_wraps_counter() {
        let board = Board::new(GRID_WIDTH, 20);
        let mut piece = Tetromino::spawn(Shape::T, GRID_WIDTH);
        piece.shift(&board, 0, 4);
        assert!(piece.rotate(&board, Rotation::CounterClockwise));
        assert_eq!(piece.rotation(), 3);
    }

    #[test]
    fn lock_skips_cells_above_board() {
        let mut board = Board::new(GRID_WIDTH, 20);
        let mut piece = Tetromino::spawn(Shape::O, GRID_WIDTH);
        assert!(piece.shift(&board, 0, -1));
        piece.lock(&mut board);
        assert_eq!(board.get(4, 0), Some(Tile::Blue));
        assert_eq!(board.get(5, 0), Some(Tile::Blue));
        assert_eq!(board.rows().flatten().filter(|c| c.is_some()).count(), 2);
    }

    #[test]
    fn random_shapes_cover_the_table() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(Shape::random(&mut rng));
        }
        assert_eq!(seen.len(), Shape::ALL.len());
    }
}
