use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};

use crate::state::{
    board::{Board, GRID_WIDTH},
    tetromino::{Rotation, Shape, Tetromino},
};

/// Points for clearing one to four lines at once, multiplied by the level.
const LINE_SCORES: [u32; 4] = [40, 100, 300, 1200];
/// Lines required per level, multiplied by the level.
const LINES_PER_LEVEL: u32 = 10;
/// Gravity frames are counted at this rate.
const FRAMES_PER_SECOND: f64 = 60.0;
/// Face shown after topping out.
pub const MOOD_GAME_OVER: u8 = 3;

/// Tunables for a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Number of visible rows in the well.
    pub board_height: usize,
    /// Level a fresh game starts at.
    pub start_level: u32,
    /// High score shown before any save is loaded.
    pub initial_high_score: u32,
    /// Fixed RNG seed for reproducible piece sequences.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_height: 20,
            start_level: 1,
            initial_high_score: 0,
            seed: None,
        }
    }
}

/// Result of a single gravity step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The piece moved one row down.
    Fell,
    /// The piece landed and a new one was spawned.
    Locked {
        /// Number of lines cleared by the landing.
        lines: u32,
        /// Whether clearing those lines raised the level.
        level_up: bool,
    },
    /// The piece landed at the top of the well without clearing anything.
    ToppedOut,
}

/// Score earned for clearing `lines` rows at `level`.
pub fn line_score(lines: u32, level: u32) -> u32 {
    match lines {
        0 => 0,
        n => LINE_SCORES[(n.min(4) - 1) as usize] * level,
    }
}

/// Gravity period for `level`, following the classic 60 Hz frame table.
pub fn drop_interval(level: u32) -> Duration {
    let frames = match level {
        20.. => 2,
        17..=19 => 3,
        14..=16 => 4,
        11..=13 => 5,
        10 => 6,
        level => 48 - (level.max(1) - 1) * 5,
    };
    Duration::from_secs_f64(f64::from(frames) / FRAMES_PER_SECOND)
}

/// A single-player game: board, falling piece, preview and scoring.
#[derive(Debug, Clone)]
pub struct GameSession {
    settings: GameSettings,
    board: Board,
    current: Tetromino,
    next: Shape,
    score: u32,
    high_score: u32,
    level: u32,
    lines: u32,
    mood: u8,
    rng: StdRng,
}

impl GameSession {
    /// Start a fresh game on an empty board.
    pub fn new(settings: GameSettings) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let board = Board::new(GRID_WIDTH, settings.board_height);
        let current = Tetromino::spawn(Shape::random(&mut rng), board.width());
        let next = Shape::random(&mut rng);

        Self {
            board,
            current,
            next,
            score: 0,
            high_score: settings.initial_high_score,
            level: settings.start_level.max(1),
            lines: 0,
            mood: 0,
            rng,
            settings,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current(&self) -> &Tetromino {
        &self.current
    }

    pub fn next_shape(&self) -> Shape {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Lines cleared toward the next level.
    pub fn lines(&self) -> u32 {
        self.lines
    }

    /// Face index: 0..=2 by stack height, [`MOOD_GAME_OVER`] after a top out.
    pub fn mood(&self) -> u8 {
        self.mood
    }

    /// Lines needed at the current level before levelling up.
    pub fn lines_for_level(&self) -> u32 {
        self.level * LINES_PER_LEVEL
    }

    /// Fraction of the current level completed, in `0.0..=1.0`.
    pub fn level_progress(&self) -> f32 {
        (self.lines as f32 / self.lines_for_level() as f32).clamp(0.0, 1.0)
    }

    pub fn drop_interval(&self) -> Duration {
        drop_interval(self.level)
    }

    /// Raise the high score to a previously saved value.
    pub fn adopt_saved_high_score(&mut self, saved: u32) {
        if saved > self.high_score {
            self.high_score = saved;
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.current.shift(&self.board, -1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.current.shift(&self.board, 1, 0)
    }

    pub fn rotate_clockwise(&mut self) -> bool {
        self.current.rotate(&self.board, Rotation::Clockwise)
    }

    /// Move the piece down one row.
    pub fn soft_drop(&mut self) -> bool {
        self.current.shift(&self.board, 0, 1)
    }

    /// Drop the piece as far as it goes, scoring one point per row.
    ///
    /// The piece is left resting on the stack; the next gravity step locks it.
    pub fn hard_drop(&mut self) -> u32 {
        let mut rows = 0;
        while self.current.shift(&self.board, 0, 1) {
            rows += 1;
        }
        self.add_score(rows);
        rows
    }

    /// Advance gravity by one row, locking the piece when it cannot fall.
    pub fn step(&mut self) -> StepOutcome {
        if self.current.shift(&self.board, 0, 1) {
            return StepOutcome::Fell;
        }

        self.current.lock(&mut self.board);
        let lines = self.board.clear_full_rows(self.current.row_span());
        let level_up = self.add_lines(lines);

        let landed_at = self.current.y();
        if landed_at <= 0 && lines == 0 {
            return StepOutcome::ToppedOut;
        }

        let height = self.board.height() as i32;
        let mood = ((height - landed_at) * 3) / height;
        self.mood = mood.clamp(0, 2) as u8;

        self.spawn_next();
        StepOutcome::Locked { lines, level_up }
    }

    /// Whether the finished score earned a save.
    pub fn reached_high_score(&self) -> bool {
        self.score > 0 && self.score >= self.high_score
    }

    /// Clear the well and start over, keeping the high score.
    pub fn reset(&mut self, game_over: bool) {
        self.board.clear();
        self.score = 0;
        self.level = self.settings.start_level.max(1);
        self.lines = 0;
        self.mood = if game_over { MOOD_GAME_OVER } else { 0 };
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.current = Tetromino::spawn(self.next, self.board.width());
        self.next = Shape::random(&mut self.rng);
    }

    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
        }
    }

    fn add_lines(&mut self, lines: u32) -> bool {
        if lines == 0 {
            return false;
        }
        self.add_score(line_score(lines, self.level));
        self.lines += lines;
        if self.lines > self.lines_for_level() {
            self.level += 1;
            self.lines = 0;
            return true;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, piece: Tetromino) {
        self.current = piece;
    }

    #[cfg(test)]
    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::Tile;

    fn session(height: usize) -> GameSession {
        GameSession::new(GameSettings {
            board_height: height,
            seed: Some(42),
            ..GameSettings::default()
        })
    }

    /// Fill `y` except for the columns in `holes`.
    fn fill_row_except(game: &mut GameSession, y: i32, holes: &[i32]) {
        for x in 0..GRID_WIDTH as i32 {
            if !holes.contains(&x) {
                game.board_mut().set(x, y, Some(Tile::Red));
            }
        }
    }

    #[test]
    fn drop_interval_follows_frame_table() {
        let frames = |level| (drop_interval(level).as_secs_f64() * 60.0).round() as u32;
        assert_eq!(frames(1), 48);
        assert_eq!(frames(2), 43);
        assert_eq!(frames(9), 8);
        assert_eq!(frames(10), 6);
        assert_eq!(frames(11), 5);
        assert_eq!(frames(14), 4);
        assert_eq!(frames(17), 3);
        assert_eq!(frames(20), 2);
        assert_eq!(frames(99), 2);
    }

    #[test]
    fn line_score_scales_with_level() {
        assert_eq!(line_score(0, 3), 0);
        assert_eq!(line_score(1, 1), 40);
        assert_eq!(line_score(2, 1), 100);
        assert_eq!(line_score(3, 2), 600);
        assert_eq!(line_score(4, 3), 3600);
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let a = session(20);
        let b = session(20);
        assert_eq!(a.current().shape(), b.current().shape());
        assert_eq!(a.next_shape(), b.next_shape());
    }

    #[test]
    fn step_moves_piece_down() {
        let mut game = session(20);
        let y = game.current().y();
        assert_eq!(game.step(), StepOutcome::Fell);
        assert_eq!(game.current().y(), y + 1);
    }

    #[test]
    fn hard_drop_scores_travelled_rows() {
        let mut game = session(20);
        game.set_current(Tetromino::spawn(Shape::O, GRID_WIDTH));
        let rows = game.hard_drop();
        // O occupies mask rows 1..=2 and spawns with y = -1
        assert_eq!(rows, 18);
        assert_eq!(game.score(), 18);
        assert_eq!(game.high_score(), 18);
    }

    #[test]
    fn landing_piece_clears_line_and_scores() {
        let mut game = session(20);
        fill_row_except(&mut game, 19, &[4, 5]);
        game.set_current(Tetromino::spawn(Shape::O, GRID_WIDTH));
        game.hard_drop();
        let dropped = game.score();

        let outcome = game.step();

        assert_eq!(
            outcome,
            StepOutcome::Locked {
                lines: 1,
                level_up: false
            }
        );
        assert_eq!(game.score(), dropped + 40);
        assert_eq!(game.lines(), 1);
        // upper half of the O fell into the cleared row
        assert_eq!(game.board().get(4, 19), Some(Tile::Blue));
        assert_eq!(game.board().get(0, 19), None);
    }

    #[test]
    fn level_up_requires_exceeding_target() {
        let mut game = session(20);
        game.lines = 9;
        assert!(!game.add_lines(1));
        assert_eq!(game.level(), 1);
        assert_eq!(game.level_progress(), 1.0);
        assert!(game.add_lines(1));
        assert_eq!(game.level(), 2);
        assert_eq!(game.lines(), 0);
    }

    #[test]
    fn topped_out_reports_outcome() {
        let mut game = session(6);
        for y in 3..6 {
            fill_row_except(&mut game, y, &[0]);
        }
        game.set_current(Tetromino::spawn(Shape::O, GRID_WIDTH));
        assert_eq!(game.step(), StepOutcome::Fell);
        assert_eq!(game.step(), StepOutcome::ToppedOut);
        // the O landed on the stack with its pattern origin at row 0
        assert_eq!(game.current().y(), 0);
    }

    #[test]
    fn mood_tracks_landing_height() {
        let mut game = session(20);
        game.set_current(Tetromino::spawn(Shape::O, GRID_WIDTH));
        game.hard_drop();
        game.step();
        assert_eq!(game.mood(), 0);
    }

    #[test]
    fn reset_keeps_high_score() {
        let mut game = session(20);
        game.set_level(4);
        game.hard_drop();
        let high = game.high_score();
        assert!(game.reached_high_score());

        game.reset(true);

        assert_eq!(game.score(), 0);
        assert_eq!(game.level(), 1);
        assert_eq!(game.high_score(), high);
        assert_eq!(game.mood(), MOOD_GAME_OVER);
        assert!(game.board().rows().flatten().all(Option::is_none));
    }

    #[test]
    fn saved_high_score_only_raises() {
        let mut game = GameSession::new(GameSettings {
            initial_high_score: 500,
            seed: Some(1),
            ..GameSettings::default()
        });
        game.adopt_saved_high_score(100);
        assert_eq!(game.high_score(), 500);
        game.adopt_saved_high_score(900);
        assert_eq!(game.high_score(), 900);
    }
}
