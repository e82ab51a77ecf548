//! 2048 game logic on a fixed 4x4 grid.
//!
//! # Board layout
//!
//! ```text
//! Row-major 4x4 grid of tile values; 0 marks an empty cell and every
//! nonzero cell holds a power of two >= 2.
//!
//!   (0,0) (0,1) (0,2) (0,3)
//!   (1,0) (1,1) (1,2) (1,3)
//!   (2,0) (2,1) (2,2) (2,3)
//!   (3,0) (3,1) (3,2) (3,3)
//! ```
//!
//! # Move algorithm
//!
//! Every direction reduces to one canonical "compact left" pass: the
//! grid is rotated clockwise until the requested direction faces left
//! (Left=0, Down=1, Right=2, Up=3 quarter-turns), each row is compacted
//! and merged, then the grid is rotated back (`4 - turns` mod 4).
//!
//! Compacting a row drops zeros while preserving order, then scans once
//! left to right merging adjacent equal tiles into a doubled tile. A
//! tile produced by a merge never merges again in the same pass, so
//! `[2, 2, 2, 2]` compacts to `[4, 4, 0, 0]`, not `[8, 0, 0, 0]`. Each
//! merge adds the doubled value to the score.
//!
//! If any row changed, exactly one new tile (2 with probability 0.9,
//! else 4) spawns on a uniformly chosen empty cell. Randomness is always
//! an injected [`rand::Rng`], so tests can drive the engine with a
//! seeded generator.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
pub mod wasm;

/// Board width and height. The engine is fixed at 4x4.
pub const SIZE: usize = 4;

/// A direction to slide/merge tiles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, for exhaustive scans.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Clockwise quarter-turns that map this direction onto "left".
    #[inline]
    fn quarter_turns(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }

    /// Wire name of the direction (`"up"`, `"down"`, `"left"`, `"right"`).
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = GameError;

    /// Parse a wire direction. Matches the exact lowercase names only.
    fn from_str(s: &str) -> Result<Direction, GameError> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(GameError::InvalidDirection),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors the engine reports to its caller. The engine never retries
/// and never logs; both kinds are client errors for a hosting layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameError {
    /// The requested direction is not one of the four recognized values.
    InvalidDirection,
    /// A supplied snapshot is not a 4x4 grid of powers of two.
    InvalidStateShape,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidDirection => {
                write!(f, "direction must be one of up, down, left, right")
            }
            GameError::InvalidStateShape => {
                write!(f, "game state must be a 4x4 grid of powers of two")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Plain structural game state for transport across a request boundary.
///
/// `board` and `score` round-trip; `gameOver` is derived output and is
/// ignored on import.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Vec<Vec<u64>>,
    pub score: u64,
    #[serde(rename = "gameOver", default)]
    pub game_over: bool,
}

/// A 2048 game: the 4x4 tile grid plus the accumulated score.
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use twenty48_core::Game;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let game = Game::new(&mut rng);
/// let tiles = game.board().iter().flatten().filter(|&&v| v != 0).count();
/// assert_eq!(tiles, 2);
/// assert_eq!(game.score(), 0);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Game {
    board: [[u64; SIZE]; SIZE],
    score: u64,
}

impl Game {
    /// Start a new game: empty board, score 0, two spawned tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Game {
        let mut game = Game {
            board: [[0; SIZE]; SIZE],
            score: 0,
        };
        game.spawn_tile(rng);
        game.spawn_tile(rng);
        game
    }

    /// Convenience: like [`Game::new`] but uses the thread-local RNG.
    pub fn new_thread() -> Game {
        let mut rng = rand::rng();
        Game::new(&mut rng)
    }

    /// Borrow the tile grid (row-major; 0 = empty).
    #[inline]
    pub fn board(&self) -> &[[u64; SIZE]; SIZE] {
        &self.board
    }

    /// Accumulated score. Monotonically non-decreasing within a game.
    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Count the empty cells on the board.
    pub fn count_empty(&self) -> usize {
        self.board
            .iter()
            .flatten()
            .filter(|&&value| value == 0)
            .count()
    }

    /// Slide/merge tiles in `direction` and spawn one tile if the board
    /// changed. Returns whether the board changed.
    ///
    /// A move that changes nothing leaves the game untouched: no spawn,
    /// no score change. Once [`Game::is_game_over`] is true every move
    /// reports `false`, so a finished game can only be replaced, not
    /// continued.
    pub fn apply<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> bool {
        if self.is_game_over() {
            return false;
        }
        let moved = self.slide(direction);
        if moved {
            self.spawn_tile(rng);
        }
        moved
    }

    /// Slide/merge tiles in `direction` without spawning. No randomness.
    ///
    /// ```
    /// use twenty48_core::{Direction, Game, Snapshot};
    ///
    /// let snapshot = Snapshot {
    ///     board: vec![
    ///         vec![2, 2, 0, 0],
    ///         vec![0, 0, 0, 0],
    ///         vec![0, 0, 0, 0],
    ///         vec![0, 0, 0, 0],
    ///     ],
    ///     score: 0,
    ///     game_over: false,
    /// };
    /// let mut game = Game::from_snapshot(&snapshot).unwrap();
    /// assert!(game.slide(Direction::Right));
    /// assert_eq!(game.board()[0], [0, 0, 0, 4]);
    /// assert_eq!(game.score(), 4);
    /// ```
    pub fn slide(&mut self, direction: Direction) -> bool {
        let turns = direction.quarter_turns();
        for _ in 0..turns {
            self.rotate_cw();
        }

        let mut moved = false;
        for row in &mut self.board {
            let (packed, gained) = slide_row(*row);
            if packed != *row {
                moved = true;
                *row = packed;
            }
            self.score += gained;
        }

        for _ in 0..(4 - turns) % 4 {
            self.rotate_cw();
        }
        moved
    }

    /// True iff no empty cell remains and no two horizontally or
    /// vertically adjacent cells are equal, i.e. no move can change the
    /// board. Read-only.
    pub fn is_game_over(&self) -> bool {
        for row in &self.board {
            for &value in row {
                if value == 0 {
                    return false;
                }
            }
        }
        for i in 0..SIZE {
            for j in 0..SIZE {
                let current = self.board[i][j];
                if j + 1 < SIZE && self.board[i][j + 1] == current {
                    return false;
                }
                if i + 1 < SIZE && self.board[i + 1][j] == current {
                    return false;
                }
            }
        }
        true
    }

    /// Export the game as a transportable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.iter().map(|row| row.to_vec()).collect(),
            score: self.score,
            game_over: self.is_game_over(),
        }
    }

    /// Rebuild a game from a snapshot, refusing corrupt input.
    ///
    /// The board must be exactly 4x4 and every nonzero cell a power of
    /// two >= 2; anything else is [`GameError::InvalidStateShape`]. The
    /// snapshot's `gameOver` flag is ignored (it is derived state).
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Game, GameError> {
        if snapshot.board.len() != SIZE {
            return Err(GameError::InvalidStateShape);
        }
        let mut board = [[0u64; SIZE]; SIZE];
        for (i, row) in snapshot.board.iter().enumerate() {
            if row.len() != SIZE {
                return Err(GameError::InvalidStateShape);
            }
            for (j, &value) in row.iter().enumerate() {
                if value != 0 && (value < 2 || !value.is_power_of_two()) {
                    return Err(GameError::InvalidStateShape);
                }
                board[i][j] = value;
            }
        }
        Ok(Game {
            board,
            score: snapshot.score,
        })
    }

    /// Rotate the grid 90 degrees clockwise in place.
    fn rotate_cw(&mut self) {
        let old = self.board;
        for i in 0..SIZE {
            for j in 0..SIZE {
                self.board[i][j] = old[SIZE - 1 - j][i];
            }
        }
    }

    /// Place a 2 (90%) or 4 (10%) on a uniformly chosen empty cell.
    /// Does nothing on a full board.
    fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let empty: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|i| (0..SIZE).map(move |j| (i, j)))
            .filter(|&(i, j)| self.board[i][j] == 0)
            .collect();
        if empty.is_empty() {
            return;
        }
        let (i, j) = empty[rng.random_range(0..empty.len())];
        self.board[i][j] = if rng.random_bool(0.9) { 2 } else { 4 };
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.board {
            for &value in row {
                if value == 0 {
                    write!(f, "{:>6}", ".")?;
                } else {
                    write!(f, "{:>6}", value)?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "score: {}", self.score)
    }
}

/// Compact one row leftward: drop zeros, merge adjacent equal tiles in
/// a single pass (a merged tile never merges again), pad with zeros.
/// Returns the packed row and the score gained by merges.
fn slide_row(row: [u64; SIZE]) -> ([u64; SIZE], u64) {
    let mut tiles: Vec<u64> = row.iter().copied().filter(|&value| value != 0).collect();

    let mut gained = 0;
    let mut i = 0;
    while i + 1 < tiles.len() {
        if tiles[i] == tiles[i + 1] {
            tiles[i] *= 2;
            gained += tiles[i];
            tiles.remove(i + 1);
        }
        i += 1;
    }

    let mut packed = [0u64; SIZE];
    packed[..tiles.len()].copy_from_slice(&tiles);
    (packed, gained)
}
