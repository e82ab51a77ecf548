//! WASM bindings for twenty48-core
//!
//! Provides a JavaScript-friendly API for the game logic.

use wasm_bindgen::prelude::*;

use crate::{Direction, Game, Snapshot};

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a new game (two random tiles, score 0)
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame {
            inner: Game::new_thread(),
        }
    }

    /// Tile values as a flat row-major array of 16 numbers (0 = empty)
    pub fn board(&self) -> Vec<u64> {
        self.inner.board().iter().flatten().copied().collect()
    }

    /// Current score
    pub fn score(&self) -> u64 {
        self.inner.score()
    }

    /// True when no move can change the board
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_game_over()
    }

    /// Apply a move ("up" | "down" | "left" | "right").
    /// Returns true if the board changed. Unknown directions return false.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, direction: &str) -> bool {
        let direction: Direction = match direction.parse() {
            Ok(d) => d,
            Err(_) => return false,
        };
        let mut rng = rand::rng();
        self.inner.apply(direction, &mut rng)
    }

    /// Export the game as a { board, score, gameOver } object
    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).unwrap()
    }

    /// Rebuild a game from a { board, score } object.
    /// Throws on snapshots that are not a 4x4 grid of powers of two.
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(value: JsValue) -> Result<WasmGame, JsValue> {
        let snapshot: Snapshot = serde_wasm_bindgen::from_value(value)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let inner = Game::from_snapshot(&snapshot)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(WasmGame { inner })
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
