//! Persisted game layout.
//!
//! A save is a single JSON object:
//!
//! ```text
//! { "board": [Cell; N*N], "boardSize": N, "currentPlayer": "black",
//!   "turnNumber": 12, "gameMode": "quantum", "scores": {...},
//!   "quantumState": {...}, "timestamp": 1700000000000 }
//! ```
//!
//! Loading is all-or-nothing: the payload is parsed and validated into a
//! fresh board before any live state is replaced. Ko, pass count and the
//! move history are not persisted and start fresh after a load.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::{Board, Cell, Color};
use crate::constants::{MAX_ENERGY, MAX_SIZE, MIN_SIZE};
use crate::engine::Game;
use crate::error::{GameError, Result};
use crate::game::{GameMode, GameState, Scores, now_ms};
use crate::quantum::QuantumState;

/// Serialized snapshot of a game in progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveGame {
    pub board: Vec<Cell>,
    pub board_size: usize,
    pub current_player: Color,
    pub turn_number: u32,
    pub game_mode: GameMode,
    pub scores: Scores,
    pub quantum_state: QuantumState,
    /// Milliseconds since the Unix epoch at save time.
    pub timestamp: u64,
}

impl SaveGame {
    pub fn capture(game: &Game) -> Self {
        SaveGame {
            board: game.board().cells().to_vec(),
            board_size: game.board().size(),
            current_player: game.current_player(),
            turn_number: game.state().turn_number,
            game_mode: game.mode(),
            scores: game.scores(),
            quantum_state: game.quantum().clone(),
            timestamp: now_ms(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::CorruptSaveData(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GameError::CorruptSaveData(e.to_string()))
    }

    /// Check the snapshot and build the live pieces it describes.
    fn restore(self) -> Result<(Board, GameState, QuantumState)> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.board_size) {
            return Err(GameError::CorruptSaveData(format!(
                "board size {} out of range",
                self.board_size
            )));
        }
        if self.turn_number == 0 {
            return Err(GameError::CorruptSaveData("turn number must start at 1".into()));
        }
        let board = Board::from_cells(self.board_size, self.board)?;

        let mut quantum = self.quantum_state;
        if quantum.max_energy != MAX_ENERGY {
            return Err(GameError::CorruptSaveData(format!(
                "max energy {} is not {MAX_ENERGY}",
                quantum.max_energy
            )));
        }
        if !(0.0..=1.0).contains(&quantum.decoherence_rate) {
            return Err(GameError::CorruptSaveData(format!(
                "decoherence rate {} out of range",
                quantum.decoherence_rate
            )));
        }
        for color in [Color::Black, Color::White] {
            let energy = quantum.energy(color);
            quantum.set_energy(color, energy);
        }

        let mut state = GameState::new(self.game_mode);
        state.current_player = self.current_player;
        state.turn_number = self.turn_number;
        state.scores = self.scores;
        Ok((board, state, quantum))
    }
}

impl Game {
    /// Serialize the current position.
    pub fn save_json(&self) -> Result<String> {
        SaveGame::capture(self).to_json()
    }

    /// Replace the current position with a saved one.
    ///
    /// On any parse or validation error the game is left untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let restored = SaveGame::from_json(json).and_then(SaveGame::restore);
        match restored {
            Ok((board, state, quantum)) => {
                info!(turn = state.turn_number, mode = %state.mode, "game loaded");
                self.replace_state(board, state, quantum);
                Ok(())
            }
            Err(e) => {
                warn!("load rejected: {e}");
                Err(e)
            }
        }
    }
}
