//! Quantum Go: a Go rule engine with a quantum-mechanics overlay.
//!
//! Classical capture Go (suicide, ko, captures, area scoring with komi) runs
//! underneath a probabilistic layer of superposed stones, entangled pairs and
//! decoherence, paid for with a per-player energy budget.
//!
//! ## Modules
//!
//! - [`constants`] - Board size, scoring and quantum parameters
//! - [`board`] - Cell arena with the quantum overlay
//! - [`groups`] - Flood-fill chains, liberties and territory
//! - [`rules`] - Legality checks and capture resolution
//! - [`game`] - Turn state, modes, history and scoring
//! - [`quantum`] - Gates, energy, measurement and decoherence
//! - [`engine`] - The [`Game`](engine::Game) orchestrator
//! - [`ai`] - Opponent move providers
//! - [`save`] - JSON save format
//! - [`protocol`] - Text protocol front end
//!
//! ## Example
//!
//! ```
//! use quantum_go::board::Color;
//! use quantum_go::engine::{Game, GameConfig};
//! use quantum_go::game::GameMode;
//!
//! let mut game = Game::new(GameConfig::default().with_mode(GameMode::Quantum));
//! game.place_stone(40).unwrap();
//! game.run_pending();
//! game.place_stone(0).unwrap();
//! game.run_pending();
//!
//! // Superpose a neighbour of black's centre stone.
//! let pt = game.hadamard(None).unwrap();
//! assert!(game.board().cell(pt).superposition);
//! assert_eq!(game.count_superpositions(), 1);
//! ```

pub mod ai;
pub mod board;
pub mod constants;
pub mod engine;
pub mod error;
pub mod game;
pub mod groups;
pub mod protocol;
pub mod quantum;
pub mod rules;
pub mod save;
