//! Constants for board dimensions, scoring, and the quantum layer.
//!
//! The default board size is controlled by Cargo features:
//! - `board9x9` (default): 9x9 board
//! - `board13x13`: 13x13 board
//!
//! ```sh
//! cargo build                                              # 9x9 (default)
//! cargo build --no-default-features --features board13x13  # 13x13
//! ```
//!
//! The size can still be overridden per game through
//! [`GameConfig`](crate::engine::GameConfig).

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
#[cfg(feature = "board9x9")]
pub const DEFAULT_SIZE: usize = 9;

#[cfg(feature = "board13x13")]
pub const DEFAULT_SIZE: usize = 13;

// Compile-time check: exactly one board size feature must be enabled
#[cfg(all(feature = "board9x9", feature = "board13x13"))]
compile_error!("Cannot enable both 'board9x9' and 'board13x13' features at the same time");

#[cfg(not(any(feature = "board9x9", feature = "board13x13")))]
compile_error!("Must enable exactly one board size feature: 'board9x9' or 'board13x13'");

/// Smallest board the engine accepts.
pub const MIN_SIZE: usize = 2;

/// Largest board the engine accepts (Go coordinates run out after T).
pub const MAX_SIZE: usize = 25;

// =============================================================================
// Scoring
// =============================================================================

/// Compensation points for White.
pub const KOMI: f32 = 7.5;

/// Points awarded to the placer for each stone committed to the board.
pub const PLACEMENT_POINTS: u32 = 1;

/// Points awarded to the capturer for each captured stone.
pub const CAPTURE_POINTS: u32 = 2;

/// Consecutive passes that end the game.
pub const PASSES_TO_END: u8 = 2;

// =============================================================================
// Quantum Energy
// =============================================================================

/// Energy each player starts with.
pub const START_ENERGY: u32 = 3;

/// Energy cap.
pub const MAX_ENERGY: u32 = 5;

/// Energy regained by the player who just moved.
pub const ENERGY_REGEN: u32 = 1;

/// Gate costs.
pub const COST_HADAMARD: u32 = 1;
pub const COST_CNOT: u32 = 1;
pub const COST_PAULI_X: u32 = 1;
pub const COST_PAULI_Z: u32 = 1;
pub const COST_MEASURE: u32 = 0;
pub const COST_TELEPORT: u32 = 2;
pub const COST_TUNNEL: u32 = 2;

// =============================================================================
// Superposition and Decoherence
// =============================================================================

/// Collapse probability given to a cell by the Hadamard gate.
pub const HADAMARD_PROBABILITY: f64 = 0.7;

/// Lower bound of the probability drawn for a superposition-mode placement.
pub const PLACEMENT_PROBABILITY_MIN: f64 = 0.5;

/// Width of the probability range drawn for a superposition-mode placement.
pub const PLACEMENT_PROBABILITY_SPREAD: f64 = 0.3;

/// Ticks a fresh superposition survives before forced measurement.
pub const DECOHERENCE_TICKS: u32 = 5;

/// Per-tick drift of a superposed probability away from 0.5.
pub const DECOHERENCE_RATE: f64 = 0.1;

/// Decoherence never pushes a probability past these bounds.
pub const DECOHERENCE_FLOOR: f64 = 0.01;
pub const DECOHERENCE_CEIL: f64 = 0.99;

/// Shift applied to an entangled partner when its twin collapses.
pub const ENTANGLEMENT_NUDGE: f64 = 0.3;

/// Bounds for the entangled partner's probability after a nudge.
pub const ENTANGLEMENT_FLOOR: f64 = 0.05;
pub const ENTANGLEMENT_CEIL: f64 = 0.95;

/// Length scale of the tunnelling success curve `exp(-d / scale)`.
pub const TUNNEL_LENGTH: f64 = 3.0;
