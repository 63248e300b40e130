//! Error taxonomy for rejected game operations.
//!
//! Every variant is recoverable: the operation that produced it leaves the
//! game state as it was before the call.

use thiserror::Error;

use crate::board::Color;
use crate::game::GameMode;
use crate::quantum::Gate;

/// Result type for game operations.
pub type Result<T> = std::result::Result<T, GameError>;

/// Reasons a move, gate or load request is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Illegal move: index {index} is off the board")]
    OutOfBounds { index: usize },

    #[error("Illegal move: point {index} not EMPTY")]
    OccupiedCell { index: usize },

    #[error("Illegal move: retakes ko at {index}")]
    KoViolation { index: usize },

    #[error("Illegal move: suicide at {index}")]
    SuicideMove { index: usize },

    #[error("Insufficient energy for {gate}: {player} has {available}, needs {needed}")]
    InsufficientEnergy {
        player: Color,
        gate: Gate,
        needed: u32,
        available: u32,
    },

    #[error("Invalid entanglement target ({a}, {b}): {reason}")]
    InvalidEntanglementTarget {
        a: usize,
        b: usize,
        reason: &'static str,
    },

    #[error("Invalid target {index} for {gate}: {reason}")]
    InvalidGateTarget {
        gate: Gate,
        index: usize,
        reason: &'static str,
    },

    #[error("No eligible target for {gate} for {player}")]
    NoEligibleTarget { gate: Gate, player: Color },

    #[error("{gate} is not available in {mode} mode")]
    GateUnavailable { gate: Gate, mode: GameMode },

    #[error("Broken entanglement: {index} points at {partner} which does not point back")]
    BrokenEntanglement { index: usize, partner: usize },

    #[error("Game is over")]
    GameOver,

    #[error("Move rejected: another move is still being processed")]
    ReentrantMoveRejected,

    #[error("Corrupt save data: {0}")]
    CorruptSaveData(String),
}
