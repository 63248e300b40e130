//! Turn and game state: player alternation, passes, history and final scoring.
//!
//! The game is `InProgress` until two consecutive passes (or a position where
//! neither side can place a stone) end it. Final scoring is area-style:
//!
//! ```text
//! total(color) = capture points + stones on board + territory   (+ komi for White)
//! ```
//!
//! Capture points accumulate during play: one point per committed stone and
//! two per captured opponent stone.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Point};
use crate::constants::{CAPTURE_POINTS, KOMI, PASSES_TO_END, PLACEMENT_POINTS};
use crate::groups::territory;
use crate::quantum::Gate;
use crate::rules::Placement;

/// Which quantum operations a game offers. Fixed for the lifetime of a game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Plain Go, no quantum operations.
    #[default]
    Classic,
    /// Placements create superposed stones; Hadamard and measurement only.
    Superposition,
    /// Full gate set.
    Entanglement,
    /// Full gate set.
    Quantum,
}

impl GameMode {
    /// Whether any quantum machinery (gates, decoherence, energy) is active.
    #[inline]
    pub fn is_quantum(self) -> bool {
        self != GameMode::Classic
    }

    /// Whether `gate` may be invoked in this mode.
    pub fn allows(self, gate: Gate) -> bool {
        match self {
            GameMode::Classic => false,
            GameMode::Superposition => matches!(gate, Gate::Hadamard | Gate::Measure),
            GameMode::Entanglement | GameMode::Quantum => true,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Classic => "classic",
            GameMode::Superposition => "superposition",
            GameMode::Entanglement => "entanglement",
            GameMode::Quantum => "quantum",
        };
        f.write_str(name)
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(GameMode::Classic),
            "superposition" => Ok(GameMode::Superposition),
            "entanglement" => Ok(GameMode::Entanglement),
            "quantum" => Ok(GameMode::Quantum),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

/// Capture points per player.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub black: u32,
    pub white: u32,
}

impl Scores {
    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn add(&mut self, color: Color, points: u32) {
        match color {
            Color::Black => self.black += points,
            Color::White => self.white += points,
        }
    }
}

/// What a history entry recorded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    /// Classical stone committed at a point.
    Place(Point),
    /// Superposed stone created by a superposition-mode placement.
    Superpose(Point),
    /// Superposed stone measured by a superposition-mode placement.
    Collapse(Point),
    Pass,
}

/// One entry of the move history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub turn: u32,
    pub player: Color,
    pub kind: MoveKind,
    pub mode: GameMode,
    pub timestamp_ms: u64,
}

/// Score breakdown for one player at game end.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScoreLine {
    pub captures: u32,
    pub stones: usize,
    pub territory: usize,
    pub komi: f32,
}

impl ScoreLine {
    pub fn total(&self) -> f32 {
        self.captures as f32 + self.stones as f32 + self.territory as f32 + self.komi
    }
}

/// Final result of a game.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FinalScore {
    pub black: ScoreLine,
    pub white: ScoreLine,
    /// `None` on a draw.
    pub winner: Option<Color>,
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (b, w) = (self.black.total(), self.white.total());
        match self.winner {
            Some(Color::Black) => write!(f, "B+{:.1} ({b:.1} vs {w:.1})", b - w),
            Some(Color::White) => write!(f, "W+{:.1} ({w:.1} vs {b:.1})", w - b),
            None => write!(f, "draw ({b:.1})"),
        }
    }
}

/// Classical game progress.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub mode: GameMode,
    pub current_player: Color,
    /// Starts at 1, incremented on every completed move or pass.
    pub turn_number: u32,
    pub ko: Option<Point>,
    pub consecutive_passes: u8,
    pub scores: Scores,
    pub game_over: bool,
    pub winner: Option<Color>,
    pub history: Vec<MoveRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl GameState {
    pub fn new(mode: GameMode) -> Self {
        GameState {
            mode,
            current_player: Color::Black,
            turn_number: 1,
            ko: None,
            consecutive_passes: 0,
            scores: Scores::default(),
            game_over: false,
            winner: None,
            history: Vec::new(),
        }
    }

    /// Award points for a committed placement and store its ko point.
    pub fn apply_placement(&mut self, placement: &Placement) {
        let points = PLACEMENT_POINTS + CAPTURE_POINTS * placement.captured.len() as u32;
        self.scores.add(placement.color, points);
        self.ko = placement.ko;
    }

    /// Append a history entry for the current player and turn.
    pub fn record(&mut self, kind: MoveKind) {
        self.history.push(MoveRecord {
            turn: self.turn_number,
            player: self.current_player,
            kind,
            mode: self.mode,
            timestamp_ms: now_ms(),
        });
    }

    /// Hand the turn to the other player after a completed move.
    pub fn advance_turn(&mut self) {
        self.current_player = self.current_player.opponent();
        self.turn_number = self.turn_number.saturating_add(1);
    }

    /// Register a pass. Returns `true` when it was the game-ending pass.
    pub fn register_pass(&mut self) -> bool {
        self.consecutive_passes += 1;
        self.ko = None;
        self.consecutive_passes >= PASSES_TO_END
    }

    /// Most recent placement by `player` that still holds their stone.
    ///
    /// Falls back to the highest-index classical stone of `player` when the
    /// history has none, as after a load or once every placed stone has been
    /// moved by a gate.
    pub fn last_stone_of(&self, board: &Board, player: Color) -> Option<Point> {
        self.history
            .iter()
            .rev()
            .find_map(|rec| match rec.kind {
                MoveKind::Place(pt) if rec.player == player && board.stone(pt) == Some(player) => {
                    Some(pt)
                }
                _ => None,
            })
            .or_else(|| board.points().rev().find(|&pt| board.stone(pt) == Some(player)))
    }

    /// Mark the game over and record the winner.
    pub fn finish(&mut self, board: &Board) -> FinalScore {
        let result = final_score(board, &self.scores);
        self.game_over = true;
        self.winner = result.winner;
        result
    }
}

/// Area score of a position: capture points + stones + territory, komi for White.
pub fn final_score(board: &Board, scores: &Scores) -> FinalScore {
    let line = |color: Color, komi: f32| ScoreLine {
        captures: scores.get(color),
        stones: board.count_stones(color),
        territory: territory(board, color),
        komi,
    };
    let black = line(Color::Black, 0.0);
    let white = line(Color::White, KOMI);

    let (b, w) = (black.total(), white.total());
    let winner = if b > w {
        Some(Color::Black)
    } else if w > b {
        Some(Color::White)
    } else {
        None
    };
    FinalScore {
        black,
        white,
        winner,
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_gate_table() {
        assert!(!GameMode::Classic.allows(Gate::Measure));
        assert!(GameMode::Superposition.allows(Gate::Hadamard));
        assert!(GameMode::Superposition.allows(Gate::Measure));
        assert!(!GameMode::Superposition.allows(Gate::Cnot));
        assert!(GameMode::Quantum.allows(Gate::Teleport));
        assert!(GameMode::Entanglement.allows(Gate::Tunnel));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Quantum".parse::<GameMode>(), Ok(GameMode::Quantum));
        assert!("chess".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_two_passes_end() {
        let mut state = GameState::new(GameMode::Classic);
        assert!(!state.register_pass());
        assert!(state.register_pass());
    }

    #[test]
    fn test_empty_board_goes_to_white_on_komi() {
        let board = Board::new(9);
        let result = final_score(&board, &Scores::default());
        assert_eq!(result.black.total(), 0.0);
        assert_eq!(result.white.total(), 7.5);
        assert_eq!(result.winner, Some(Color::White));
    }

    #[test]
    fn test_single_stone_owns_the_board() {
        let mut board = Board::new(9);
        board.place(40, Color::Black);
        let scores = Scores { black: 1, white: 0 };
        let result = final_score(&board, &scores);
        // 1 capture point + 1 stone + 80 territory.
        assert_eq!(result.black.total(), 82.0);
        assert_eq!(result.winner, Some(Color::Black));
    }

    #[test]
    fn test_komi_decides_close_games() {
        let board = Board::new(3);
        let result = final_score(&board, &Scores { black: 8, white: 0 });
        assert_eq!(result.winner, Some(Color::Black));
        assert_eq!(result.to_string(), "B+0.5 (8.0 vs 7.5)");

        let result = final_score(&board, &Scores { black: 7, white: 0 });
        assert_eq!(result.winner, Some(Color::White));
    }

    #[test]
    fn test_last_stone_skips_captured_placements() {
        let mut board = Board::new(9);
        let mut state = GameState::new(GameMode::Quantum);
        board.place(10, Color::Black);
        state.record(MoveKind::Place(10));
        state.advance_turn();
        state.advance_turn();
        board.place(20, Color::Black);
        state.record(MoveKind::Place(20));
        assert_eq!(state.last_stone_of(&board, Color::Black), Some(20));
        board.clear(20);
        assert_eq!(state.last_stone_of(&board, Color::Black), Some(10));
        assert_eq!(state.last_stone_of(&board, Color::White), None);
    }

    #[test]
    fn test_last_stone_falls_back_to_board() {
        let mut board = Board::new(9);
        let state = GameState::new(GameMode::Quantum);
        board.place(5, Color::Black);
        board.place(30, Color::Black);
        board.superpose(60, Color::Black, 0.7, 5);
        board.place(70, Color::White);
        assert_eq!(state.last_stone_of(&board, Color::Black), Some(30));
        assert_eq!(state.last_stone_of(&board, Color::White), Some(70));
    }

    #[test]
    fn test_last_stone_follows_relocated_stone() {
        let mut board = Board::new(9);
        let mut state = GameState::new(GameMode::Quantum);
        board.place(40, Color::Black);
        state.record(MoveKind::Place(40));
        board.relocate(40, 13);
        assert_eq!(state.last_stone_of(&board, Color::Black), Some(13));
    }

    #[test]
    fn test_turn_counter_saturates() {
        let mut state = GameState::new(GameMode::Classic);
        state.turn_number = u32::MAX;
        state.advance_turn();
        assert_eq!(state.turn_number, u32::MAX);
        assert_eq!(state.current_player, Color::White);
    }
}
