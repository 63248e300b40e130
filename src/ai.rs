//! Opponent move selection.
//!
//! The engine asks a [`MoveProvider`] for a move whenever it is the AI's
//! turn and executes the answer through the same checked entry points a
//! human uses. The provider only gets a shared view of the game.
//!
//! [`RandomMoveProvider`] is a simple reference strategy: with a
//! difficulty-dependent probability it tries one quantum operation, then it
//! plays a random legal placement that does not fill one of its own eyes.

use std::fmt;
use std::str::FromStr;

use fastrand::Rng;

use crate::board::{Board, Color, Point};
use crate::engine::Game;
use crate::groups::adjacent;

/// AI strength setting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Chance that the reference provider reaches for a quantum gate.
    pub fn quantum_probability(self) -> f64 {
        match self {
            Difficulty::Easy => 0.1,
            Difficulty::Medium => 0.3,
            Difficulty::Hard => 0.5,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A quantum operation with its parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GateRequest {
    Hadamard { target: Option<Point> },
    Entangle { a: Point, b: Point },
    PauliX { point: Point },
    PauliZ { point: Point },
    Measure { point: Point },
    MeasureAll,
    Tunnel { from: Point, to: Point },
    Teleport { from: Point, to: Point },
    Bell { a: Point, b: Point },
}

/// What a provider wants to do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AiMove {
    Place(Point),
    Pass,
    Gate(GateRequest),
}

/// Source of opponent moves.
pub trait MoveProvider {
    /// Choose the next action for `player`.
    ///
    /// Gates do not end a turn; the engine honours at most one gate per AI
    /// turn and asks again for a placement or pass afterwards.
    fn request_move(&mut self, game: &Game, player: Color, difficulty: Difficulty) -> AiMove;
}

/// Random play weighted by difficulty.
pub struct RandomMoveProvider {
    rng: Rng,
    /// Turn on which the last gate was requested.
    gate_turn: Option<u32>,
}

impl Default for RandomMoveProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomMoveProvider {
    pub fn new() -> Self {
        Self {
            rng: Rng::new(),
            gate_turn: None,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
            gate_turn: None,
        }
    }

    fn choose_gate(&mut self, game: &Game, player: Color) -> Option<GateRequest> {
        let board = game.board();
        match self.rng.usize(..3) {
            0 => Some(GateRequest::Hadamard { target: None }),
            1 => {
                let own: Vec<Point> = board
                    .points()
                    .filter(|&pt| board.stone(pt) == Some(player) && !board.cell(pt).is_entangled())
                    .collect();
                if own.len() < 2 {
                    return None;
                }
                let i = self.rng.usize(..own.len());
                let mut j = self.rng.usize(..own.len() - 1);
                if j >= i {
                    j += 1;
                }
                Some(GateRequest::Entangle { a: own[i], b: own[j] })
            }
            _ => {
                let pending: Vec<Point> = board
                    .points()
                    .filter(|&pt| {
                        let cell = board.cell(pt);
                        cell.superposition && cell.pending_color == Some(player)
                    })
                    .collect();
                self.rng
                    .choice(pending)
                    .map(|point| GateRequest::Measure { point })
            }
        }
    }

    /// Pick a random legal placement that does not fill an own eye.
    fn choose_placement(&mut self, game: &Game, player: Color) -> Option<Point> {
        let board = game.board();
        let candidates: Vec<Point> = game
            .legal_moves(player)
            .into_iter()
            .filter(|&pt| !is_eye(board, pt, player))
            .collect();
        self.rng.choice(candidates)
    }
}

impl MoveProvider for RandomMoveProvider {
    fn request_move(&mut self, game: &Game, player: Color, difficulty: Difficulty) -> AiMove {
        let turn = game.state().turn_number;
        let may_use_gate = game.mode().is_quantum()
            && self.gate_turn != Some(turn)
            && game.energy(player) > 0;
        if may_use_gate && self.rng.f64() < difficulty.quantum_probability() {
            self.gate_turn = Some(turn);
            if let Some(request) = self.choose_gate(game, player) {
                return AiMove::Gate(request);
            }
        }

        match self.choose_placement(game, player) {
            Some(pt) => AiMove::Place(pt),
            None => AiMove::Pass,
        }
    }
}

/// An empty point whose every neighbour is a stone of `color`.
pub fn is_eye(board: &Board, pt: Point, color: Color) -> bool {
    board.stone(pt).is_none() && adjacent(board, pt).all(|n| board.stone(n) == Some(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameConfig;
    use crate::game::GameMode;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_is_eye() {
        let mut board = Board::new(9);
        board.place(1, Color::Black);
        board.place(9, Color::Black);
        assert!(is_eye(&board, 0, Color::Black));
        assert!(!is_eye(&board, 0, Color::White));
        assert!(!is_eye(&board, 40, Color::Black));
    }

    #[test]
    fn test_random_provider_plays_legal_placement() {
        let game = Game::new(GameConfig::default().with_mode(GameMode::Classic));
        let mut provider = RandomMoveProvider::with_seed(3);
        match provider.request_move(&game, Color::Black, Difficulty::Hard) {
            AiMove::Place(pt) => assert!(game.can_place(pt, Color::Black).is_ok()),
            other => panic!("expected a placement, got {other:?}"),
        }
    }

    #[test]
    fn test_random_provider_passes_when_only_eyes_remain() {
        // 2x2 board: black owns three points, the last one is its own eye.
        let mut game = Game::new(GameConfig::default().with_size(2));
        game.place_stone(0).unwrap();
        game.run_pending();
        game.pass().unwrap();
        game.run_pending();
        game.place_stone(1).unwrap();
        game.run_pending();
        game.pass().unwrap();
        game.run_pending();
        game.place_stone(2).unwrap();
        game.run_pending();

        let mut provider = RandomMoveProvider::with_seed(1);
        assert_eq!(
            provider.request_move(&game, Color::Black, Difficulty::Easy),
            AiMove::Pass
        );
    }
}
