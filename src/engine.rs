//! Game orchestrator.
//!
//! [`Game`] owns the board, the classical game state and the quantum state,
//! and sequences every request through legality, resolution, quantum
//! maintenance and turn handoff.
//!
//! ## Move lifecycle
//!
//! A move or pass is completed synchronously, then leaves follow-up work in a
//! deferred queue that the caller drains with [`Game::run_pending`]:
//!
//! 1. release the in-flight move guard,
//! 2. check for the end of the game (possibly scheduling an automatic pass),
//! 3. let the AI move if it is the AI's turn.
//!
//! Until the guard is released, further move requests are rejected as
//! no-ops. Deferred tasks cannot be cancelled; each one re-checks the game
//! state when it runs, and tasks issued before a [`Game::reset`] are dropped.
//!
//! ```
//! use quantum_go::engine::{Game, GameConfig};
//! use quantum_go::board::Color;
//!
//! let mut game = Game::new(GameConfig::default());
//! game.place_stone(40).unwrap();
//! game.run_pending();
//! assert_eq!(game.board().stone(40), Some(Color::Black));
//! assert_eq!(game.current_player(), Color::White);
//! ```

use std::collections::VecDeque;

use fastrand::Rng;
use tracing::{debug, info, warn};

use crate::ai::{AiMove, Difficulty, GateRequest, MoveProvider, RandomMoveProvider};
use crate::board::{Board, Cell, Color, Point};
use crate::constants::{
    DECOHERENCE_TICKS, DEFAULT_SIZE, MAX_SIZE, MIN_SIZE, PLACEMENT_PROBABILITY_MIN,
    PLACEMENT_PROBABILITY_SPREAD,
};
use crate::error::{GameError, Result};
use crate::game::{FinalScore, GameMode, GameState, MoveKind, MoveRecord, Scores, final_score};
use crate::groups;
use crate::quantum::{BellOutcome, Gate, MeasurementRecord, QuantumState, TunnelOutcome};
use crate::rules;

/// How many times one AI turn may ask its provider before falling back to a pass.
const AI_REQUESTS_PER_TURN: usize = 3;

/// AI opponent settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AiConfig {
    pub color: Color,
    pub difficulty: Difficulty,
}

/// Settings fixed at game start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub size: usize,
    pub mode: GameMode,
    /// Seed for measurement and tunnelling randomness; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub ai: Option<AiConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            size: DEFAULT_SIZE,
            mode: GameMode::default(),
            seed: None,
            ai: None,
        }
    }
}

impl GameConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.clamp(MIN_SIZE, MAX_SIZE);
        self
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_ai(mut self, color: Color, difficulty: Difficulty) -> Self {
        self.ai = Some(AiConfig { color, difficulty });
        self
    }
}

/// Follow-up work left behind by a completed move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Deferred {
    ReleaseMoveLock,
    CheckGameEnd,
    /// Pass for a player left without legal placements on the given turn.
    AutoPass { turn: u32 },
    AiTurn,
}

#[derive(Copy, Clone, Debug)]
struct Task {
    generation: u64,
    kind: Deferred,
}

/// A complete game: board, rules state, quantum state and scheduling.
pub struct Game {
    config: GameConfig,
    board: Board,
    state: GameState,
    quantum: QuantumState,
    rng: Rng,
    processing_move: bool,
    /// Bumped on reset; tasks from older generations are dropped.
    generation: u64,
    pending: VecDeque<Task>,
    provider: Option<Box<dyn MoveProvider>>,
    result: Option<FinalScore>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let config = config.with_size(config.size);
        let rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        let provider = config.ai.map(|_| -> Box<dyn MoveProvider> {
            match config.seed {
                Some(seed) => Box::new(RandomMoveProvider::with_seed(seed.wrapping_add(1))),
                None => Box::new(RandomMoveProvider::new()),
            }
        });
        Game {
            config,
            board: Board::new(config.size),
            state: GameState::new(config.mode),
            quantum: QuantumState::new(),
            rng,
            processing_move: false,
            generation: 0,
            pending: VecDeque::new(),
            provider,
            result: None,
        }
    }

    /// Replace the provider that plays for the configured AI colour.
    pub fn set_provider(&mut self, provider: Box<dyn MoveProvider>) {
        self.provider = Some(provider);
    }

    /// Start over with an empty board and fresh quantum state.
    ///
    /// Deferred tasks issued before the reset stay queued but are discarded
    /// when they come up.
    pub fn reset(&mut self) {
        self.board = Board::new(self.config.size);
        self.state = GameState::new(self.config.mode);
        self.quantum = QuantumState::new();
        self.processing_move = false;
        self.generation += 1;
        self.result = None;
        info!(generation = self.generation, "game reset");
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn quantum(&self) -> &QuantumState {
        &self.quantum
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn current_player(&self) -> Color {
        self.state.current_player
    }

    pub fn scores(&self) -> Scores {
        self.state.scores
    }

    pub fn is_over(&self) -> bool {
        self.state.game_over
    }

    pub fn winner(&self) -> Option<Color> {
        self.state.winner
    }

    /// Final score once the game has ended.
    pub fn result(&self) -> Option<&FinalScore> {
        self.result.as_ref()
    }

    pub fn is_processing_move(&self) -> bool {
        self.processing_move
    }

    pub fn energy(&self, player: Color) -> u32 {
        self.quantum.energy(player)
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.state.history
    }

    pub fn measurement_log(&self) -> &[MeasurementRecord] {
        &self.quantum.measurement_log
    }

    pub fn cell(&self, pt: Point) -> Option<&Cell> {
        self.board.get(pt)
    }

    pub fn count_stones(&self, color: Color) -> usize {
        self.board.count_stones(color)
    }

    pub fn count_superpositions(&self) -> usize {
        self.board.count_superpositions()
    }

    pub fn count_entanglements(&self) -> usize {
        self.board.count_entanglements()
    }

    pub fn territory(&self, color: Color) -> usize {
        groups::territory(&self.board, color)
    }

    pub fn can_place(&self, pt: Point, player: Color) -> Result<()> {
        rules::can_place(&self.board, self.state.ko, pt, player)
    }

    pub fn has_legal_move(&self, player: Color) -> bool {
        rules::has_legal_move(&self.board, self.state.ko, player)
    }

    pub fn legal_moves(&self, player: Color) -> Vec<Point> {
        self.board
            .points()
            .filter(|&pt| self.can_place(pt, player).is_ok())
            .collect()
    }

    /// Score of the current position as if the game ended now.
    pub fn provisional_score(&self) -> FinalScore {
        final_score(&self.board, &self.state.scores)
    }

    /// Follow-up tasks still waiting to run, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = Deferred> + '_ {
        self.pending.iter().map(|t| t.kind)
    }

    // -------------------------------------------------------------------------
    // Moves
    // -------------------------------------------------------------------------

    fn ensure_can_move(&self) -> Result<()> {
        if self.processing_move {
            warn!("move rejected: previous move still in flight");
            return Err(GameError::ReentrantMoveRejected);
        }
        if self.state.game_over {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Place a stone for the current player.
    ///
    /// In superposition mode the placement creates a superposed stone on an
    /// empty point, or measures the point if it is already superposed.
    pub fn place_stone(&mut self, pt: Point) -> Result<()> {
        self.ensure_can_move()?;
        let player = self.state.current_player;

        let kind = if self.state.mode == GameMode::Superposition {
            self.place_superposed(pt, player)?
        } else {
            let placement = rules::play_stone(&mut self.board, self.state.ko, pt, player)?;
            self.state.apply_placement(&placement);
            MoveKind::Place(pt)
        };

        self.state.record(kind);
        self.state.consecutive_passes = 0;
        self.complete_turn(player);
        Ok(())
    }

    fn place_superposed(&mut self, pt: Point, player: Color) -> Result<MoveKind> {
        let (superposed, occupied) = match self.board.get(pt) {
            Some(cell) => (cell.superposition, cell.classical.is_some()),
            None => return Err(GameError::OutOfBounds { index: pt }),
        };
        if superposed {
            self.quantum
                .collapse(&mut self.board, &mut self.rng, pt, self.state.turn_number)?;
            Ok(MoveKind::Collapse(pt))
        } else if !occupied {
            let probability =
                PLACEMENT_PROBABILITY_MIN + self.rng.f64() * PLACEMENT_PROBABILITY_SPREAD;
            self.board
                .superpose(pt, player, probability, DECOHERENCE_TICKS);
            Ok(MoveKind::Superpose(pt))
        } else {
            Err(GameError::OccupiedCell { index: pt })
        }
    }

    /// Pass for the current player. The second consecutive pass ends the game.
    pub fn pass(&mut self) -> Result<()> {
        self.ensure_can_move()?;
        let player = self.state.current_player;
        self.state.record(MoveKind::Pass);
        debug!(%player, passes = self.state.consecutive_passes + 1, "pass");

        if self.state.register_pass() {
            self.end_game();
            return Ok(());
        }
        self.complete_turn(player);
        Ok(())
    }

    /// Turn handoff after a successful move by `mover`.
    fn complete_turn(&mut self, mover: Color) {
        self.processing_move = true;
        self.state.advance_turn();
        self.run_maintenance(mover);
        self.schedule(Deferred::ReleaseMoveLock);
        self.schedule(Deferred::CheckGameEnd);
        if self.config.ai.is_some() {
            self.schedule(Deferred::AiTurn);
        }
    }

    /// End-of-turn quantum upkeep: decoherence and energy regeneration.
    fn run_maintenance(&mut self, mover: Color) {
        if !self.state.mode.is_quantum() {
            return;
        }
        let forced = self
            .quantum
            .decohere(&mut self.board, &mut self.rng, self.state.turn_number);
        if !forced.is_empty() {
            debug!(count = forced.len(), "decoherence forced measurements");
        }
        self.quantum.restore_energy(mover);
    }

    /// Score the position and mark the game over.
    pub fn end_game(&mut self) -> FinalScore {
        let result = self.state.finish(&self.board);
        info!(%result, "game over");
        self.result = Some(result);
        result
    }

    /// End the game if nobody can place a stone; force a pass if only the
    /// player to move is stuck.
    pub fn check_game_end(&mut self) {
        if self.state.game_over {
            return;
        }
        let player = self.state.current_player;
        let current = self.has_legal_move(player);
        let other = self.has_legal_move(player.opponent());
        if !current && !other {
            self.end_game();
        } else if !current {
            info!(%player, "no legal placement, passing automatically");
            self.schedule(Deferred::AutoPass {
                turn: self.state.turn_number,
            });
        }
    }

    // -------------------------------------------------------------------------
    // Deferred work
    // -------------------------------------------------------------------------

    fn schedule(&mut self, kind: Deferred) {
        self.pending.push_back(Task {
            generation: self.generation,
            kind,
        });
    }

    /// Run queued follow-up work until the queue is empty. Returns the
    /// number of tasks executed.
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Some(task) = self.pending.pop_front() {
            if task.generation != self.generation {
                debug!(kind = ?task.kind, "dropping stale task");
                continue;
            }
            executed += 1;
            match task.kind {
                Deferred::ReleaseMoveLock => self.processing_move = false,
                Deferred::CheckGameEnd => self.check_game_end(),
                Deferred::AutoPass { turn } => {
                    if !self.state.game_over && self.state.turn_number == turn {
                        if let Err(e) = self.pass() {
                            warn!("automatic pass failed: {e}");
                        }
                    }
                }
                Deferred::AiTurn => self.play_ai_turn(),
            }
        }
        executed
    }

    /// Let the configured AI act if it is its turn.
    fn play_ai_turn(&mut self) {
        let Some(ai) = self.config.ai else {
            return;
        };
        if self.state.game_over || self.state.current_player != ai.color {
            return;
        }
        let Some(mut provider) = self.provider.take() else {
            return;
        };

        let turn = self.state.turn_number;
        let mut used_gate = false;
        for _ in 0..AI_REQUESTS_PER_TURN {
            if self.state.turn_number != turn || self.state.game_over {
                break;
            }
            match provider.request_move(self, ai.color, ai.difficulty) {
                AiMove::Gate(request) if !used_gate => {
                    used_gate = true;
                    if let Err(e) = self.apply_gate(request) {
                        debug!("ai gate {request:?} rejected: {e}");
                    }
                }
                AiMove::Gate(_) => {}
                AiMove::Place(pt) => {
                    if let Err(e) = self.place_stone(pt) {
                        debug!("ai placement at {pt} rejected: {e}");
                    }
                }
                AiMove::Pass => {
                    if let Err(e) = self.pass() {
                        warn!("ai pass failed: {e}");
                    }
                }
            }
        }
        if self.state.turn_number == turn && !self.state.game_over {
            if let Err(e) = self.pass() {
                warn!("ai fallback pass failed: {e}");
            }
        }
        self.provider = Some(provider);
    }

    // -------------------------------------------------------------------------
    // Quantum gates
    // -------------------------------------------------------------------------

    fn ensure_gate(&self, gate: Gate) -> Result<()> {
        if self.state.game_over {
            return Err(GameError::GameOver);
        }
        if !self.state.mode.allows(gate) {
            return Err(GameError::GateUnavailable {
                gate,
                mode: self.state.mode,
            });
        }
        Ok(())
    }

    /// Execute a gate request on behalf of the current player.
    pub fn apply_gate(&mut self, request: GateRequest) -> Result<()> {
        match request {
            GateRequest::Hadamard { target } => self.hadamard(target).map(drop),
            GateRequest::Entangle { a, b } => self.entangle(a, b),
            GateRequest::PauliX { point } => self.pauli_x(point).map(drop),
            GateRequest::PauliZ { point } => self.pauli_z(point).map(drop),
            GateRequest::Measure { point } => self.measure(point).map(drop),
            GateRequest::MeasureAll => self.measure_all().map(drop),
            GateRequest::Tunnel { from, to } => self.tunnel(from, to).map(drop),
            GateRequest::Teleport { from, to } => self.teleport(from, to),
            GateRequest::Bell { a, b } => self.bell_measure(a, b).map(drop),
        }
    }

    /// Superpose an empty neighbour of the current player's latest stone.
    pub fn hadamard(&mut self, target: Option<Point>) -> Result<Point> {
        self.ensure_gate(Gate::Hadamard)?;
        let player = self.state.current_player;
        let anchor = self.state.last_stone_of(&self.board, player);
        self.quantum
            .hadamard(&mut self.board, &mut self.rng, player, anchor, target)
    }

    pub fn entangle(&mut self, a: Point, b: Point) -> Result<()> {
        self.ensure_gate(Gate::Cnot)?;
        let player = self.state.current_player;
        self.quantum.entangle(&mut self.board, player, a, b)
    }

    pub fn pauli_x(&mut self, pt: Point) -> Result<Color> {
        self.ensure_gate(Gate::PauliX)?;
        let player = self.state.current_player;
        self.quantum.pauli_x(&mut self.board, player, pt)
    }

    pub fn pauli_z(&mut self, pt: Point) -> Result<f64> {
        self.ensure_gate(Gate::PauliZ)?;
        let player = self.state.current_player;
        self.quantum.pauli_z(&mut self.board, player, pt)
    }

    pub fn measure(&mut self, pt: Point) -> Result<Option<Color>> {
        self.ensure_gate(Gate::Measure)?;
        let player = self.state.current_player;
        let turn = self.state.turn_number;
        self.quantum
            .measure(&mut self.board, &mut self.rng, player, pt, turn)
    }

    pub fn measure_all(&mut self) -> Result<usize> {
        self.ensure_gate(Gate::Measure)?;
        let player = self.state.current_player;
        let turn = self.state.turn_number;
        self.quantum
            .measure_all(&mut self.board, &mut self.rng, player, turn)
    }

    pub fn tunnel(&mut self, from: Point, to: Point) -> Result<TunnelOutcome> {
        self.ensure_gate(Gate::Tunnel)?;
        let player = self.state.current_player;
        self.quantum
            .tunnel(&mut self.board, &mut self.rng, player, from, to)
    }

    pub fn teleport(&mut self, from: Point, to: Point) -> Result<()> {
        self.ensure_gate(Gate::Teleport)?;
        let player = self.state.current_player;
        self.quantum.teleport(&mut self.board, player, from, to)
    }

    pub fn bell_measure(&mut self, a: Point, b: Point) -> Result<BellOutcome> {
        self.ensure_gate(Gate::Bell)?;
        let player = self.state.current_player;
        let turn = self.state.turn_number;
        self.quantum
            .bell_measure(&mut self.board, &mut self.rng, player, a, b, turn)
    }

    // -------------------------------------------------------------------------
    // Snapshot plumbing for save/load
    // -------------------------------------------------------------------------

    pub(crate) fn replace_state(&mut self, board: Board, state: GameState, quantum: QuantumState) {
        self.config.size = board.size();
        self.config.mode = state.mode;
        self.board = board;
        self.state = state;
        self.quantum = quantum;
        self.processing_move = false;
        self.generation += 1;
        self.result = None;
    }
}
