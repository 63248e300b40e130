//! Quantum layer: gates, energy accounting, measurement and decoherence.
//!
//! Every player-invoked gate follows the same order: check that the player
//! can pay for it, validate the targets, mutate the board, then deduct the
//! cost. A rejected gate leaves both the board and the energy untouched.
//!
//! Forced measurements issued by decoherence go through [`QuantumState::collapse`]
//! directly and cost nothing.

use std::fmt;

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, Cell, Color, Point};
use crate::constants::*;
use crate::error::{GameError, Result};
use crate::game::now_ms;
use crate::groups::adjacent;

/// Quantum operations a player can invoke.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Hadamard,
    Cnot,
    PauliX,
    PauliZ,
    Measure,
    Teleport,
    Tunnel,
    Bell,
}

impl Gate {
    /// Energy cost of one invocation.
    pub const fn cost(self) -> u32 {
        match self {
            Gate::Hadamard => COST_HADAMARD,
            Gate::Cnot => COST_CNOT,
            Gate::PauliX => COST_PAULI_X,
            Gate::PauliZ => COST_PAULI_Z,
            Gate::Measure => COST_MEASURE,
            Gate::Teleport => COST_TELEPORT,
            Gate::Tunnel => COST_TUNNEL,
            Gate::Bell => 0,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gate::Hadamard => "hadamard",
            Gate::Cnot => "cnot",
            Gate::PauliX => "pauli_x",
            Gate::PauliZ => "pauli_z",
            Gate::Measure => "measure",
            Gate::Teleport => "teleport",
            Gate::Tunnel => "tunnel",
            Gate::Bell => "bell",
        };
        f.write_str(name)
    }
}

/// Per-player energy balance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Energy {
    pub black: u32,
    pub white: u32,
}

impl Energy {
    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    fn slot(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }
}

/// One entry of the append-only measurement log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub index: Point,
    pub prior_probability: f64,
    /// Stone colour the cell collapsed to, `None` when it collapsed to empty.
    pub collapsed_to: Option<Color>,
    pub turn: u32,
    pub timestamp_ms: u64,
}

/// Result of a tunnelling attempt.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TunnelOutcome {
    pub moved: bool,
    pub probability: f64,
}

/// Result of a joint Bell-state measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BellOutcome {
    /// Both cells resolved to the same colour.
    pub same: bool,
    pub colors: (Color, Color),
}

/// Energy balances and measurement history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantumState {
    pub energy: Energy,
    pub max_energy: u32,
    pub decoherence_rate: f64,
    pub measurement_log: Vec<MeasurementRecord>,
}

impl Default for QuantumState {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantumState {
    pub fn new() -> Self {
        QuantumState {
            energy: Energy {
                black: START_ENERGY,
                white: START_ENERGY,
            },
            max_energy: MAX_ENERGY,
            decoherence_rate: DECOHERENCE_RATE,
            measurement_log: Vec::new(),
        }
    }

    pub fn energy(&self, player: Color) -> u32 {
        self.energy.get(player)
    }

    /// Set a balance, clamped to `[0, max_energy]`.
    pub fn set_energy(&mut self, player: Color, amount: u32) {
        let max = self.max_energy;
        *self.energy.slot(player) = amount.min(max);
    }

    pub fn can_afford(&self, player: Color, gate: Gate) -> bool {
        self.energy(player) >= gate.cost()
    }

    fn ensure_energy(&self, player: Color, gate: Gate) -> Result<()> {
        if self.can_afford(player, gate) {
            Ok(())
        } else {
            Err(GameError::InsufficientEnergy {
                player,
                gate,
                needed: gate.cost(),
                available: self.energy(player),
            })
        }
    }

    fn spend(&mut self, player: Color, gate: Gate) {
        let slot = self.energy.slot(player);
        *slot = slot.saturating_sub(gate.cost());
    }

    /// Regenerate energy for `player`, capped at the maximum.
    pub fn restore_energy(&mut self, player: Color) {
        let current = self.energy(player);
        self.set_energy(player, current.saturating_add(ENERGY_REGEN));
    }

    // -------------------------------------------------------------------------
    // Gates
    // -------------------------------------------------------------------------

    /// Put an empty neighbour of `anchor` into superposition for `player`.
    ///
    /// With `target == None` a random eligible neighbour is chosen. Returns the
    /// point that was superposed.
    pub fn hadamard(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        player: Color,
        anchor: Option<Point>,
        target: Option<Point>,
    ) -> Result<Point> {
        let gate = Gate::Hadamard;
        self.ensure_energy(player, gate)?;

        let anchor = anchor.ok_or(GameError::NoEligibleTarget { gate, player })?;
        let candidates: Vec<Point> = adjacent(board, anchor)
            .filter(|&n| board.cell(n).is_vacant())
            .collect();

        let pt = match target {
            Some(t) if candidates.contains(&t) => t,
            Some(t) => {
                return Err(GameError::InvalidGateTarget {
                    gate,
                    index: t,
                    reason: "not an empty neighbour of your last stone",
                });
            }
            None if candidates.is_empty() => {
                return Err(GameError::NoEligibleTarget { gate, player });
            }
            None => candidates[rng.usize(..candidates.len())],
        };

        board.superpose(pt, player, HADAMARD_PROBABILITY, DECOHERENCE_TICKS);
        self.spend(player, gate);
        debug!(point = pt, %player, "hadamard");
        Ok(pt)
    }

    /// Entangle two of `player`'s classical stones.
    pub fn entangle(&mut self, board: &mut Board, player: Color, a: Point, b: Point) -> Result<()> {
        self.ensure_energy(player, Gate::Cnot)?;
        if !board.contains(a) || !board.contains(b) {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "off the board",
            });
        }
        if board.stone(a) != Some(player) || board.stone(b) != Some(player) {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "both cells must hold your stones",
            });
        }
        board.link(a, b)?;
        self.spend(player, Gate::Cnot);
        debug!(a, b, %player, "entangled");
        Ok(())
    }

    /// Flip the colour of a classical stone.
    pub fn pauli_x(&mut self, board: &mut Board, player: Color, pt: Point) -> Result<Color> {
        let gate = Gate::PauliX;
        self.ensure_energy(player, gate)?;
        let Some(color) = board.stone(pt) else {
            return Err(GameError::InvalidGateTarget {
                gate,
                index: pt,
                reason: "no stone to flip",
            });
        };
        let flipped = color.opponent();
        board.recolor(pt, flipped);
        self.spend(player, gate);
        Ok(flipped)
    }

    /// Phase flip: replace a superposed cell's probability `p` with `1 - p`.
    pub fn pauli_z(&mut self, board: &mut Board, player: Color, pt: Point) -> Result<f64> {
        let gate = Gate::PauliZ;
        self.ensure_energy(player, gate)?;
        let cell = superposed_cell(board, gate, pt)?;
        let flipped = 1.0 - cell.probability;
        board.set_probability(pt, flipped);
        self.spend(player, gate);
        Ok(flipped)
    }

    /// Player-invoked measurement of one superposed cell.
    pub fn measure(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        player: Color,
        pt: Point,
        turn: u32,
    ) -> Result<Option<Color>> {
        self.ensure_energy(player, Gate::Measure)?;
        let outcome = self.collapse(board, rng, pt, turn)?;
        self.spend(player, Gate::Measure);
        Ok(outcome)
    }

    /// Measure every superposed cell, in index order. Returns how many were measured.
    pub fn measure_all(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        player: Color,
        turn: u32,
    ) -> Result<usize> {
        self.ensure_energy(player, Gate::Measure)?;
        let mut measured = 0;
        for pt in board.points() {
            if board.cell(pt).superposition {
                self.collapse(board, rng, pt, turn)?;
                measured += 1;
            }
        }
        Ok(measured)
    }

    /// Collapse a superposed cell by its stored probability.
    ///
    /// The outcome is logged. An entangled partner that is itself superposed
    /// has its probability nudged towards the outcome, then the pair is
    /// dissolved. The nudge is applied once and never cascades.
    pub fn collapse(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        pt: Point,
        turn: u32,
    ) -> Result<Option<Color>> {
        let cell = superposed_cell(board, Gate::Measure, pt)?;
        let prior = cell.probability;
        let pending = cell.pending_color;
        let partner = board.partner(pt)?;

        let outcome = if rng.f64() < prior { pending } else { None };
        self.measurement_log.push(MeasurementRecord {
            index: pt,
            prior_probability: prior,
            collapsed_to: outcome,
            turn,
            timestamp_ms: now_ms(),
        });

        match outcome {
            Some(color) => board.place(pt, color),
            None => board.clear(pt),
        }

        if let Some(p) = partner {
            let twin = board.cell(p);
            if twin.superposition {
                let nudged = if outcome.is_some() {
                    (twin.probability + ENTANGLEMENT_NUDGE).min(ENTANGLEMENT_CEIL)
                } else {
                    (twin.probability - ENTANGLEMENT_NUDGE).max(ENTANGLEMENT_FLOOR)
                };
                board.set_probability(p, nudged);
            }
            board.unlink(p);
        }

        debug!(point = pt, prior, outcome = ?outcome, "collapsed");
        Ok(outcome)
    }

    /// Try to move `player`'s stone from `from` to the empty point `to`.
    ///
    /// Succeeds with probability `exp(-distance / 3)`. The cost is paid
    /// whether or not the stone moves.
    pub fn tunnel(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        player: Color,
        from: Point,
        to: Point,
    ) -> Result<TunnelOutcome> {
        let gate = Gate::Tunnel;
        self.ensure_energy(player, gate)?;
        if !board.contains(from) || board.stone(from) != Some(player) {
            return Err(GameError::InvalidGateTarget {
                gate,
                index: from,
                reason: "source must hold your stone",
            });
        }
        if !board.contains(to) || !board.cell(to).is_vacant() {
            return Err(GameError::InvalidGateTarget {
                gate,
                index: to,
                reason: "destination must be empty",
            });
        }

        let probability = (-board.distance(from, to) / TUNNEL_LENGTH).exp();
        let moved = rng.f64() < probability;
        if moved {
            board.relocate(from, to);
        }
        self.spend(player, gate);
        debug!(from, to, probability, moved, "tunnel");
        Ok(TunnelOutcome { moved, probability })
    }

    /// Move an entangled cell's full contents to an empty point.
    pub fn teleport(&mut self, board: &mut Board, player: Color, from: Point, to: Point) -> Result<()> {
        let gate = Gate::Teleport;
        self.ensure_energy(player, gate)?;
        if !board.contains(from) || !board.cell(from).is_entangled() {
            return Err(GameError::InvalidGateTarget {
                gate,
                index: from,
                reason: "source is not entangled",
            });
        }
        if !board.contains(to) || !board.cell(to).is_vacant() {
            return Err(GameError::InvalidGateTarget {
                gate,
                index: to,
                reason: "destination must be empty",
            });
        }
        board.relocate(from, to);
        self.spend(player, gate);
        debug!(from, to, "teleport");
        Ok(())
    }

    /// Jointly measure an entangled pair.
    ///
    /// Half the time both cells take the same random colour, otherwise they
    /// take opposite colours. The pair is dissolved.
    pub fn bell_measure(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        player: Color,
        a: Point,
        b: Point,
        turn: u32,
    ) -> Result<BellOutcome> {
        self.ensure_energy(player, Gate::Bell)?;
        let paired = board.contains(a)
            && board.contains(b)
            && board.cell(a).entangled_with == Some(b)
            && board.cell(b).entangled_with == Some(a);
        if !paired {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "not an entangled pair",
            });
        }

        let same = rng.bool();
        let first = if rng.bool() { Color::Black } else { Color::White };
        let second = if same { first } else { first.opponent() };

        let timestamp_ms = now_ms();
        for (pt, color) in [(a, first), (b, second)] {
            self.measurement_log.push(MeasurementRecord {
                index: pt,
                prior_probability: board.cell(pt).probability,
                collapsed_to: Some(color),
                turn,
                timestamp_ms,
            });
        }

        board.unlink(a);
        board.recolor(a, first);
        board.recolor(b, second);
        self.spend(player, Gate::Bell);
        debug!(a, b, same, "bell measurement");
        Ok(BellOutcome {
            same,
            colors: (first, second),
        })
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// One decoherence tick over the whole board.
    ///
    /// Each superposed probability drifts away from 0.5 by the decoherence
    /// rate, bounded to `[0.01, 0.99]`, and its countdown decrements. Cells
    /// whose countdown reaches zero are measured. Returns the forced
    /// measurements as `(point, outcome)`.
    ///
    /// A cell whose measurement fails is logged and left superposed with a
    /// zero countdown; the rest of the board still ticks.
    pub fn decohere(
        &mut self,
        board: &mut Board,
        rng: &mut Rng,
        turn: u32,
    ) -> Vec<(Point, Option<Color>)> {
        let rate = self.decoherence_rate;
        let mut forced = Vec::new();
        for pt in board.points() {
            let cell = board.cell(pt);
            if !cell.superposition {
                continue;
            }
            let probability = drift(cell.probability, rate);
            let countdown = cell.decoherence_countdown.saturating_sub(1);
            board.set_probability(pt, probability);
            board.set_countdown(pt, countdown);
            if countdown == 0 {
                match self.collapse(board, rng, pt, turn) {
                    Ok(outcome) => forced.push((pt, outcome)),
                    Err(e) => warn!(point = pt, "forced measurement skipped: {e}"),
                }
            }
        }
        forced
    }
}

/// Move a probability one decoherence step away from 0.5, never backwards.
pub fn drift(p: f64, rate: f64) -> f64 {
    if p > 0.5 {
        p.max((p + rate).min(DECOHERENCE_CEIL))
    } else {
        p.min((p - rate).max(DECOHERENCE_FLOOR))
    }
}

fn superposed_cell(board: &Board, gate: Gate, pt: Point) -> Result<Cell> {
    match board.get(pt) {
        Some(cell) if cell.superposition => Ok(cell.clone()),
        _ => Err(GameError::InvalidGateTarget {
            gate,
            index: pt,
            reason: "cell is not in superposition",
        }),
    }
}
