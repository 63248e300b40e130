//! Go legality and capture resolution.
//!
//! [`can_place`] answers whether a classical stone may be placed, simulating
//! the placement on a private copy of the board. [`play_stone`] commits a
//! placement: it resolves captures and ko on a scratch board and swaps it in
//! only when the move is legal, so a rejected move never leaves a trace on
//! the live board.
//!
//! Captures are resolved before the suicide test. A move that captures is
//! never suicide, even if the placed chain would have no liberties had the
//! captured stones stayed on the board.

use tracing::debug;

use crate::board::{Board, Color, Point};
use crate::error::{GameError, Result};
use crate::groups::{adjacent, group, is_captured, liberties};

/// Outcome of a committed classical placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub point: Point,
    pub color: Color,
    /// Every stone removed by this move.
    pub captured: Vec<Point>,
    /// Number of distinct chains removed.
    pub groups_captured: usize,
    /// Ko point created by this move, if any.
    pub ko: Option<Point>,
}

/// Occupancy and ko checks shared by [`can_place`] and [`play_stone`].
fn check_point(board: &Board, ko: Option<Point>, pt: Point) -> Result<()> {
    let cell = board
        .get(pt)
        .ok_or(GameError::OutOfBounds { index: pt })?;
    if cell.classical.is_some() {
        return Err(GameError::OccupiedCell { index: pt });
    }
    if ko == Some(pt) {
        return Err(GameError::KoViolation { index: pt });
    }
    Ok(())
}

/// Check whether `player` may place a classical stone at `pt`.
///
/// The placement is simulated on a copy: the move is suicide when the placed
/// chain has no liberties and no adjacent opponent chain would be captured.
pub fn can_place(board: &Board, ko: Option<Point>, pt: Point, player: Color) -> Result<()> {
    check_point(board, ko, pt)?;

    let mut sim = board.clone();
    sim.place(pt, player);

    let own = group(&sim, pt);
    let would_die = liberties(&sim, &own).is_empty();
    if !would_die {
        return Ok(());
    }

    let opponent = player.opponent();
    let captures = adjacent(&sim, pt)
        .filter(|&n| sim.stone(n) == Some(opponent))
        .any(|n| is_captured(&sim, &group(&sim, n)));
    if captures {
        Ok(())
    } else {
        Err(GameError::SuicideMove { index: pt })
    }
}

/// Whether `player` has any legal classical placement.
pub fn has_legal_move(board: &Board, ko: Option<Point>, player: Color) -> bool {
    board
        .points()
        .any(|pt| board.stone(pt).is_none() && can_place(board, ko, pt, player).is_ok())
}

/// Place a stone for `player` at `pt` and resolve its consequences.
///
/// 1. Adjacent opponent chains left without liberties are removed.
/// 2. Ko is recorded when exactly one single stone was captured and the
///    placed stone is a lone stone whose only liberty is the vacated point.
/// 3. A move that captured nothing and leaves its own chain without
///    liberties is suicide and is rejected.
///
/// The live board is only replaced on success.
pub fn play_stone(board: &mut Board, ko: Option<Point>, pt: Point, player: Color) -> Result<Placement> {
    check_point(board, ko, pt)?;

    let mut scratch = board.clone();
    scratch.place(pt, player);

    let opponent = player.opponent();
    let mut processed = vec![false; scratch.len()];
    let mut dead_groups: Vec<Vec<Point>> = Vec::new();
    let neighbors: Vec<Point> = adjacent(&scratch, pt).collect();
    for n in neighbors {
        if processed[n] || scratch.stone(n) != Some(opponent) {
            continue;
        }
        let chain = group(&scratch, n);
        for &s in &chain {
            processed[s] = true;
        }
        if is_captured(&scratch, &chain) {
            dead_groups.push(chain);
        }
    }

    let captured: Vec<Point> = dead_groups.iter().flatten().copied().collect();
    for &s in &captured {
        scratch.clear(s);
    }

    if captured.is_empty() && liberties(&scratch, &group(&scratch, pt)).is_empty() {
        debug!(point = pt, %player, "suicide rejected");
        return Err(GameError::SuicideMove { index: pt });
    }

    let new_ko = match dead_groups.as_slice() {
        [single] if single.len() == 1 => {
            let vacated = single[0];
            let own = group(&scratch, pt);
            let libs = liberties(&scratch, &own);
            (own.len() == 1 && libs == [vacated]).then_some(vacated)
        }
        _ => None,
    };

    debug!(
        point = pt,
        %player,
        captured = captured.len(),
        ko = ?new_ko,
        "stone placed"
    );

    *board = scratch;
    Ok(Placement {
        point: pt,
        color: player,
        groups_captured: dead_groups.len(),
        captured,
        ko: new_ko,
    })
}
