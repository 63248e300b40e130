//! Board model: an index-addressed arena of cells.
//!
//! Cells are stored row-major, index 0 at the top-left corner. Besides the
//! committed (classical) stone each cell carries a quantum overlay: an
//! optional superposed stone with its collapse probability, a decoherence
//! countdown, and an entanglement back-reference to exactly one partner cell.
//!
//! The entanglement relation is symmetric. [`Board::link`] and
//! [`Board::unlink`] are the only functions that write `entangled_with`, so
//! the two sides of a pair are always created and destroyed together.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// A point on the board, as a row-major index.
pub type Point = usize;

/// Stone colour, also used to name the players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other player.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Index into per-player arrays (`[black, white]`).
    #[inline]
    pub fn idx(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// One board position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Committed stone, `None` for an empty point.
    #[serde(rename = "classicalState")]
    pub classical: Option<Color>,
    /// Holds an uncollapsed quantum stone. Implies `classical == None`.
    pub superposition: bool,
    /// Chance that measurement turns the superposed stone into `pending_color`.
    pub probability: f64,
    /// Colour the superposed stone becomes on a successful collapse.
    pub pending_color: Option<Color>,
    /// Partner cell of an entangled pair.
    pub entangled_with: Option<Point>,
    /// Ticks left before the superposition is measured by force.
    pub decoherence_countdown: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cell {
    /// An empty point with no quantum state.
    pub const fn empty() -> Self {
        Cell {
            classical: None,
            superposition: false,
            probability: 0.0,
            pending_color: None,
            entangled_with: None,
            decoherence_countdown: 0,
        }
    }

    /// A committed stone.
    pub const fn stone(color: Color) -> Self {
        Cell {
            classical: Some(color),
            superposition: false,
            probability: 1.0,
            pending_color: None,
            entangled_with: None,
            decoherence_countdown: 0,
        }
    }

    /// Classically empty and not holding a superposed stone.
    #[inline]
    pub fn is_vacant(&self) -> bool {
        self.classical.is_none() && !self.superposition
    }

    #[inline]
    pub fn is_entangled(&self) -> bool {
        self.entangled_with.is_some()
    }
}

/// An NxN grid of cells. The shape is fixed for the lifetime of a game.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::empty(); size * size],
        }
    }

    /// Rebuild a board from a cell sequence, checking its shape and the
    /// entanglement symmetry invariant.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != size * size {
            return Err(GameError::CorruptSaveData(format!(
                "expected {} cells for a {size}x{size} board, found {}",
                size * size,
                cells.len()
            )));
        }
        let board = Self { size, cells };
        for (i, cell) in board.cells.iter().enumerate() {
            if cell.superposition && cell.classical.is_some() {
                return Err(GameError::CorruptSaveData(format!(
                    "cell {i} is both superposed and occupied"
                )));
            }
            if !(0.0..=1.0).contains(&cell.probability) {
                return Err(GameError::CorruptSaveData(format!(
                    "cell {i} has probability {} outside [0, 1]",
                    cell.probability
                )));
            }
            if let Some(p) = cell.entangled_with {
                let back = board.cells.get(p).and_then(|c| c.entangled_with);
                if p == i || back != Some(i) {
                    return Err(GameError::CorruptSaveData(format!(
                        "cell {i} is entangled with {p} which does not point back"
                    )));
                }
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells (N²).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn contains(&self, pt: Point) -> bool {
        pt < self.cells.len()
    }

    /// Cell lookup; `None` off the board.
    #[inline]
    pub fn get(&self, pt: Point) -> Option<&Cell> {
        self.cells.get(pt)
    }

    /// Cell lookup for a point already known to be on the board.
    #[inline]
    pub fn cell(&self, pt: Point) -> &Cell {
        &self.cells[pt]
    }

    /// Committed stone at a point (`None` for empty or off-board).
    #[inline]
    pub fn stone(&self, pt: Point) -> Option<Color> {
        self.cells.get(pt).and_then(|c| c.classical)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn points(&self) -> std::ops::Range<Point> {
        0..self.cells.len()
    }

    #[inline]
    pub fn row_col(&self, pt: Point) -> (usize, usize) {
        (pt / self.size, pt % self.size)
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> Point {
        row * self.size + col
    }

    /// Euclidean grid distance between two points.
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        let (r1, c1) = self.row_col(a);
        let (r2, c2) = self.row_col(b);
        let dr = r1 as f64 - r2 as f64;
        let dc = c1 as f64 - c2 as f64;
        (dr * dr + dc * dc).sqrt()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Commit a stone, replacing whatever quantum state the cell held.
    pub fn place(&mut self, pt: Point, color: Color) {
        self.unlink(pt);
        self.cells[pt] = Cell::stone(color);
    }

    /// Reset a point to an empty cell, dissolving any entanglement.
    pub fn clear(&mut self, pt: Point) {
        self.unlink(pt);
        self.cells[pt] = Cell::empty();
    }

    /// Turn a point into a superposed stone of `color`.
    pub fn superpose(&mut self, pt: Point, color: Color, probability: f64, countdown: u32) {
        self.unlink(pt);
        self.cells[pt] = Cell {
            classical: None,
            superposition: true,
            probability: probability.clamp(0.0, 1.0),
            pending_color: Some(color),
            entangled_with: None,
            decoherence_countdown: countdown,
        };
    }

    /// Overwrite the colour of a committed stone, keeping its quantum links.
    pub fn recolor(&mut self, pt: Point, color: Color) {
        let cell = &mut self.cells[pt];
        cell.classical = Some(color);
        cell.superposition = false;
        cell.pending_color = None;
        cell.probability = 1.0;
        cell.decoherence_countdown = 0;
    }

    pub fn set_probability(&mut self, pt: Point, probability: f64) {
        self.cells[pt].probability = probability.clamp(0.0, 1.0);
    }

    pub fn set_countdown(&mut self, pt: Point, countdown: u32) {
        self.cells[pt].decoherence_countdown = countdown;
    }

    /// Move the full contents of `from` to `to`, leaving `from` empty.
    ///
    /// Any entanglement of the moved cell is dissolved on both sides first.
    pub fn relocate(&mut self, from: Point, to: Point) {
        self.unlink(from);
        self.unlink(to);
        let moved = std::mem::take(&mut self.cells[from]);
        self.cells[to] = moved;
    }

    // -------------------------------------------------------------------------
    // Entanglement
    // -------------------------------------------------------------------------

    /// Entangle two distinct, currently unlinked cells.
    pub fn link(&mut self, a: Point, b: Point) -> Result<()> {
        if !self.contains(a) || !self.contains(b) {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "off the board",
            });
        }
        if a == b {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "a cell cannot be entangled with itself",
            });
        }
        if self.cells[a].is_entangled() || self.cells[b].is_entangled() {
            return Err(GameError::InvalidEntanglementTarget {
                a,
                b,
                reason: "already entangled",
            });
        }
        self.cells[a].entangled_with = Some(b);
        self.cells[b].entangled_with = Some(a);
        Ok(())
    }

    /// Dissolve the pair containing `pt`. Returns the former partner.
    pub fn unlink(&mut self, pt: Point) -> Option<Point> {
        let partner = self.cells.get_mut(pt)?.entangled_with.take()?;
        if let Some(other) = self.cells.get_mut(partner) {
            if other.entangled_with == Some(pt) {
                other.entangled_with = None;
            }
        }
        Some(partner)
    }

    /// Point `a` at `b` without the reverse link.
    #[cfg(test)]
    pub(crate) fn link_one_side(&mut self, a: Point, b: Point) {
        self.cells[a].entangled_with = Some(b);
    }

    /// Partner of `pt`, checking that the link is symmetric.
    pub fn partner(&self, pt: Point) -> Result<Option<Point>> {
        let Some(partner) = self.cells[pt].entangled_with else {
            return Ok(None);
        };
        match self.cells.get(partner) {
            Some(other) if other.entangled_with == Some(pt) => Ok(Some(partner)),
            _ => Err(GameError::BrokenEntanglement { index: pt, partner }),
        }
    }

    // -------------------------------------------------------------------------
    // Counting
    // -------------------------------------------------------------------------

    pub fn count_stones(&self, color: Color) -> usize {
        self.cells
            .iter()
            .filter(|c| c.classical == Some(color))
            .count()
    }

    pub fn count_superpositions(&self) -> usize {
        self.cells.iter().filter(|c| c.superposition).count()
    }

    /// Number of entangled pairs (each pair counted once).
    pub fn count_entanglements(&self) -> usize {
        self.cells
            .iter()
            .enumerate()
            .filter(|(i, c)| matches!(c.entangled_with, Some(p) if p > *i))
            .count()
    }
}

// =============================================================================
// Coordinates
// =============================================================================

/// Parse a Go coordinate (e.g. "D4") into a point on a `size`x`size` board.
///
/// Columns use letters A-T skipping I, rows count up from the bottom edge.
/// Returns `None` for anything that is not a vertex on the board.
pub fn parse_coord(s: &str, size: usize) -> Option<Point> {
    let bytes = s.trim().as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let col_char = bytes[0].to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() || col_char == b'I' {
        return None;
    }
    let mut col = (col_char - b'A') as usize;
    if col_char > b'I' {
        col -= 1;
    }

    let row: usize = std::str::from_utf8(&bytes[1..]).ok()?.parse().ok()?;
    if col >= size || row == 0 || row > size {
        return None;
    }
    Some((size - row) * size + col)
}

/// Convert a point to a Go coordinate string (e.g. "D4").
pub fn str_coord(pt: Point, size: usize) -> String {
    let row = pt / size;
    let col = pt % size;

    let mut c = b'A' + col as u8;
    if c >= b'I' {
        c += 1;
    }

    format!("{}{}", c as char, size - row)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.size {
            let label = str_coord(col, self.size);
            write!(f, "{} ", &label[..1])?;
        }
        writeln!(f)?;
        for row in 0..self.size {
            write!(f, "{:>2} ", self.size - row)?;
            for col in 0..self.size {
                let cell = &self.cells[self.index(row, col)];
                let ch = match (cell.classical, cell.superposition, cell.pending_color) {
                    (Some(Color::Black), ..) => 'X',
                    (Some(Color::White), ..) => 'O',
                    (None, true, Some(Color::Black)) => 'x',
                    (None, true, Some(Color::White)) => 'o',
                    _ => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
