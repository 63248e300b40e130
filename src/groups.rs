//! Connectivity analysis: neighbours, chains, liberties and territory.
//!
//! All queries are read-only and take the board by reference, so they work the
//! same on the live board and on a private copy used for legality simulation.
//! Flood fills use an explicit stack and a visited array instead of
//! recursion, which keeps stack depth independent of board size.
//!
//! Only the classical layer takes part in connectivity: a superposed cell is
//! an empty point here.

use crate::board::{Board, Color, Point};

/// Orthogonal neighbours of a point (2 to 4 of them, no wraparound).
pub fn adjacent(board: &Board, pt: Point) -> impl Iterator<Item = Point> {
    let size = board.size();
    let (row, col) = board.row_col(pt);
    [
        (row > 0).then(|| pt - size),
        (row + 1 < size).then(|| pt + size),
        (col > 0).then(|| pt - 1),
        (col + 1 < size).then(|| pt + 1),
    ]
    .into_iter()
    .flatten()
}

/// Collect the chain of same-coloured stones containing `start`.
///
/// Returns an empty chain when `start` holds no classical stone. The start
/// point is always the first element and no point appears twice.
pub fn group(board: &Board, start: Point) -> Vec<Point> {
    let Some(color) = board.stone(start) else {
        return Vec::new();
    };
    let mut visited = vec![false; board.len()];
    let mut stack = vec![start];
    let mut chain = Vec::new();
    visited[start] = true;

    while let Some(pt) = stack.pop() {
        chain.push(pt);
        for n in adjacent(board, pt) {
            if !visited[n] && board.stone(n) == Some(color) {
                visited[n] = true;
                stack.push(n);
            }
        }
    }
    chain
}

/// Empty points adjacent to any stone of the chain, without duplicates.
pub fn liberties(board: &Board, chain: &[Point]) -> Vec<Point> {
    let mut seen = vec![false; board.len()];
    let mut libs = Vec::new();
    for &pt in chain {
        for n in adjacent(board, pt) {
            if !seen[n] && board.stone(n).is_none() {
                seen[n] = true;
                libs.push(n);
            }
        }
    }
    libs
}

/// Count liberties of the chain containing `pt` (0 for an empty point).
pub fn group_liberties(board: &Board, pt: Point) -> usize {
    liberties(board, &group(board, pt)).len()
}

/// A chain with no liberties is captured.
#[inline]
pub fn is_captured(board: &Board, chain: &[Point]) -> bool {
    !chain.is_empty() && liberties(board, chain).is_empty()
}

/// Flood-fill the empty region containing `start` and report who owns it.
///
/// Marks the region in `visited` and appends its points to `region`. The owner
/// is the single colour bordering the region; a region touching both colours
/// or none belongs to nobody.
pub fn empty_region_owner(
    board: &Board,
    start: Point,
    visited: &mut [bool],
    region: &mut Vec<Point>,
) -> Option<Color> {
    let mut touches_black = false;
    let mut touches_white = false;
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(pt) = stack.pop() {
        region.push(pt);
        for n in adjacent(board, pt) {
            match board.stone(n) {
                Some(Color::Black) => touches_black = true,
                Some(Color::White) => touches_white = true,
                None if !visited[n] => {
                    visited[n] = true;
                    stack.push(n);
                }
                None => {}
            }
        }
    }

    match (touches_black, touches_white) {
        (true, false) => Some(Color::Black),
        (false, true) => Some(Color::White),
        _ => None,
    }
}

/// Number of empty points enclosed solely by `color`.
pub fn territory(board: &Board, color: Color) -> usize {
    let mut visited = vec![false; board.len()];
    let mut total = 0;
    for pt in board.points() {
        if visited[pt] || board.stone(pt).is_some() {
            continue;
        }
        let mut region = Vec::new();
        if empty_region_owner(board, pt, &mut visited, &mut region) == Some(color) {
            total += region.len();
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<Point>) -> Vec<Point> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_adjacent_corner_edge_center() {
        let board = Board::new(9);
        assert_eq!(sorted(adjacent(&board, 0).collect()), vec![1, 9]);
        assert_eq!(sorted(adjacent(&board, 8).collect()), vec![7, 17]);
        assert_eq!(sorted(adjacent(&board, 4).collect()), vec![3, 5, 13]);
        assert_eq!(sorted(adjacent(&board, 40).collect()), vec![31, 39, 41, 49]);
        assert_eq!(sorted(adjacent(&board, 80).collect()), vec![71, 79]);
    }

    #[test]
    fn test_adjacent_no_row_wrap() {
        let board = Board::new(9);
        // Index 9 starts row 1; index 8 ends row 0 and must not be a neighbour.
        assert!(!adjacent(&board, 9).any(|n| n == 8));
        assert!(!adjacent(&board, 17).any(|n| n == 18));
    }

    #[test]
    fn test_group_on_a_ring() {
        // A closed ring of black stones must terminate and include every stone.
        let mut board = Board::new(5);
        let ring = [6, 7, 8, 11, 13, 16, 17, 18];
        for &pt in &ring {
            board.place(pt, Color::Black);
        }
        let chain = group(&board, 6);
        assert_eq!(chain[0], 6);
        assert_eq!(sorted(chain), ring.to_vec());
    }

    #[test]
    fn test_group_of_empty_point() {
        let board = Board::new(9);
        assert!(group(&board, 40).is_empty());
        assert_eq!(group_liberties(&board, 40), 0);
    }

    #[test]
    fn test_single_stone_liberties() {
        let mut board = Board::new(9);
        board.place(40, Color::White);
        assert_eq!(group_liberties(&board, 40), 4);
        board.place(0, Color::White);
        assert_eq!(group_liberties(&board, 0), 2);
    }

    #[test]
    fn test_shared_liberty_counted_once() {
        let mut board = Board::new(9);
        board.place(40, Color::Black);
        board.place(42, Color::Black);
        board.place(41, Color::Black);
        // Three in a row: 2 ends + 3 above + 3 below.
        assert_eq!(group_liberties(&board, 40), 8);
    }

    #[test]
    fn test_superposed_cell_is_a_liberty() {
        let mut board = Board::new(9);
        board.place(0, Color::Black);
        board.place(1, Color::White);
        board.superpose(9, Color::White, 0.7, 5);
        assert_eq!(group_liberties(&board, 0), 1);
    }

    #[test]
    fn test_territory() {
        // Black wall on column B of a 5x5 board encloses column A.
        let mut board = Board::new(5);
        for row in 0..5 {
            board.place(row * 5 + 1, Color::Black);
        }
        assert_eq!(territory(&board, Color::Black), 5 + 15);
        board.place(4, Color::White);
        // The right-hand region now touches both colours.
        assert_eq!(territory(&board, Color::Black), 5);
        assert_eq!(territory(&board, Color::White), 0);
    }

    #[test]
    fn test_empty_board_has_no_territory() {
        let board = Board::new(9);
        assert_eq!(territory(&board, Color::Black), 0);
        assert_eq!(territory(&board, Color::White), 0);
    }
}
