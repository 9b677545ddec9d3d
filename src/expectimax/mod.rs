//! Expectimax move advisor (single-threaded and parallel).
//!
//! This module ranks the four directions by expected long-term board
//! quality: decision nodes pick the best shift, chance nodes average over
//! every possible tile spawn (2 at 90%, 4 at 10%, uniformly over empty
//! cells). Leaves are scored by the four-term heuristic in [`heuristic`].
//!
//! Two policy implementations share the same surface and defaults:
//! - [`Expectimax`]: single-threaded search.
//! - [`ExpectimaxParallel`]: rayon fan-out of the four root branches with a
//!   shared transposition table; produces the same expected values bit for
//!   bit.
//!
//! The search itself is deterministic; randomness enters only through the
//! RNG handed to `best_move`, and only when the search comes back without a
//! direction and a fallback must be drawn from the valid moves.
//!
//! Quick start
//! ```
//! use advisor_2048::engine::Board;
//! use advisor_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let board = Board::EMPTY
//!     .with_random_tile(&mut rng)
//!     .with_random_tile(&mut rng);
//!
//! let mut advisor = Expectimax::new();
//! assert!(advisor.best_move(board, &mut rng).is_some());
//! ```

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Board, Move};

mod heuristic;
mod search_seq;
#[cfg(feature = "rayon")]
mod search_par;

pub use search_seq::Expectimax;
#[cfg(feature = "rayon")]
pub use search_par::ExpectimaxParallel;

/// The two spawn outcomes a chance node branches over, per empty cell.
pub(crate) const SPAWNS: [(u64, f64); 2] = [(2, 0.9), (4, 0.1)];

/// Configurable knobs for the search.
///
/// - `depth`: remaining plies at the root; the default of 3 gives one full
///   move plus a look-ahead ply.
/// - `cache_enabled`: reuse chance-node values within a single evaluation.
///   Entries are keyed by board and exact remaining depth, so cached runs
///   return the same values as the plain recursion.
#[derive(Debug, Clone)]
pub struct ExpectimaxConfig {
    pub depth: u64,
    pub cache_enabled: bool,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth: 3, cache_enabled: true }
    }
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// Internal result of one recursion step: the node's score, plus the chosen
/// direction when the node was a decision node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchResult {
    pub(crate) score: f64,
    pub(crate) move_dir: Option<Move>,
}

/// Uniform random pick among the currently valid directions.
///
/// Guards the rare case where a depth-limited search returns no direction
/// even though legal moves remain; `None` means the game truly has no move.
pub(crate) fn fallback_move<R: Rng + ?Sized>(board: Board, rng: &mut R) -> Option<Move> {
    board.valid_moves().choose(rng).copied()
}

/// Pick the best legal branch, first direction winning ties.
pub(crate) fn best_branch(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<(Move, f64)> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |(_, ev)| branch.ev > ev) {
            best = Some((branch.dir, branch.ev));
        }
    }
    best.map(|(dir, _)| dir)
}

/// Bench-only: expose the raw heuristic value for a board.
///
/// Enabled only with the `bench-internal` feature to keep the public API
/// small.
#[cfg(feature = "bench-internal")]
#[inline]
pub fn heuristic_value(board: Board) -> f64 {
    heuristic::evaluate(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fallback_is_deterministic_for_a_seed() {
        let board = Board::from_cells([
            [0, 2, 4, 8],
            [0; 4],
            [0; 4],
            [0; 4],
        ]);
        let a = fallback_move(board, &mut StdRng::seed_from_u64(5));
        let b = fallback_move(board, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
        assert!(board.valid_moves().contains(&a.unwrap()));
    }

    #[test]
    fn fallback_on_dead_board_is_none() {
        let dead = Board::from_cells([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ]);
        assert_eq!(fallback_move(dead, &mut StdRng::seed_from_u64(5)), None);
    }

    #[test]
    fn best_branch_prefers_first_on_ties() {
        let branches = [
            BranchEval { dir: Move::Up, ev: 1.0, legal: true },
            BranchEval { dir: Move::Down, ev: 1.0, legal: true },
            BranchEval { dir: Move::Left, ev: 0.5, legal: true },
            BranchEval { dir: Move::Right, ev: 2.0, legal: false },
        ];
        assert_eq!(best_branch(&branches), Some(Move::Up));
    }
}
