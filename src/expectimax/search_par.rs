use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState as AHasher;
use dashmap::DashMap;
use rand::Rng;
use rayon::prelude::*;

use crate::engine::{Board, Move};

use super::heuristic::evaluate;
use super::{best_branch, fallback_move, BranchEval, ExpectimaxConfig, SPAWNS, SearchStats};

type SharedCache = DashMap<(Board, u64), f64, AHasher>;

enum Node {
    Max,
    Chance,
}

/// Expectimax advisor that fans the four root branches out across rayon
/// workers, sharing one transposition table.
///
/// Subtree values are a deterministic function of (board, depth), and each
/// branch sums its chance children in the same fixed order as the
/// single-threaded walk, so expected values match [`Expectimax`] bit for
/// bit regardless of scheduling.
///
/// [`Expectimax`]: super::Expectimax
pub struct ExpectimaxParallel {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self {
        Self::with_config(ExpectimaxConfig::default())
    }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    /// Recommend a direction for `board`, or `None` when no move is legal.
    ///
    /// As with the sequential advisor, `rng` only backs the uniform
    /// fallback pick when the search is inconclusive.
    pub fn best_move<R: Rng + ?Sized>(&mut self, board: Board, rng: &mut R) -> Option<Move> {
        let branches = self.branch_evals(board);
        match best_branch(&branches) {
            Some(direction) => Some(direction),
            None => fallback_move(board, rng),
        }
    }

    /// Convenience: like `best_move` but uses thread-local RNG.
    pub fn best_move_thread(&mut self, board: Board) -> Option<Move> {
        let mut rng = rand::thread_rng();
        self.best_move(board, &mut rng)
    }

    /// Compute the expected value of each direction at the root, one rayon
    /// task per direction.
    ///
    /// Returns a fixed array in order `[Up, Down, Left, Right]`, with
    /// illegal moves marked `legal = false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = self.cfg.depth.saturating_sub(1);
        let cache: SharedCache = DashMap::with_hasher(AHasher::new());
        let nodes = AtomicU64::new(0);
        let evals: Vec<(usize, BranchEval)> = Move::ALL
            .par_iter()
            .enumerate()
            .map(|(slot, &dir)| {
                let shifted = board.shift(dir);
                let branch = if shifted.changed {
                    let ev = self.expectimax(shifted.board, Node::Chance, depth, &cache, &nodes);
                    BranchEval { dir, ev, legal: true }
                } else {
                    BranchEval { dir, ev: 0.0, legal: false }
                };
                (slot, branch)
            })
            .collect();
        let mut out = Move::ALL.map(|dir| BranchEval { dir, ev: 0.0, legal: false });
        for (slot, branch) in evals {
            out[slot] = branch;
        }
        let visited = nodes.load(Ordering::Relaxed);
        self.stats.nodes = visited;
        self.stats.peak_nodes = self.stats.peak_nodes.max(visited);
        out
    }

    /// Expected value at the root decision node (the best branch EV, or the
    /// board's own heuristic score when nothing is legal).
    pub fn state_value(&mut self, board: Board) -> f64 {
        let branches = self.branch_evals(board);
        let best = branches
            .iter()
            .filter(|branch| branch.legal)
            .map(|branch| branch.ev)
            .fold(f64::NEG_INFINITY, f64::max);
        if best.is_finite() { best } else { evaluate(board) }
    }

    /// Statistics from the last call to [`best_move`](Self::best_move),
    /// [`branch_evals`](Self::branch_evals) or
    /// [`state_value`](Self::state_value).
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    fn expectimax(
        &self,
        board: Board,
        node: Node,
        depth: u64,
        cache: &SharedCache,
        nodes: &AtomicU64,
    ) -> f64 {
        nodes.fetch_add(1, Ordering::Relaxed);
        match node {
            Node::Max => self.evaluate_max(board, depth, cache, nodes),
            Node::Chance => self.evaluate_chance(board, depth, cache, nodes),
        }
    }

    fn evaluate_max(&self, board: Board, depth: u64, cache: &SharedCache, nodes: &AtomicU64) -> f64 {
        if depth == 0 {
            return evaluate(board);
        }
        let mut best_score = f64::NEG_INFINITY;
        for &direction in Move::ALL.iter() {
            let shifted = board.shift(direction);
            if !shifted.changed {
                continue;
            }
            let score = self.expectimax(shifted.board, Node::Chance, depth - 1, cache, nodes);
            if score > best_score {
                best_score = score;
            }
        }
        if best_score.is_finite() { best_score } else { evaluate(board) }
    }

    fn evaluate_chance(
        &self,
        board: Board,
        depth: u64,
        cache: &SharedCache,
        nodes: &AtomicU64,
    ) -> f64 {
        if depth == 0 {
            return evaluate(board);
        }
        if self.cfg.cache_enabled {
            if let Some(entry) = cache.get(&(board, depth)) {
                return *entry;
            }
        }
        let empty = board.empty_cells();
        if empty.is_empty() {
            return evaluate(board);
        }
        let mut score = 0.0;
        for &idx in &empty {
            for (value, prob) in SPAWNS {
                let child = board.with_tile(idx, value);
                score += prob * self.expectimax(child, Node::Max, depth - 1, cache, nodes);
            }
        }
        if self.cfg.cache_enabled {
            cache.insert((board, depth), score);
        }
        score
    }
}

impl Default for ExpectimaxParallel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::Expectimax;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn walked_board(seed: u64, steps: usize) -> Board {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
        let order = Move::ALL;
        for i in 0..steps {
            let shifted = board.shift(order[i % order.len()]);
            if shifted.changed {
                board = shifted.board.with_random_tile(&mut rng);
            }
        }
        board
    }

    #[test]
    fn parallel_matches_sequential_branch_evals() {
        for seed in [1u64, 2, 3] {
            let board = walked_board(seed, 12);
            let mut seq = Expectimax::new();
            let mut par = ExpectimaxParallel::new();
            let a = seq.branch_evals(board);
            let b = par.branch_evals(board);
            for (x, y) in a.iter().zip(b.iter()) {
                assert_eq!(x.dir, y.dir);
                assert_eq!(x.legal, y.legal);
                assert_eq!(x.ev.to_bits(), y.ev.to_bits());
            }
        }
    }

    #[test]
    fn parallel_matches_sequential_state_value() {
        let board = walked_board(9, 16);
        let mut seq = Expectimax::new();
        let mut par = ExpectimaxParallel::new();
        assert_eq!(seq.state_value(board).to_bits(), par.state_value(board).to_bits());
    }

    #[test]
    fn parallel_dead_board_reports_no_move() {
        let dead = Board::from_cells([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ]);
        let mut par = ExpectimaxParallel::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(par.best_move(dead, &mut rng), None);
    }
}
