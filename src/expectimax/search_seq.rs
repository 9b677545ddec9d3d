use std::collections::HashMap;

use rand::Rng;

use crate::engine::{Board, Move};

use super::heuristic::evaluate;
use super::{fallback_move, ExpectimaxConfig, BranchEval, SearchResult, SPAWNS, SearchStats};

enum Node {
    Max,
    Chance,
}

type Cache = HashMap<(Board, u64), f64>;

/// Single-threaded expectimax advisor.
///
/// Stateless between calls apart from accumulated [`SearchStats`]; every
/// evaluation walks the tree fresh with its own transposition cache.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self {
        Self::with_config(ExpectimaxConfig::default())
    }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    /// Recommend a direction for `board`, or `None` when no move is legal.
    ///
    /// The search is deterministic; `rng` is consulted only when it ends
    /// without a direction and a uniform pick among the valid moves is
    /// needed instead.
    ///
    /// ```
    /// use advisor_2048::engine::Board;
    /// use advisor_2048::expectimax::Expectimax;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// let mut advisor = Expectimax::new();
    /// assert!(advisor.best_move(board, &mut rng).is_some());
    /// ```
    pub fn best_move<R: Rng + ?Sized>(&mut self, board: Board, rng: &mut R) -> Option<Move> {
        let mut cache = Cache::new();
        let mut nodes = 0u64;
        let result = self.expectimax(board, Node::Max, self.cfg.depth, &mut cache, &mut nodes);
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        match result.move_dir {
            Some(direction) => Some(direction),
            None => fallback_move(board, rng),
        }
    }

    /// Convenience: like `best_move` but uses thread-local RNG.
    pub fn best_move_thread(&mut self, board: Board) -> Option<Move> {
        let mut rng = rand::thread_rng();
        self.best_move(board, &mut rng)
    }

    /// Compute the expected value of each direction at the root.
    ///
    /// Returns a fixed array in order `[Up, Down, Left, Right]`, with
    /// illegal moves marked `legal = false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let mut cache = Cache::new();
        let mut nodes = 0u64;
        let depth = self.cfg.depth.saturating_sub(1);
        let mut out = Move::ALL.map(|dir| BranchEval { dir, ev: 0.0, legal: false });
        for (slot, &dir) in Move::ALL.iter().enumerate() {
            let shifted = board.shift(dir);
            if !shifted.changed {
                continue;
            }
            let ev = self
                .expectimax(shifted.board, Node::Chance, depth, &mut cache, &mut nodes)
                .score;
            out[slot] = BranchEval { dir, ev, legal: true };
        }
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        out
    }

    /// Expected value at the root decision node (the best branch EV, or the
    /// board's own heuristic score when nothing is legal).
    pub fn state_value(&mut self, board: Board) -> f64 {
        let mut cache = Cache::new();
        let mut nodes = 0u64;
        let result = self.expectimax(board, Node::Max, self.cfg.depth, &mut cache, &mut nodes);
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        result.score
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
        cache: &mut Cache,
        nodes: &mut u64,
    ) -> SearchResult {
        *nodes += 1;
        match node {
            Node::Max => self.evaluate_max(board, depth, cache, nodes),
            Node::Chance => self.evaluate_chance(board, depth, cache, nodes),
        }
    }

    fn evaluate_max(
        &self,
        board: Board,
        depth: u64,
        cache: &mut Cache,
        nodes: &mut u64,
    ) -> SearchResult {
        if depth == 0 {
            return SearchResult { score: evaluate(board), move_dir: None };
        }
        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = None;
        for &direction in Move::ALL.iter() {
            let shifted = board.shift(direction);
            if !shifted.changed {
                continue;
            }
            let score = self
                .expectimax(shifted.board, Node::Chance, depth - 1, cache, nodes)
                .score;
            if score > best_score {
                best_score = score;
                best_move = Some(direction);
            }
        }
        if best_move.is_none() {
            // No direction is legal: a terminal decision node.
            return SearchResult { score: evaluate(board), move_dir: None };
        }
        SearchResult { score: best_score, move_dir: best_move }
    }

    fn evaluate_chance(
        &self,
        board: Board,
        depth: u64,
        cache: &mut Cache,
        nodes: &mut u64,
    ) -> SearchResult {
        if depth == 0 {
            return SearchResult { score: evaluate(board), move_dir: None };
        }
        if self.cfg.cache_enabled {
            if let Some(&score) = cache.get(&(board, depth)) {
                return SearchResult { score, move_dir: None };
            }
        }
        let empty = board.empty_cells();
        if empty.is_empty() {
            // Nothing can spawn: forced terminal.
            return SearchResult { score: evaluate(board), move_dir: None };
        }
        // Every (cell, value) branch is enumerated, so the raw weighted sum
        // is the node's expected score; no renormalization.
        let mut score = 0.0;
        for &idx in &empty {
            for (value, prob) in SPAWNS {
                let child = board.with_tile(idx, value);
                score += prob * self.expectimax(child, Node::Max, depth - 1, cache, nodes).score;
            }
        }
        if self.cfg.cache_enabled {
            cache.insert((board, depth), score);
        }
        SearchResult { score, move_dir: None }
    }
}

impl Default for Expectimax {
    fn default() -> Self {
        Self::new()
    }
}
