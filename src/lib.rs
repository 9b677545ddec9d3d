//! advisor-2048: a 2048 move engine + expectimax advisor
//!
//! This crate provides:
//! - A compact [`engine::Board`] value type with ergonomic methods
//!   (`shift`, `make_move`, `valid_moves`, ...)
//! - An expectimax advisor (`expectimax` module) with single-threaded and
//!   parallel variants, returning the direction with the best expected
//!   outcome or `None` when the board has no legal move
//!
//! Board acquisition (screen capture, manual editing) and move execution
//! (key injection, UI updates) live with the caller; the crate consumes an
//! already-parsed 4x4 matrix and hands back a direction.
//!
//! Quick start:
//! ```
//! use advisor_2048::engine::{Board, Move};
//! use advisor_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//!
//! let mut advisor = Expectimax::new();
//! let direction = advisor.best_move(board, &mut rng);
//! assert!(direction.is_some());
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use advisor_2048::engine::Board;
//! use advisor_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut advisor = Expectimax::new();
//! let mut rng = StdRng::seed_from_u64(123);
//!
//! // Start with two random tiles, then follow the advisor for a few moves
//! // (kept short to keep doctests fast).
//! let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let mut moves = 0u32;
//! while moves < 4 {
//!     match advisor.best_move(board, &mut rng) {
//!         Some(direction) => {
//!             board = board.make_move(direction, &mut rng);
//!             moves += 1;
//!         }
//!         None => break,
//!     }
//! }
//! assert!(moves > 0);
//! ```
pub mod engine;
pub mod expectimax;
