use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All directions, in the fixed order the search enumerates them.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        };
        f.write_str(name)
    }
}

/// Rejected input at the board-construction boundary.
///
/// The engine never coerces or clamps malformed matrices; anything that is
/// not a 4x4 grid of non-negative integers is refused here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidBoardError {
    #[error("expected 4 rows, got {0}")]
    WrongRowCount(usize),
    #[error("row {row} has {len} cells, expected 4")]
    WrongRowLength { row: usize, len: usize },
    #[error("negative tile {value} at ({row}, {col})")]
    NegativeTile { row: usize, col: usize, value: i64 },
}

/// Outcome of sliding a board: the resulting board plus whether any tile
/// moved or merged. A direction is legal for a board iff `changed` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    pub changed: bool,
}

/// A 4x4 merge-puzzle board, stored row-major as 16 tile values.
///
/// Tiles hold their face value (2, 4, 8, ...); 0 is an empty cell. The
/// engine only compares tiles for equality and doubles them on merge, so
/// values need not be powers of two. Merges double without bound; boards
/// approaching `u64::MAX` tiles are the caller's overflow problem.
///
/// Boards are immutable values: every operation returns a new `Board`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board([u64; 16]);

impl Board {
    /// Rows/columns per side.
    pub const SIZE: usize = 4;
    /// Total cell count.
    pub const CELLS: usize = 16;

    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([0; 16]);

    /// Construct a `Board` from four rows of four tile values.
    #[inline]
    pub fn from_cells(rows: [[u64; 4]; 4]) -> Self {
        let mut cells = [0u64; Self::CELLS];
        for (r, row) in rows.iter().enumerate() {
            cells[r * Self::SIZE..(r + 1) * Self::SIZE].copy_from_slice(row);
        }
        Board(cells)
    }

    /// Validate an externally supplied matrix (screen capture, manual edit)
    /// into a `Board`.
    ///
    /// ```
    /// use advisor_2048::engine::Board;
    /// let rows = vec![vec![0i64; 4], vec![0; 4], vec![2, 2, 0, 0], vec![0; 4]];
    /// let board = Board::try_from_rows(&rows).unwrap();
    /// assert_eq!(board.count_empty(), 14);
    /// assert!(Board::try_from_rows(&rows[..3]).is_err());
    /// ```
    pub fn try_from_rows(rows: &[Vec<i64>]) -> Result<Self, InvalidBoardError> {
        if rows.len() != Self::SIZE {
            return Err(InvalidBoardError::WrongRowCount(rows.len()));
        }
        let mut cells = [0u64; Self::CELLS];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != Self::SIZE {
                return Err(InvalidBoardError::WrongRowLength { row: r, len: row.len() });
            }
            for (c, &value) in row.iter().enumerate() {
                if value < 0 {
                    return Err(InvalidBoardError::NegativeTile { row: r, col: c, value });
                }
                cells[r * Self::SIZE + c] = value as u64;
            }
        }
        Ok(Board(cells))
    }

    /// Tile value at (row, col); 0 means empty.
    #[inline]
    pub fn get(self, row: usize, col: usize) -> u64 {
        self.0[row * Self::SIZE + col]
    }

    /// The board as four rows of four tile values.
    pub fn to_cells(self) -> [[u64; 4]; 4] {
        let mut rows = [[0u64; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&self.0[r * Self::SIZE..(r + 1) * Self::SIZE]);
        }
        rows
    }

    /// Slide/merge tiles in `direction`, reporting whether anything moved.
    ///
    /// Each row (for `Left`/`Right`) or column (for `Up`/`Down`) is handled
    /// independently: non-zero tiles are compacted toward the leading edge,
    /// with one merge pass over adjacent equal pairs. A tile produced by a
    /// merge cannot merge again within the same shift.
    ///
    /// ```
    /// use advisor_2048::engine::{Board, Move};
    /// let board = Board::from_cells([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// let result = board.shift(Move::Left);
    /// assert!(result.changed);
    /// assert_eq!(result.board.get(0, 0), 4);
    /// ```
    pub fn shift(self, direction: Move) -> MoveResult {
        let mut cells = self.0;
        for lane in 0..Self::SIZE {
            let idx = lane_indices(direction, lane);
            let line = [cells[idx[0]], cells[idx[1]], cells[idx[2]], cells[idx[3]]];
            let slid = slide_line(line);
            for (k, &cell) in idx.iter().enumerate() {
                cells[cell] = slid[k];
            }
        }
        let board = Board(cells);
        MoveResult { changed: board != self, board }
    }

    /// A copy of this board with `value` placed into cell `idx` (row-major).
    #[inline]
    pub fn with_tile(self, idx: usize, value: u64) -> Self {
        let mut cells = self.0;
        cells[idx] = value;
        Board(cells)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty cell,
    /// using the provided RNG. Returns the board unchanged if it is full.
    ///
    /// ```
    /// use advisor_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(board.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.empty_cells();
        match empty.choose(rng) {
            Some(&idx) => {
                let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
                self.with_tile(idx, value)
            }
            None => self,
        }
    }

    /// Convenience: like `with_random_tile` but uses thread-local RNG.
    pub fn with_random_tile_thread(self) -> Self {
        let mut rng = rand::thread_rng();
        self.with_random_tile(&mut rng)
    }

    /// Perform a move then insert a random tile if the move changed the
    /// board, using the provided RNG.
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let result = self.shift(direction);
        if result.changed { result.board.with_random_tile(rng) } else { self }
    }

    /// Row-major indices of all empty cells.
    pub fn empty_cells(self) -> SmallVec<[usize; 16]> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> usize {
        self.0.iter().filter(|&&v| v == 0).count()
    }

    /// The highest tile value present (0 on an empty board).
    #[inline]
    pub fn max_tile(self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Directions whose shift changes this board, in enumeration order.
    pub fn valid_moves(self) -> SmallVec<[Move; 4]> {
        Move::ALL
            .iter()
            .copied()
            .filter(|&direction| self.shift(direction).changed)
            .collect()
    }

    /// Return true if no direction changes the board.
    pub fn is_game_over(self) -> bool {
        Move::ALL.iter().all(|&direction| !self.shift(direction).changed)
    }
}

/// Cell indices of one lane, ordered from the edge tiles slide toward.
#[inline]
fn lane_indices(direction: Move, lane: usize) -> [usize; 4] {
    let row = lane * Board::SIZE;
    match direction {
        Move::Left => [row, row + 1, row + 2, row + 3],
        Move::Right => [row + 3, row + 2, row + 1, row],
        Move::Up => [lane, lane + 4, lane + 8, lane + 12],
        Move::Down => [lane + 12, lane + 8, lane + 4, lane],
    }
}

/// Slide one lane toward its leading edge (index 0) with a single merge
/// pass. No chain merges: a doubled tile is skipped by the next pair.
fn slide_line(line: [u64; 4]) -> [u64; 4] {
    let mut packed: SmallVec<[u64; 4]> = line.iter().copied().filter(|&v| v != 0).collect();
    for i in 1..packed.len() {
        if packed[i] != 0 && packed[i] == packed[i - 1] {
            packed[i - 1] *= 2;
            packed[i] = 0;
        }
    }
    let mut out = [0u64; 4];
    let mut slot = 0;
    for v in packed {
        if v != 0 {
            out[slot] = v;
            slot += 1;
        }
    }
    out
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.to_cells())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..Self::SIZE {
            if r > 0 {
                writeln!(f, "------+------+------+------")?;
            }
            writeln!(
                f,
                "{:>6}|{:>6}|{:>6}|{:>6}",
                format_val(self.get(r, 0)),
                format_val(self.get(r, 1)),
                format_val(self.get(r, 2)),
                format_val(self.get(r, 3)),
            )?;
        }
        Ok(())
    }
}

fn format_val(val: u64) -> String {
    if val == 0 { String::new() } else { val.to_string() }
}
