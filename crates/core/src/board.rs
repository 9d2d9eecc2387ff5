//! Board module - manages the playing grid
//!
//! The board is a 15x15 grid where each cell is empty or holds a mark.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (row, col) where both range 0..14, row 0 at the top.

use crate::types::{coord_digit, Cell, Mark, BOARD_SIZE, CELL_COUNT, WIN_LENGTH};

/// The four axes scanned by win detection: horizontal, vertical and both diagonals
const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// The game board - 15 x 15 using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, row-major order (row * SIZE + col)
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    /// Calculate flat index from (row, col) coordinates
    #[inline(always)]
    fn index(row: i32, col: i32) -> Option<usize> {
        if !Self::in_bounds(row, col) {
            return None;
        }
        Some((row as usize) * BOARD_SIZE + (col as usize))
    }

    /// Check whether (row, col) lies on the board
    pub fn in_bounds(row: i32, col: i32) -> bool {
        let max = BOARD_SIZE as i32;
        (0..max).contains(&row) && (0..max).contains(&col)
    }

    /// Get cell at position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        Self::index(row, col).map(|idx| self.cells[idx])
    }

    /// Set cell at position (row, col)
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match Self::index(row, col) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and holds a mark
    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        matches!(self.get(row, col), Some(Some(_)))
    }

    /// Count marks equal to `mark` starting next to (row, col) and stepping by (dr, dc).
    /// The anchor itself is not counted.
    fn count_direction(&self, row: i32, col: i32, dr: i32, dc: i32, mark: Mark) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row + dr, col + dc);
        while self.get(r, c) == Some(Some(mark)) {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    /// Length of the run through (row, col) along axis (dr, dc), anchor included.
    ///
    /// Returns 0 when the anchor cell is empty or off the board.
    pub fn run_length(&self, row: i32, col: i32, dr: i32, dc: i32) -> usize {
        let Some(Some(mark)) = self.get(row, col) else {
            return 0;
        };
        1 + self.count_direction(row, col, dr, dc, mark)
            + self.count_direction(row, col, -dr, -dc, mark)
    }

    /// Longest run through (row, col) over all four axes
    pub fn longest_run(&self, row: i32, col: i32) -> usize {
        AXES.iter()
            .map(|&(dr, dc)| self.run_length(row, col, dr, dc))
            .max()
            .unwrap_or(0)
    }

    /// Check whether the mark at (row, col) is part of a run of `WIN_LENGTH` or more.
    ///
    /// Only the lines through the anchor are scanned, so the cost is bounded by
    /// the board size regardless of how many moves have been played.
    pub fn completes_line(&self, row: i32, col: i32) -> bool {
        AXES.iter()
            .any(|&(dr, dc)| self.run_length(row, col, dr, dc) >= WIN_LENGTH)
    }

    /// Number of occupied cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Check if every cell holds a mark
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Write a compact grid (0 = empty, 1 = black, 2 = white)
    pub fn write_u8_grid(&self, out: &mut [[u8; BOARD_SIZE]; BOARD_SIZE]) {
        for (row, line) in out.iter_mut().enumerate() {
            let start = row * BOARD_SIZE;
            for (col, slot) in line.iter_mut().enumerate() {
                *slot = self.cells[start + col].map(|m| m.code()).unwrap_or(0);
            }
        }
    }

    /// Render the board as text with a hex coordinate header.
    ///
    /// ```text
    ///    0 1 2 3 4 5 6 7 8 9 A B C D E
    /// 0  . . . . . . . . . . . . . . .
    /// ```
    pub fn render(&self) -> String {
        // header + rows, each roughly two chars per cell
        let mut out = String::with_capacity((BOARD_SIZE + 1) * (BOARD_SIZE * 2 + 4));
        out.push_str("  ");
        for col in 0..BOARD_SIZE {
            out.push(' ');
            out.push(coord_digit(col));
        }
        for row in 0..BOARD_SIZE {
            out.push('\n');
            out.push(coord_digit(row));
            out.push(' ');
            let start = row * BOARD_SIZE;
            for cell in &self.cells[start..start + BOARD_SIZE] {
                out.push(' ');
                out.push(cell.map(|m| m.symbol()).unwrap_or('.'));
            }
        }
        out
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }

    /// Create from a 2D vector for testing (converts to flat array)
    #[cfg(test)]
    pub fn from_cells(cells_2d: Vec<Vec<Cell>>) -> Self {
        assert_eq!(cells_2d.len(), BOARD_SIZE);
        assert!(cells_2d.iter().all(|row| row.len() == BOARD_SIZE));

        let mut flat = [None; CELL_COUNT];
        for (r, row) in cells_2d.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                flat[r * BOARD_SIZE + c] = *cell;
            }
        }
        Self { cells: flat }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(0, 14), Some(14));
        assert_eq!(Board::index(1, 0), Some(15));
        assert_eq!(Board::index(14, 14), Some(224));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(0, 15), None);
        assert_eq!(Board::index(15, 0), None);
    }

    #[test]
    fn test_run_length_counts_both_senses() {
        let mut board = Board::new();
        for col in 3..7 {
            board.set(7, col, Some(Mark::Black));
        }
        // Anchor in the middle of a run of four
        assert_eq!(board.run_length(7, 5, 0, 1), 4);
        assert_eq!(board.run_length(7, 5, 1, 0), 1);
        assert!(!board.completes_line(7, 5));

        board.set(7, 7, Some(Mark::Black));
        assert!(board.completes_line(7, 3));
        assert_eq!(board.longest_run(7, 7), 5);
    }

    #[test]
    fn test_run_stops_at_other_mark() {
        let mut board = Board::new();
        for col in 0..4 {
            board.set(0, col, Some(Mark::White));
        }
        board.set(0, 4, Some(Mark::Black));
        board.set(0, 5, Some(Mark::White));
        assert_eq!(board.run_length(0, 3, 0, 1), 4);
        assert!(!board.completes_line(0, 5));
    }

    #[test]
    fn test_run_length_of_empty_anchor_is_zero() {
        let board = Board::new();
        assert_eq!(board.run_length(7, 7, 0, 1), 0);
        assert_eq!(board.run_length(-1, 7, 0, 1), 0);
    }

    #[test]
    fn test_from_cells_matches_set() {
        let mut cells = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
        cells[2][3] = Some(Mark::Black);
        cells[14][0] = Some(Mark::White);
        let board = Board::from_cells(cells);

        let mut expected = Board::new();
        expected.set(2, 3, Some(Mark::Black));
        expected.set(14, 0, Some(Mark::White));
        assert_eq!(board, expected);
        assert_eq!(board.filled(), 2);
    }

    #[test]
    fn test_render_layout() {
        let mut board = Board::new();
        board.set(0, 0, Some(Mark::Black));
        board.set(14, 14, Some(Mark::White));

        let text = board.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), BOARD_SIZE + 1);
        assert_eq!(lines[0], "   0 1 2 3 4 5 6 7 8 9 A B C D E");
        assert!(lines[1].starts_with("0  ● ."));
        assert!(lines[15].starts_with("E  ."));
        assert!(lines[15].ends_with("○"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn random_board() -> impl Strategy<Value = Board> {
            proptest::collection::vec(0..3u8, CELL_COUNT).prop_map(|codes| {
                let mut board = Board::new();
                for (i, code) in codes.into_iter().enumerate() {
                    let mark = match code {
                        1 => Some(Mark::Black),
                        2 => Some(Mark::White),
                        _ => None,
                    };
                    board.set((i / BOARD_SIZE) as i32, (i % BOARD_SIZE) as i32, mark);
                }
                board
            })
        }

        /// Naive scan: walk forward from the run's first cell
        fn brute_run(board: &Board, row: i32, col: i32, dr: i32, dc: i32) -> usize {
            let Some(Some(mark)) = board.get(row, col) else {
                return 0;
            };
            let (mut r, mut c) = (row, col);
            while board.get(r - dr, c - dc) == Some(Some(mark)) {
                r -= dr;
                c -= dc;
            }
            let mut len = 0;
            while board.get(r, c) == Some(Some(mark)) {
                len += 1;
                r += dr;
                c += dc;
            }
            len
        }

        proptest! {
            /// Property: anchored run length matches a naive scan on every axis
            #[test]
            fn prop_run_length_matches_scan(
                board in random_board(),
                row in 0..BOARD_SIZE as i32,
                col in 0..BOARD_SIZE as i32,
            ) {
                for &(dr, dc) in AXES.iter() {
                    prop_assert_eq!(
                        board.run_length(row, col, dr, dc),
                        brute_run(&board, row, col, dr, dc)
                    );
                    prop_assert_eq!(
                        board.run_length(row, col, dr, dc),
                        board.run_length(row, col, -dr, -dc)
                    );
                }
                prop_assert_eq!(
                    board.completes_line(row, col),
                    board.longest_run(row, col) >= WIN_LENGTH
                );
            }
        }
    }
}
