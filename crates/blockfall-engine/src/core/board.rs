use std::fmt;

use serde::{Deserialize, Serialize};

use super::{color::Color, shape::Shape};

/// A single cell of the board.
///
/// An empty cell has no color; a filled cell always has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cell {
    /// Unoccupied cell.
    #[default]
    Empty,
    /// Cell occupied by a locked piece of the given color.
    Filled(Color),
}

impl Cell {
    #[must_use]
    pub fn is_occupied(self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    #[must_use]
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BoardRow {
    cells: Vec<Cell>,
}

impl BoardRow {
    fn empty(cols: usize) -> Self {
        Self {
            cells: vec![Cell::Empty; cols],
        }
    }

    fn is_full(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.is_occupied())
    }

    fn is_any_occupied(&self) -> bool {
        self.cells.iter().any(|c| c.is_occupied())
    }
}

/// Fixed-size grid of cells; row `0` is the top of the visible area.
///
/// The board owns collision checks, locking, line clears and the top-out
/// predicate. Piece coordinates are signed because a piece may hang above
/// the visible grid while it spawns.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, Color, ShapeKind};
///
/// let mut board = Board::new(20, 10);
/// let o = ShapeKind::O.shape();
///
/// assert!(board.is_valid_position(&o, 0, 18));
/// board.lock(&o, 0, 18, Color::Amber);
/// assert!(!board.is_valid_position(&o, 0, 17));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: usize,
    rows: Vec<BoardRow>,
}

/// Board coordinate of a shape cell at `delta` from `base`.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn offset(base: i32, delta: usize) -> i32 {
    base + delta as i32
}

impl Board {
    /// Creates an empty board with `rows × cols` cells.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![BoardRow::empty(cols); rows],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the cell at column `x`, row `y`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.cells.get(x)).copied()
    }

    /// Overwrites a single cell.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y].cells[x] = cell;
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn playable_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|row| row.cells.as_slice())
    }

    /// Returns the number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.iter().filter(|c| c.is_occupied()).count())
            .sum()
    }

    /// Returns whether `shape` fits with its top-left corner at `(x, y)`.
    ///
    /// Every filled cell must lie within the columns and above the floor and
    /// must not overlap an occupied cell. Cells above the top row (`y < 0`)
    /// only need a valid column, which lets pieces spawn partially hidden.
    #[must_use]
    pub fn is_valid_position(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.filled_cells().into_iter().all(|(dx, dy)| {
            let Ok(col) = usize::try_from(offset(x, dx)) else {
                return false;
            };
            if col >= self.cols {
                return false;
            }
            let Ok(row) = usize::try_from(offset(y, dy)) else {
                return true;
            };
            row < self.rows.len() && !self.rows[row].cells[col].is_occupied()
        })
    }

    /// Commits every filled cell of `shape` at `(x, y)` with `color`.
    ///
    /// No collision check is performed; the caller validates first. Cells
    /// outside the grid, including those above the top row, are dropped.
    pub fn lock(&mut self, shape: &Shape, x: i32, y: i32, color: Color) {
        for (dx, dy) in shape.filled_cells() {
            let (Ok(col), Ok(row)) = (
                usize::try_from(offset(x, dx)),
                usize::try_from(offset(y, dy)),
            ) else {
                continue;
            };
            if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col)) {
                *cell = Cell::Filled(color);
            }
        }
    }

    /// Removes every full row and returns how many were removed.
    ///
    /// Rows are scanned bottom to top. A removed row is replaced by an empty
    /// row at the top, and the same index is checked again because the row
    /// that shifted into it may be full too.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = self.rows.len();
        while y > 0 {
            if self.rows[y - 1].is_full() {
                self.rows.remove(y - 1);
                self.rows.insert(0, BoardRow::empty(self.cols));
                cleared += 1;
                continue;
            }
            y -= 1;
        }
        cleared
    }

    /// Returns whether any cell of the top row is occupied.
    #[must_use]
    pub fn top_row_occupied(&self) -> bool {
        self.rows.first().is_some_and(BoardRow::is_any_occupied)
    }

    /// Returns how many rows `shape` can fall from `(x, y)` before it rests.
    #[must_use]
    pub fn drop_distance(&self, shape: &Shape, x: i32, y: i32) -> i32 {
        let mut distance = 0;
        while self.is_valid_position(shape, x, y + distance + 1) {
            distance += 1;
        }
        distance
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.playable_rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                f.write_str(if cell.is_occupied() { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ShapeKind;

    use super::*;

    const ROWS: usize = 20;
    const COLS: usize = 10;

    fn fill_row(board: &mut Board, y: usize) {
        for x in 0..board.cols() {
            board.set_cell(x, y, Cell::Filled(Color::Red));
        }
    }

    #[test]
    fn test_initial_board_is_empty() {
        let board = Board::new(ROWS, COLS);
        assert_eq!(board.rows(), ROWS);
        assert_eq!(board.cols(), COLS);
        assert_eq!(board.occupied_count(), 0);
        for row in board.playable_rows() {
            assert_eq!(row.len(), COLS);
            assert!(row.iter().all(|c| *c == Cell::Empty && c.color().is_none()));
        }
    }

    #[test]
    fn test_valid_position_rejects_out_of_bounds() {
        let board = Board::new(ROWS, COLS);
        let o = ShapeKind::O.shape();

        assert!(board.is_valid_position(&o, 0, 0));
        assert!(board.is_valid_position(&o, 8, 18));
        assert!(!board.is_valid_position(&o, -1, 0), "left wall");
        assert!(!board.is_valid_position(&o, 9, 0), "right wall");
        assert!(!board.is_valid_position(&o, 0, 19), "floor");
    }

    #[test]
    fn test_valid_position_rejects_overlap() {
        let mut board = Board::new(ROWS, COLS);
        board.set_cell(4, 10, Cell::Filled(Color::Blue));
        let t = ShapeKind::T.shape();

        // T occupies (x+1, y) and (x..x+3, y+1)
        assert!(!board.is_valid_position(&t, 3, 10));
        assert!(!board.is_valid_position(&t, 3, 9));
        assert!(board.is_valid_position(&t, 5, 9));
    }

    #[test]
    fn test_valid_position_allows_cells_above_top() {
        let board = Board::new(ROWS, COLS);
        let i = ShapeKind::I.shape();

        assert!(board.is_valid_position(&i, 0, -3));
        assert!(board.is_valid_position(&i, 0, -10));
        // Column bound still applies above the grid.
        assert!(!board.is_valid_position(&i, -1, -3));
        assert!(!board.is_valid_position(&i, 10, -3));
    }

    #[test]
    fn test_lock_commits_colored_cells() {
        let mut board = Board::new(ROWS, COLS);
        let s = ShapeKind::S.shape();
        board.lock(&s, 2, 18, Color::Green);

        assert_eq!(board.cell(3, 18), Some(Cell::Filled(Color::Green)));
        assert_eq!(board.cell(4, 18), Some(Cell::Filled(Color::Green)));
        assert_eq!(board.cell(2, 19), Some(Cell::Filled(Color::Green)));
        assert_eq!(board.cell(3, 19), Some(Cell::Filled(Color::Green)));
        assert_eq!(board.cell(2, 18), Some(Cell::Empty));
        assert_eq!(board.occupied_count(), 4);
    }

    #[test]
    fn test_lock_skips_cells_above_top() {
        let mut board = Board::new(ROWS, COLS);
        let i = ShapeKind::I.shape();
        board.lock(&i, 5, -2, Color::Blue);

        assert_eq!(board.occupied_count(), 2);
        assert!(board.cell(5, 0).is_some_and(Cell::is_occupied));
        assert!(board.cell(5, 1).is_some_and(Cell::is_occupied));
        assert!(board.top_row_occupied());
    }

    #[test]
    fn test_clear_two_bottom_rows() {
        let mut board = Board::new(ROWS, COLS);
        fill_row(&mut board, 18);
        fill_row(&mut board, 19);

        assert_eq!(board.clear_full_rows(), 2);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_clear_shifts_rows_above_down() {
        let mut board = Board::new(ROWS, COLS);
        fill_row(&mut board, 19);
        board.set_cell(0, 18, Cell::Filled(Color::Purple));
        fill_row(&mut board, 17);
        board.set_cell(3, 16, Cell::Filled(Color::Amber));

        assert_eq!(board.clear_full_rows(), 2);

        assert_eq!(board.cell(0, 19), Some(Cell::Filled(Color::Purple)));
        assert_eq!(board.cell(3, 18), Some(Cell::Filled(Color::Amber)));
        assert_eq!(board.occupied_count(), 2);
    }

    #[test]
    fn test_clear_partial_row_is_kept() {
        let mut board = Board::new(ROWS, COLS);
        for x in 0..COLS - 1 {
            board.set_cell(x, 19, Cell::Filled(Color::Red));
        }

        assert_eq!(board.clear_full_rows(), 0);
        assert_eq!(board.occupied_count(), COLS - 1);
    }

    #[test]
    fn test_clear_every_row() {
        let mut board = Board::new(ROWS, COLS);
        for y in 0..ROWS {
            fill_row(&mut board, y);
        }

        assert_eq!(board.clear_full_rows(), ROWS);
        assert_eq!(board.occupied_count(), 0);
        assert_eq!(board.rows(), ROWS);
    }

    #[test]
    fn test_top_row_occupied() {
        let mut board = Board::new(ROWS, COLS);
        assert!(!board.top_row_occupied());
        board.set_cell(1, 1, Cell::Filled(Color::Red));
        assert!(!board.top_row_occupied());
        board.set_cell(9, 0, Cell::Filled(Color::Red));
        assert!(board.top_row_occupied());
    }

    #[test]
    fn test_drop_distance() {
        let mut board = Board::new(ROWS, COLS);
        let o = ShapeKind::O.shape();
        assert_eq!(board.drop_distance(&o, 0, 0), 18);

        board.set_cell(1, 10, Cell::Filled(Color::Red));
        assert_eq!(board.drop_distance(&o, 0, 0), 8);
        assert_eq!(board.drop_distance(&o, 0, 8), 0);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new(2, 3);
        board.set_cell(1, 1, Cell::Filled(Color::Red));
        assert_eq!(board.to_string(), "...\n.#.");
    }

    #[test]
    fn test_zero_width_board_has_no_full_rows() {
        let mut board = Board::new(3, 0);
        assert_eq!(board.clear_full_rows(), 0);
        assert_eq!(board.rows(), 3);
    }
}
