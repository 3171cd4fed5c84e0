use std::fmt;

use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// Largest bounding box side of any shape.
pub const MAX_SHAPE_SIZE: usize = 4;

/// Immutable binary matrix describing which cells of a bounding box a piece occupies.
///
/// Shapes are never mutated in place. Rotation returns a new matrix so a
/// caller can test the rotated copy against the board before adopting it.
///
/// # Example
///
/// ```
/// use blockfall_engine::ShapeKind;
///
/// let t = ShapeKind::T.shape();
/// assert_eq!((t.width(), t.height()), (3, 2));
///
/// let rotated = t.rotated_clockwise();
/// assert_eq!((rotated.width(), rotated.height()), (2, 3));
/// assert_eq!(rotated.to_string(), "#.\n##\n#.");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    width: u8,
    height: u8,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    /// Builds a shape from rows of `0`/`1` values.
    ///
    /// Only the top-left `width × height` corner of `bits` is read.
    #[expect(clippy::cast_possible_truncation)]
    const fn from_bits(width: usize, height: usize, bits: [[u8; 4]; 4]) -> Self {
        assert!(width > 0 && width <= MAX_SHAPE_SIZE);
        assert!(height > 0 && height <= MAX_SHAPE_SIZE);
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut y = 0;
        while y < height {
            let mut x = 0;
            while x < width {
                cells[y][x] = bits[y][x] != 0;
                x += 1;
            }
            y += 1;
        }
        Self {
            width: width as u8,
            height: height as u8,
            cells,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    /// Returns whether the cell at column `x`, row `y` of the bounding box is filled.
    ///
    /// Positions outside the bounding box are reported as empty.
    #[must_use]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.cells[y][x]
    }

    /// Returns the `(dx, dy)` offsets of every filled cell, row by row.
    #[must_use]
    pub fn filled_cells(&self) -> ArrayVec<(usize, usize), { MAX_SHAPE_SIZE * MAX_SHAPE_SIZE }> {
        let mut filled = ArrayVec::new();
        for dy in 0..self.height() {
            for dx in 0..self.width() {
                if self.cells[dy][dx] {
                    filled.push((dx, dy));
                }
            }
        }
        filled
    }

    /// Returns the rows of the bounding box, each `width` cells long.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.cells[..self.height()]
            .iter()
            .map(|row| &row[..self.width()])
    }

    /// Returns this shape rotated 90° clockwise.
    ///
    /// Rotation is a transpose followed by a row reversal, so the rotated
    /// matrix is `height × width` and keeps the same number of filled cells.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        let (width, height) = (self.width(), self.height());
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in cells.iter_mut().enumerate().take(width) {
            for (x, cell) in row.iter_mut().enumerate().take(height) {
                *cell = self.cells[height - 1 - x][y];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            cells,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for &filled in row {
                f.write_str(if filled { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}

/// The seven canonical tetrominoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum ShapeKind {
    /// T-piece.
    T = 0,
    /// S-piece.
    S = 1,
    /// Z-piece.
    Z = 2,
    /// O-piece.
    O = 3,
    /// I-piece.
    I = 4,
    /// L-piece.
    L = 5,
    /// J-piece.
    J = 6,
}

impl Distribution<ShapeKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ShapeKind {
        ShapeKind::ALL[rng.random_range(0..ShapeKind::LEN)]
    }
}

impl ShapeKind {
    /// Number of shape kinds (7).
    pub const LEN: usize = 7;

    /// Every shape kind, in palette order.
    pub const ALL: [ShapeKind; ShapeKind::LEN] = [
        ShapeKind::T,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::O,
        ShapeKind::I,
        ShapeKind::L,
        ShapeKind::J,
    ];

    /// Returns the spawn orientation of this kind.
    #[must_use]
    pub const fn shape(self) -> Shape {
        SHAPES[self as usize]
    }

    /// Returns the single character representation of this kind.
    ///
    /// ```
    /// use blockfall_engine::ShapeKind;
    ///
    /// assert_eq!(ShapeKind::I.as_char(), 'I');
    /// assert_eq!(ShapeKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            ShapeKind::T => 'T',
            ShapeKind::S => 'S',
            ShapeKind::Z => 'Z',
            ShapeKind::O => 'O',
            ShapeKind::I => 'I',
            ShapeKind::L => 'L',
            ShapeKind::J => 'J',
        }
    }

    /// Parses a shape kind from a single character.
    ///
    /// ```
    /// use blockfall_engine::ShapeKind;
    ///
    /// assert_eq!(ShapeKind::from_char('S'), Some(ShapeKind::S));
    /// assert_eq!(ShapeKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'T' => Some(ShapeKind::T),
            'S' => Some(ShapeKind::S),
            'Z' => Some(ShapeKind::Z),
            'O' => Some(ShapeKind::O),
            'I' => Some(ShapeKind::I),
            'L' => Some(ShapeKind::L),
            'J' => Some(ShapeKind::J),
            _ => None,
        }
    }
}

const SHAPES: [Shape; ShapeKind::LEN] = {
    const E: [u8; 4] = [0; 4];
    [
        // T-piece
        Shape::from_bits(3, 2, [[0, 1, 0, 0], [1, 1, 1, 0], E, E]),
        // S-piece
        Shape::from_bits(3, 2, [[0, 1, 1, 0], [1, 1, 0, 0], E, E]),
        // Z-piece
        Shape::from_bits(3, 2, [[1, 1, 0, 0], [0, 1, 1, 0], E, E]),
        // O-piece
        Shape::from_bits(2, 2, [[1, 1, 0, 0], [1, 1, 0, 0], E, E]),
        // I-piece (vertical at spawn)
        Shape::from_bits(
            1,
            4,
            [[1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]],
        ),
        // L-piece
        Shape::from_bits(3, 2, [[1, 0, 0, 0], [1, 1, 1, 0], E, E]),
        // J-piece
        Shape::from_bits(3, 2, [[0, 0, 1, 0], [1, 1, 1, 0], E, E]),
    ]
};
