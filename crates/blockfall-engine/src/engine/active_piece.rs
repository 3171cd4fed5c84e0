use crate::core::{
    board::Board,
    color::Color,
    shape::{Shape, ShapeKind},
};

/// Column at which a shape of `width` cells spawns: `floor(cols/2 - width/2)`.
#[must_use]
pub fn spawn_x(cols: usize, width: usize) -> i32 {
    let x = (cols.cast_signed() - width.cast_signed()).div_euclid(2);
    i32::try_from(x).unwrap_or(0)
}

/// The falling piece: a shape, its color and the board position of the
/// top-left corner of its bounding box.
///
/// Like shapes, pieces are values. Translation and rotation return new
/// pieces that the caller checks against the board before adopting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    kind: ShapeKind,
    shape: Shape,
    color: Color,
    x: i32,
    y: i32,
}

impl ActivePiece {
    /// Places `shape` at the spawn position of a board `cols` wide.
    #[must_use]
    pub fn spawn(kind: ShapeKind, shape: Shape, color: Color, cols: usize) -> Self {
        Self {
            kind,
            shape,
            color,
            x: spawn_x(cols, shape.width()),
            y: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns this piece rotated 90° clockwise around the same anchor.
    #[must_use]
    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_clockwise(),
            ..*self
        }
    }

    #[must_use]
    pub fn fits(&self, board: &Board) -> bool {
        board.is_valid_position(&self.shape, self.x, self.y)
    }

    /// Returns where this piece would come to rest if dropped straight down.
    #[must_use]
    pub fn drop_position(&self, board: &Board) -> Self {
        self.shifted(0, board.drop_distance(&self.shape, self.x, self.y))
    }

    pub fn lock_onto(&self, board: &mut Board) {
        board.lock(&self.shape, self.x, self.y, self.color);
    }

    #[must_use]
    pub fn to_held(&self) -> HeldPiece {
        HeldPiece {
            kind: self.kind,
            shape: self.shape,
            color: self.color,
        }
    }
}

/// A piece banked in the hold slot.
///
/// Keeps the shape in the orientation it was held in; the position is
/// discarded and recomputed on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldPiece {
    kind: ShapeKind,
    shape: Shape,
    color: Color,
}

impl HeldPiece {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Places the held piece back at the spawn position.
    #[must_use]
    pub fn respawn(&self, cols: usize) -> ActivePiece {
        ActivePiece::spawn(self.kind, self.shape, self.color, cols)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

/// Lock state of the active piece.
///
/// Locking itself is not a resting state: a piece that locks is committed
/// to the board and replaced in the same operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::IsVariant)]
pub enum PiecePhase {
    /// The piece can still fall, or has not yet tried to.
    #[default]
    Falling,
    /// A downward move failed and the lock delay is armed.
    LockPending,
}

/// Result of a move or rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MoveOutcome {
    /// The piece moved. `lock_cancelled` is set when this move interrupted
    /// a pending lock delay.
    Moved { lock_cancelled: bool },
    /// The move was rejected and nothing changed.
    Blocked,
    /// A downward move failed; the lock delay must be armed.
    ArmLockDelay,
    /// A downward move failed and there is no lock delay; lock now.
    LockNow,
}

/// Applies movement requests to the active piece and tracks its lock phase.
///
/// The controller only decides; it never touches timers or commits cells.
/// [`GameSession`](crate::GameSession) acts on the returned [`MoveOutcome`].
#[derive(Debug, Clone)]
pub struct PieceController {
    piece: ActivePiece,
    phase: PiecePhase,
    lock_delay_enabled: bool,
}

impl PieceController {
    #[must_use]
    pub fn new(piece: ActivePiece, lock_delay_enabled: bool) -> Self {
        Self {
            piece,
            phase: PiecePhase::Falling,
            lock_delay_enabled,
        }
    }

    #[must_use]
    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    #[must_use]
    pub fn phase(&self) -> PiecePhase {
        self.phase
    }

    /// Translates the piece one cell, reverting if the target is invalid.
    ///
    /// A successful move always returns the piece to [`PiecePhase::Falling`].
    /// A failed downward move arms the lock delay once; further failed
    /// downward moves while it is armed are plain rejections so the timer
    /// is not pushed back.
    pub fn try_move(&mut self, board: &Board, direction: Direction) -> MoveOutcome {
        let (dx, dy) = direction.delta();
        let candidate = self.piece.shifted(dx, dy);
        if candidate.fits(board) {
            self.piece = candidate;
            return self.settle_moved();
        }
        if direction != Direction::Down {
            return MoveOutcome::Blocked;
        }
        if !self.lock_delay_enabled {
            return MoveOutcome::LockNow;
        }
        match self.phase {
            PiecePhase::LockPending => MoveOutcome::Blocked,
            PiecePhase::Falling => {
                self.phase = PiecePhase::LockPending;
                MoveOutcome::ArmLockDelay
            }
        }
    }

    /// Rotates the piece clockwise in place; an invalid rotation is discarded.
    pub fn try_rotate(&mut self, board: &Board) -> MoveOutcome {
        let candidate = self.piece.rotated();
        if !candidate.fits(board) {
            return MoveOutcome::Blocked;
        }
        self.piece = candidate;
        self.settle_moved()
    }

    /// Moves the piece to its resting position and returns the rows travelled.
    pub fn hard_drop(&mut self, board: &Board) -> i32 {
        let dropped = self.piece.drop_position(board);
        let distance = dropped.y() - self.piece.y();
        self.piece = dropped;
        distance
    }

    fn settle_moved(&mut self) -> MoveOutcome {
        let lock_cancelled = self.phase.is_lock_pending();
        self.phase = PiecePhase::Falling;
        MoveOutcome::Moved { lock_cancelled }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cell;

    use super::*;

    fn piece(kind: ShapeKind) -> ActivePiece {
        ActivePiece::spawn(kind, kind.shape(), Color::Red, 10)
    }

    #[test]
    fn test_spawn_x() {
        assert_eq!(spawn_x(10, 3), 3);
        assert_eq!(spawn_x(10, 2), 4);
        assert_eq!(spawn_x(10, 1), 4);
        assert_eq!(spawn_x(10, 4), 3);
        assert_eq!(spawn_x(7, 2), 2);
    }

    #[test]
    fn test_move_rejected_at_wall() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::O).shifted(-4, 0), true);
        assert_eq!(controller.piece().x(), 0);

        assert_eq!(
            controller.try_move(&board, Direction::Left),
            MoveOutcome::Blocked
        );
        assert_eq!(controller.piece().x(), 0);
        assert!(controller.phase().is_falling());
    }

    #[test]
    fn test_blocked_down_arms_lock_delay_once() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::O).shifted(0, 18), true);

        assert_eq!(
            controller.try_move(&board, Direction::Down),
            MoveOutcome::ArmLockDelay
        );
        assert!(controller.phase().is_lock_pending());
        assert_eq!(
            controller.try_move(&board, Direction::Down),
            MoveOutcome::Blocked
        );
        assert!(controller.phase().is_lock_pending());
    }

    #[test]
    fn test_lateral_move_cancels_pending_lock() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::O).shifted(0, 18), true);
        controller.try_move(&board, Direction::Down);

        assert_eq!(
            controller.try_move(&board, Direction::Right),
            MoveOutcome::Moved {
                lock_cancelled: true
            }
        );
        assert!(controller.phase().is_falling());
        assert_eq!(
            controller.try_move(&board, Direction::Down),
            MoveOutcome::ArmLockDelay
        );
    }

    #[test]
    fn test_blocked_down_without_delay_locks_now() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::O).shifted(0, 18), false);
        assert_eq!(
            controller.try_move(&board, Direction::Down),
            MoveOutcome::LockNow
        );
    }

    #[test]
    fn test_rotation_rejected_when_obstructed() {
        let mut board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::I), true);
        // Vertical I at (4, 0); rotated it would cover (4..8, 0).
        board.set_cell(6, 0, Cell::Filled(Color::Blue));

        let before = *controller.piece();
        assert_eq!(controller.try_rotate(&board), MoveOutcome::Blocked);
        assert_eq!(*controller.piece(), before);
    }

    #[test]
    fn test_rotation_rejected_at_wall_without_kick() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::I).shifted(5, 0), true);
        assert_eq!(controller.piece().x(), 9);
        assert_eq!(controller.try_rotate(&board), MoveOutcome::Blocked);
        assert_eq!(controller.piece().x(), 9);
    }

    #[test]
    fn test_four_rotations_on_open_board() {
        let board = Board::new(20, 10);
        for kind in ShapeKind::ALL {
            let mut controller = PieceController::new(piece(kind).shifted(0, 5), true);
            let original = *controller.piece();
            for _ in 0..4 {
                assert!(controller.try_rotate(&board).is_moved(), "{kind:?}");
            }
            assert_eq!(*controller.piece(), original);
        }
    }

    #[test]
    fn test_hard_drop_moves_to_floor() {
        let board = Board::new(20, 10);
        let mut controller = PieceController::new(piece(ShapeKind::T), true);
        assert_eq!(controller.hard_drop(&board), 18);
        assert_eq!(controller.piece().y(), 18);
    }

    #[test]
    fn test_held_piece_respawns_rotated_shape() {
        let rotated = piece(ShapeKind::L).rotated().shifted(2, 7);
        let held = rotated.to_held();
        let restored = held.respawn(10);

        assert_eq!(restored.shape(), rotated.shape());
        assert_eq!(restored.x(), 4);
        assert_eq!(restored.y(), 0);
    }
}
