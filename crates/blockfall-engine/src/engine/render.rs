use std::time::Duration;

use crate::{
    ActivePiece, HeldPiece, SessionState,
    core::{
        board::{Board, Cell},
        color::Color,
        shape::ShapeKind,
    },
};

/// Snapshot of everything a front end needs to draw the session.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub board: &'a Board,
    pub active: Option<&'a ActivePiece>,
    /// Where the active piece would land on a hard drop.
    pub ghost: Option<ActivePiece>,
    pub next: Option<&'a ActivePiece>,
    pub held: Option<&'a HeldPiece>,
    pub score: u64,
    pub level: u64,
    pub state: SessionState,
}

/// A cell of a composed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameCell {
    #[default]
    Empty,
    /// Locked cell on the board.
    Locked(Color),
    /// Cell covered by the active piece.
    Active(Color),
    /// Landing preview of the active piece.
    Ghost,
}

impl Frame<'_> {
    /// Overlays the ghost and active piece on the locked cells.
    ///
    /// Rows are returned top to bottom; piece cells above the grid are
    /// dropped.
    #[must_use]
    pub fn compose(&self) -> Vec<Vec<FrameCell>> {
        let mut rows: Vec<Vec<FrameCell>> = self
            .board
            .playable_rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Empty => FrameCell::Empty,
                        Cell::Filled(color) => FrameCell::Locked(*color),
                    })
                    .collect()
            })
            .collect();

        let mut overlay = |piece: &ActivePiece, cell: FrameCell| {
            for (dx, dy) in piece.shape().filled_cells() {
                let x = i64::from(piece.x()) + i64::try_from(dx).unwrap_or(i64::MAX);
                let y = i64::from(piece.y()) + i64::try_from(dy).unwrap_or(i64::MAX);
                let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                    continue;
                };
                if let Some(target) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                    *target = cell;
                }
            }
        };
        if let Some(ghost) = &self.ghost {
            overlay(ghost, FrameCell::Ghost);
        }
        if let Some(active) = self.active {
            overlay(active, FrameCell::Active(active.color()));
        }
        rows
    }
}

/// Notifications emitted by the session besides plain redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    GameStarted,
    PieceLocked { kind: ShapeKind, lines_cleared: usize },
    LinesCleared { lines: usize, score_delta: u64 },
    LevelUp { level: u64, fall_interval: Duration },
    Paused,
    Resumed,
    GameOver { score: u64 },
}

/// Render collaborator notified by the session.
///
/// `render` is called after every operation that changed visible state.
/// The unit type is a renderer that ignores everything.
pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);

    fn on_event(&mut self, event: &GameEvent) {
        let _ = event;
    }
}

impl Renderer for () {
    fn render(&mut self, _frame: &Frame<'_>) {}
}

impl<R> Renderer for &mut R
where
    R: Renderer + ?Sized,
{
    fn render(&mut self, frame: &Frame<'_>) {
        (**self).render(frame);
    }

    fn on_event(&mut self, event: &GameEvent) {
        (**self).on_event(event);
    }
}
