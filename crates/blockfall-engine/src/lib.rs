//! Falling-block puzzle engine.
//!
//! A headless implementation of the classic seven-tetromino game: a grid of
//! locked cells, one falling piece, line clears, score and levels. The
//! engine owns no clock, no input device and no screen. Time arrives through
//! a [`Scheduler`], input as [`Intent`]s and output leaves through a
//! [`Renderer`].

pub use self::{config::*, core::*, engine::*};

pub mod config;
pub mod core;
pub mod engine;

/// Why a player action was rejected. A rejected action changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ActionError {
    #[display("piece would collide or leave the board")]
    Collision,
    #[display("hold slot already occupied")]
    HoldOccupied,
    #[display("no piece is held")]
    NothingHeld,
    #[display("hold is disabled")]
    HoldDisabled,
    #[display("no game in progress")]
    NotPlaying,
}
