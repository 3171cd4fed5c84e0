//! Game rules and session orchestration.
//!
//! Built on the data types in [`core`](crate::core):
//!
//! - [`PieceGenerator`] - bag or uniform shape selection, seeded by [`PieceSeed`]
//! - [`PieceController`] - movement, rotation and lock phase of the active piece
//! - [`ScoreTracker`] - score, level and fall interval
//! - [`Scheduler`] - fall ticks and lock delays, on a manual or wall clock
//! - [`Renderer`] - what a front end is told after each change
//! - [`GameSession`] - the owned session tying all of the above together
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`] from a [`GameConfig`](crate::GameConfig) and call
//!    [`GameSession::start_game`]
//! 2. Feed player [`Intent`]s to [`GameSession::handle_input`] and fired
//!    timers to [`GameSession::handle_timer`]
//! 3. Pieces lock after the lock delay or on hard drop; full rows clear and
//!    score
//! 4. The game ends when the stack reaches the top row or the next piece
//!    cannot spawn

pub use self::{
    active_piece::*, game_session::*, input::*, piece_generator::*, render::*, scheduler::*,
    score_tracker::*,
};

mod active_piece;
mod game_session;
mod input;
mod piece_generator;
mod render;
mod scheduler;
mod score_tracker;
