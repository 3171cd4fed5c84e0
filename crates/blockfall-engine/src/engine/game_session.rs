use std::{collections::VecDeque, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    ActionError, ActivePiece, ConfigError, Direction, Frame, GameConfig, GameEvent, HeldPiece,
    Intent, ManualScheduler, MoveOutcome, PieceController, PieceGenerator, PiecePhase, Renderer,
    Scheduler, ScoreTracker, TimerId, WallClockScheduler, core::board::Board,
};

/// Number of pieces kept in the preview queue.
const PREVIEW_LEN: usize = 1;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// Created, `start_game` not called yet.
    #[default]
    Ready,
    Playing,
    Paused,
    GameOver,
}

/// One game, from `start_game` to game over.
///
/// The session owns every piece of game state together with its two
/// collaborators: a [`Scheduler`] for fall ticks and lock delays and a
/// [`Renderer`] told about every visible change. It never reads a clock and
/// never blocks; time only passes when the owner feeds fired timers to
/// [`Self::handle_timer`] (or uses [`Self::advance`] / [`Self::poll_timers`]).
///
/// Every action returns `Err` exactly when it was rejected, in which case
/// nothing changed.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{GameConfig, GameSession, Intent, ManualScheduler};
///
/// let mut session = GameSession::new(GameConfig::default(), ManualScheduler::new(), ()).unwrap();
/// session.start_game();
///
/// session.advance(Duration::from_millis(400));
/// assert_eq!(session.active_piece().unwrap().y(), 1);
///
/// session.handle_input(Intent::HardDrop).unwrap();
/// assert_eq!(session.tracker().completed_pieces(), 1);
/// ```
#[derive(Debug)]
pub struct GameSession<S, R> {
    config: GameConfig,
    board: Board,
    generator: PieceGenerator,
    controller: Option<PieceController>,
    upcoming: VecDeque<ActivePiece>,
    held: Option<HeldPiece>,
    tracker: ScoreTracker,
    scheduler: S,
    renderer: R,
    fall_timer: Option<TimerId>,
    lock_timer: Option<TimerId>,
    state: SessionState,
}

impl<S, R> GameSession<S, R>
where
    S: Scheduler,
    R: Renderer,
{
    /// Creates a session in the [`SessionState::Ready`] state.
    pub fn new(config: GameConfig, scheduler: S, renderer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            board: Board::new(config.rows, config.cols),
            generator: PieceGenerator::from_config(&config),
            controller: None,
            upcoming: VecDeque::with_capacity(PREVIEW_LEN + 1),
            held: None,
            tracker: ScoreTracker::new(&config),
            scheduler,
            renderer,
            fall_timer: None,
            lock_timer: None,
            state: SessionState::Ready,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the falling piece, if a game is in progress.
    #[must_use]
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.controller.as_ref().map(PieceController::piece)
    }

    #[must_use]
    pub fn piece_phase(&self) -> Option<PiecePhase> {
        self.controller.as_ref().map(PieceController::phase)
    }

    #[must_use]
    pub fn next_piece(&self) -> Option<&ActivePiece> {
        self.upcoming.front()
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<&HeldPiece> {
        self.held.as_ref()
    }

    #[must_use]
    pub fn tracker(&self) -> &ScoreTracker {
        &self.tracker
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.tracker.score()
    }

    #[must_use]
    pub fn level(&self) -> u64 {
        self.tracker.level()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Returns what a renderer would currently be shown.
    #[must_use]
    pub fn frame(&self) -> Frame<'_> {
        build_frame(
            &self.board,
            self.controller.as_ref(),
            &self.upcoming,
            self.held.as_ref(),
            &self.tracker,
            self.state,
        )
    }

    /// Starts a new game, discarding whatever state the session was in.
    pub fn start_game(&mut self) {
        self.cancel_timers();
        self.board = Board::new(self.config.rows, self.config.cols);
        self.generator = PieceGenerator::from_config(&self.config);
        self.tracker = ScoreTracker::new(&self.config);
        self.held = None;
        self.upcoming.clear();

        let first = self.generator.next();
        self.controller = Some(self.new_controller(first));
        self.refill_upcoming();
        self.state = SessionState::Playing;
        self.schedule_fall_tick();

        info!(
            rows = self.config.rows,
            cols = self.config.cols,
            generator = ?self.config.generator,
            "game started"
        );
        self.emit(GameEvent::GameStarted);
        self.render();
    }

    pub fn handle_input(&mut self, intent: Intent) -> Result<(), ActionError> {
        match intent {
            Intent::MoveLeft => self.move_piece(Direction::Left),
            Intent::MoveRight => self.move_piece(Direction::Right),
            Intent::SoftDrop => self.move_piece(Direction::Down),
            Intent::HardDrop => self.hard_drop(),
            Intent::Rotate => self.rotate(),
            Intent::Hold => self.hold(),
            Intent::Restore => self.restore_held(),
        }
    }

    /// Moves the active piece one cell.
    ///
    /// A blocked downward move is not a rejection the first time: it arms
    /// the lock delay (or locks at once when the delay is zero) and returns
    /// `Ok`. Blocked downward moves while the delay is armed are rejected.
    pub fn move_piece(&mut self, direction: Direction) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let Some(controller) = self.controller.as_mut() else {
            return Err(ActionError::NotPlaying);
        };
        let outcome = controller.try_move(&self.board, direction);
        self.apply_outcome(outcome)
    }

    /// Rotates the active piece clockwise in place.
    pub fn rotate(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let Some(controller) = self.controller.as_mut() else {
            return Err(ActionError::NotPlaying);
        };
        let outcome = controller.try_rotate(&self.board);
        self.apply_outcome(outcome)
    }

    /// Drops the active piece to its resting position and locks it.
    pub fn hard_drop(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let Some(controller) = self.controller.as_mut() else {
            return Err(ActionError::NotPlaying);
        };
        let distance = controller.hard_drop(&self.board);
        trace!(distance, "hard drop");
        self.lock_active_piece();
        Ok(())
    }

    /// Banks the active piece and brings in the next one.
    pub fn hold(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        if !self.config.hold_enabled {
            return Err(ActionError::HoldDisabled);
        }
        if self.held.is_some() {
            return Err(ActionError::HoldOccupied);
        }
        let (Some(controller), Some(&incoming)) = (&self.controller, self.upcoming.front()) else {
            return Err(ActionError::NotPlaying);
        };
        if !incoming.fits(&self.board) {
            return Err(ActionError::Collision);
        }

        let held = controller.piece().to_held();
        self.upcoming.pop_front();
        self.held = Some(held);
        self.controller = Some(self.new_controller(incoming));
        self.refill_upcoming();
        self.cancel_lock_timer();

        debug!(held = ?held.kind(), active = ?incoming.kind(), "piece held");
        self.render();
        Ok(())
    }

    /// Brings the held piece back at the spawn position.
    ///
    /// The piece it replaces becomes the next piece.
    pub fn restore_held(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        if !self.config.hold_enabled {
            return Err(ActionError::HoldDisabled);
        }
        let Some(held) = self.held else {
            return Err(ActionError::NothingHeld);
        };
        let incoming = held.respawn(self.config.cols);
        if !incoming.fits(&self.board) {
            return Err(ActionError::Collision);
        }

        if let Some(displaced) = self.controller.take() {
            let displaced = displaced.piece().to_held().respawn(self.config.cols);
            self.upcoming.push_front(displaced);
        }
        self.held = None;
        self.controller = Some(self.new_controller(incoming));
        self.cancel_lock_timer();

        debug!(active = ?incoming.kind(), "held piece restored");
        self.render();
        Ok(())
    }

    /// Pauses or resumes the game.
    ///
    /// Pausing drops every timer. Resuming starts a fresh fall tick and, if
    /// the piece was waiting to lock, a full lock delay.
    pub fn toggle_pause(&mut self) -> Result<(), ActionError> {
        match self.state {
            SessionState::Playing => {
                self.cancel_timers();
                self.state = SessionState::Paused;
                debug!("paused");
                self.emit(GameEvent::Paused);
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                self.schedule_fall_tick();
                if self.piece_phase().is_some_and(|phase| phase.is_lock_pending()) {
                    self.arm_lock_timer();
                }
                debug!("resumed");
                self.emit(GameEvent::Resumed);
            }
            SessionState::Ready | SessionState::GameOver => return Err(ActionError::NotPlaying),
        }
        self.render();
        Ok(())
    }

    /// Reacts to a fired timer.
    ///
    /// Ids the session did not arm, or has since cancelled, are ignored.
    pub fn handle_timer(&mut self, id: TimerId) {
        if self.fall_timer == Some(id) {
            self.on_fall_tick();
        } else if self.lock_timer == Some(id) {
            self.lock_timer = None;
            self.on_lock_delay_expired();
        } else {
            trace!(?id, "ignoring stale timer");
        }
    }

    fn on_fall_tick(&mut self) {
        // A grounded piece simply stays put; the lock delay decides.
        let _ = self.move_piece(Direction::Down);
    }

    fn on_lock_delay_expired(&mut self) {
        if self.state.is_playing() {
            self.lock_active_piece();
        }
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        if self.state.is_playing() {
            Ok(())
        } else {
            Err(ActionError::NotPlaying)
        }
    }

    fn apply_outcome(&mut self, outcome: MoveOutcome) -> Result<(), ActionError> {
        match outcome {
            MoveOutcome::Moved { lock_cancelled } => {
                if lock_cancelled {
                    self.cancel_lock_timer();
                }
                self.render();
                Ok(())
            }
            MoveOutcome::Blocked => Err(ActionError::Collision),
            MoveOutcome::ArmLockDelay => {
                self.arm_lock_timer();
                Ok(())
            }
            MoveOutcome::LockNow => {
                self.lock_active_piece();
                Ok(())
            }
        }
    }

    fn lock_active_piece(&mut self) {
        self.cancel_lock_timer();
        let Some(controller) = self.controller.take() else {
            return;
        };
        let piece = *controller.piece();
        piece.lock_onto(&mut self.board);
        let lines = self.board.clear_full_rows();
        let score_delta = self.tracker.on_lines_cleared(lines);

        debug!(
            kind = ?piece.kind(),
            x = piece.x(),
            y = piece.y(),
            lines,
            score = self.tracker.score(),
            "piece locked"
        );
        self.emit(GameEvent::PieceLocked {
            kind: piece.kind(),
            lines_cleared: lines,
        });
        if lines > 0 {
            self.emit(GameEvent::LinesCleared { lines, score_delta });
        }

        if let Some(fall_interval) = self.tracker.recompute_level() {
            let level = self.tracker.level();
            info!(level, ?fall_interval, "level up");
            self.schedule_fall_tick();
            self.emit(GameEvent::LevelUp {
                level,
                fall_interval,
            });
        }

        self.refill_upcoming();
        let next = self
            .upcoming
            .front()
            .copied()
            .filter(|next| !self.board.top_row_occupied() && next.fits(&self.board));
        match next {
            Some(next) => {
                self.upcoming.pop_front();
                self.controller = Some(self.new_controller(next));
                self.refill_upcoming();
                self.render();
            }
            None => self.game_over(),
        }
    }

    fn game_over(&mut self) {
        self.cancel_timers();
        self.state = SessionState::GameOver;
        let score = self.tracker.score();
        info!(
            score,
            level = self.tracker.level(),
            pieces = self.tracker.completed_pieces(),
            lines = self.tracker.total_cleared_lines(),
            "game over"
        );
        self.emit(GameEvent::GameOver { score });
        self.render();
    }

    fn new_controller(&self, piece: ActivePiece) -> PieceController {
        PieceController::new(piece, self.config.lock_delay_ms > 0)
    }

    fn refill_upcoming(&mut self) {
        while self.upcoming.len() < PREVIEW_LEN {
            self.upcoming.push_back(self.generator.next());
        }
    }

    fn schedule_fall_tick(&mut self) {
        if let Some(id) = self.fall_timer.take() {
            self.scheduler.cancel(id);
        }
        let interval = self.tracker.fall_interval();
        self.fall_timer = Some(self.scheduler.schedule_every(interval));
    }

    fn arm_lock_timer(&mut self) {
        self.cancel_lock_timer();
        self.lock_timer = Some(self.scheduler.schedule_after(self.config.lock_delay()));
    }

    fn cancel_lock_timer(&mut self) {
        if let Some(id) = self.lock_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.fall_timer.take() {
            self.scheduler.cancel(id);
        }
        self.cancel_lock_timer();
    }

    fn emit(&mut self, event: GameEvent) {
        self.renderer.on_event(&event);
    }

    fn render(&mut self) {
        let frame = build_frame(
            &self.board,
            self.controller.as_ref(),
            &self.upcoming,
            self.held.as_ref(),
            &self.tracker,
            self.state,
        );
        self.renderer.render(&frame);
    }
}

impl<R> GameSession<ManualScheduler, R>
where
    R: Renderer,
{
    /// Moves the virtual clock forward by `elapsed`, firing every timer that
    /// comes due on the way in deadline order.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.scheduler.now() + elapsed;
        while let Some(id) = self.scheduler.pop_due_until(target) {
            self.handle_timer(id);
        }
        self.scheduler.advance_to(target);
    }
}

impl<R> GameSession<WallClockScheduler, R>
where
    R: Renderer,
{
    /// Fires every timer whose deadline has passed and returns how many fired.
    pub fn poll_timers(&mut self) -> usize {
        let mut fired = 0;
        while let Some(id) = self.scheduler.pop_due() {
            self.handle_timer(id);
            fired += 1;
        }
        fired
    }

    /// Time the front end may wait for input before polling again.
    #[must_use]
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }
}

fn build_frame<'a>(
    board: &'a Board,
    controller: Option<&'a PieceController>,
    upcoming: &'a VecDeque<ActivePiece>,
    held: Option<&'a HeldPiece>,
    tracker: &ScoreTracker,
    state: SessionState,
) -> Frame<'a> {
    let active = controller.map(PieceController::piece);
    Frame {
        board,
        active,
        ghost: active.map(|piece| piece.drop_position(board)),
        next: upcoming.front(),
        held,
        score: tracker.score(),
        level: tracker.level(),
        state,
    }
}
