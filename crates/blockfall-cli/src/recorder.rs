use blockfall_engine::{
    ActionError, Frame, FrameCell, GameEvent, GameSession, Intent, ManualScheduler, Renderer,
    SessionState,
};
use serde::Serialize;

/// Renderer for headless runs.
///
/// Counts frames and level ups, logs every event and, when asked, prints
/// each frame to stderr as text.
#[derive(Debug, Default)]
pub struct EventRecorder {
    show_frames: bool,
    frames: usize,
    level_ups: usize,
}

impl EventRecorder {
    pub fn new(show_frames: bool) -> Self {
        Self {
            show_frames,
            ..Self::default()
        }
    }
}

impl Renderer for EventRecorder {
    fn render(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        if self.show_frames {
            eprintln!("{}", frame_to_text(frame));
        }
    }

    fn on_event(&mut self, event: &GameEvent) {
        if let GameEvent::LevelUp { .. } = event {
            self.level_ups += 1;
        }
        tracing::debug!(?event, "game event");
    }
}

fn frame_to_text(frame: &Frame<'_>) -> String {
    let mut text = format!(
        "score {} level {} {:?}\n",
        frame.score, frame.level, frame.state
    );
    for row in frame.compose() {
        text.extend(row.iter().map(|cell| match cell {
            FrameCell::Empty => '.',
            FrameCell::Locked(_) => '#',
            FrameCell::Active(_) => '@',
            FrameCell::Ghost => '+',
        }));
        text.push('\n');
    }
    text
}

/// Counts of accepted and rejected player inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    pub accepted: usize,
    pub rejected: usize,
}

impl InputStats {
    pub fn record(&mut self, intent: Intent, result: Result<(), ActionError>) {
        match result {
            Ok(()) => self.accepted += 1,
            Err(error) => {
                tracing::trace!(?intent, %error, "input rejected");
                self.rejected += 1;
            }
        }
    }
}

/// Final report printed by the headless commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub state: SessionState,
    pub score: u64,
    pub level: u64,
    pub completed_pieces: usize,
    pub cleared_lines: usize,
    pub line_cleared_counter: Vec<usize>,
    pub level_ups: usize,
    pub frames: usize,
    pub accepted_inputs: usize,
    pub rejected_inputs: usize,
    pub elapsed_ms: u64,
    pub board: Vec<String>,
}

impl SessionSummary {
    pub fn new(session: &GameSession<ManualScheduler, EventRecorder>, inputs: InputStats) -> Self {
        let tracker = session.tracker();
        let recorder = session.renderer();
        Self {
            state: session.state(),
            score: tracker.score(),
            level: tracker.level(),
            completed_pieces: tracker.completed_pieces(),
            cleared_lines: tracker.total_cleared_lines(),
            line_cleared_counter: tracker.line_cleared_counter().to_vec(),
            level_ups: recorder.level_ups,
            frames: recorder.frames,
            accepted_inputs: inputs.accepted,
            rejected_inputs: inputs.rejected,
            elapsed_ms: u64::try_from(session.scheduler().now().as_millis())
                .unwrap_or(u64::MAX),
            board: session.board().to_string().lines().map(str::to_owned).collect(),
        }
    }
}
