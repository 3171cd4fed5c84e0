use std::{path::PathBuf, time::Duration};

use blockfall_engine::{GameConfig, GameSession, Intent, ManualScheduler};
use rand::{Rng as _, SeedableRng as _, rngs::StdRng};

use crate::{
    recorder::{EventRecorder, InputStats, SessionSummary},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Maximum number of inputs to send
    #[clap(long, default_value_t = 10_000)]
    max_steps: usize,
    /// Virtual time between two inputs, in milliseconds
    #[clap(long, default_value_t = 100)]
    step_ms: u64,
    /// Seed for the random inputs; random when omitted
    #[clap(long)]
    input_seed: Option<u64>,
    /// Write the summary to this file instead of stdout
    #[clap(long)]
    output: Option<PathBuf>,
    /// Print every rendered frame to stderr
    #[clap(long)]
    show_frames: bool,
}

pub(crate) fn run(config: GameConfig, arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        max_steps,
        step_ms,
        input_seed,
        output,
        show_frames,
    } = arg;

    let input_seed = input_seed.unwrap_or_else(rand::random);
    tracing::info!(input_seed, "auto-play started");
    let summary = auto_play(
        config,
        *max_steps,
        Duration::from_millis(*step_ms),
        input_seed,
        *show_frames,
    )?;
    Output::save_json(&summary, output.clone())
}

fn auto_play(
    config: GameConfig,
    max_steps: usize,
    step: Duration,
    input_seed: u64,
    show_frames: bool,
) -> anyhow::Result<SessionSummary> {
    let mut rng = StdRng::seed_from_u64(input_seed);
    let mut session = GameSession::new(
        config,
        ManualScheduler::new(),
        EventRecorder::new(show_frames),
    )?;
    session.start_game();

    let mut inputs = InputStats::default();
    for _ in 0..max_steps {
        if session.state().is_game_over() {
            break;
        }
        let intent = Intent::ALL[rng.random_range(0..Intent::ALL.len())];
        inputs.record(intent, session.handle_input(intent));
        session.advance(step);
    }

    Ok(SessionSummary::new(&session, inputs))
}
