use std::{path::PathBuf, time::Duration};

use blockfall_engine::{GameConfig, GameSession, Intent, ManualScheduler, PieceSeed};
use serde::Deserialize;

use crate::{
    recorder::{EventRecorder, InputStats, SessionSummary},
    util::{self, Output},
};

/// A replay script.
///
/// ```json
/// {
///   "seed": "000102030405060708090a0b0c0d0e0f",
///   "steps": [{ "input": "Rotate" }, { "wait_ms": 800 }, { "input": "HardDrop" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
struct Script {
    /// Overrides the configured piece seed.
    #[serde(default)]
    seed: Option<PieceSeed>,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Step {
    Wait { wait_ms: u64 },
    Input { input: Intent },
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Path to the script file (JSON format)
    script: PathBuf,
    /// Write the summary to this file instead of stdout
    #[clap(long)]
    output: Option<PathBuf>,
    /// Print every rendered frame to stderr
    #[clap(long)]
    show_frames: bool,
}

pub(crate) fn run(config: GameConfig, arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        script,
        output,
        show_frames,
    } = arg;

    let script: Script = util::read_json_file("replay script", script)?;
    let summary = replay(config, &script, *show_frames)?;
    Output::save_json(&summary, output.clone())
}

fn replay(
    mut config: GameConfig,
    script: &Script,
    show_frames: bool,
) -> anyhow::Result<SessionSummary> {
    if let Some(seed) = script.seed {
        config.seed = Some(seed);
    }
    let mut session = GameSession::new(
        config,
        ManualScheduler::new(),
        EventRecorder::new(show_frames),
    )?;
    session.start_game();

    let mut inputs = InputStats::default();
    for (index, step) in script.steps.iter().enumerate() {
        if session.state().is_game_over() {
            tracing::info!(
                step = index,
                remaining = script.steps.len() - index,
                "game over, skipping remaining steps"
            );
            break;
        }
        match *step {
            Step::Wait { wait_ms } => session.advance(Duration::from_millis(wait_ms)),
            Step::Input { input } => inputs.record(input, session.handle_input(input)),
        }
    }

    Ok(SessionSummary::new(&session, inputs))
}
