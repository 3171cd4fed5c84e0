use std::path::PathBuf;

use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, replay::ReplayArg};
use crate::util::{self, Output};

mod auto_play;
mod replay;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Game rules as a TOML file; built-in defaults when omitted
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Use the minimal rule set (no hold, no lock delay, fixed speed) as the base
    #[clap(long, global = true)]
    classic: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run a scripted sequence of inputs and waits, then print a summary
    Replay(#[clap(flatten)] ReplayArg),
    /// Play with random inputs until game over or a step limit
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Print the effective configuration as TOML
    ShowConfig,
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let config = util::load_config(args.config.as_deref(), args.classic)?;
    match args.mode {
        Mode::Replay(arg) => replay::run(config, &arg)?,
        Mode::AutoPlay(arg) => auto_play::run(config, &arg)?,
        Mode::ShowConfig => Output::stdout().write_toml(&config)?,
    }
    Ok(())
}
