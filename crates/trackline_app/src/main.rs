// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trackline - timeline engine driver
//!
//! Replays a scripted input session against the timeline engine and prints
//! the resulting timeline state:
//! - Pointer gestures on the ruler, track content and zoom bar
//! - Content scrollbar moves
//! - Timer-driven playhead moves
//! - Raw timeline events and undo/redo
//!
//! ## Usage
//!
//! `trackline [SCRIPT.ron] [--config CONFIG.ron]`
//!
//! Without a script the built-in walkthrough is replayed. A config file
//! overrides the config embedded in the script.

mod script;

use clap::Parser;
use script::Script;
use std::path::PathBuf;
use std::process::ExitCode;
use trackline_timeline::TimelineConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "trackline", version)]
#[command(about = "Replay a scripted input session against the timeline engine")]
struct Args {
    /// Script to replay; the built-in walkthrough when omitted
    script: Option<PathBuf>,

    /// Timeline config overriding the one embedded in the script
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["trackline_timeline=debug", "trackline_app=info"] {
        match directive.parse() {
            Ok(d) => env_filter = env_filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive {directive}: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();
    tracing::info!("Starting Trackline v{}", env!("CARGO_PKG_VERSION"));

    let mut script = match &args.script {
        Some(path) => match Script::load(path) {
            Ok(script) => script,
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::info!("No script given, replaying the built-in walkthrough");
            Script::demo()
        }
    };

    if let Some(path) = &args.config {
        match TimelineConfig::load(path) {
            Ok(config) => script.config = Some(config),
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let session = script.run();
    let state = session.state();
    tracing::info!(
        version = state.version,
        undo_depth = session.controller().history().undo_depth(),
        "Replay finished"
    );

    match ron::ser::to_string_pretty(state, ron::ser::PrettyConfig::default()) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to serialize timeline state: {e}");
            ExitCode::FAILURE
        }
    }
}
