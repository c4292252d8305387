//! Storyloom replay - decode a saved session transcript and print it.
//!
//! Usage: `storyloom-replay [transcript.json]`. Without an argument the path
//! comes from `STORYLOOM_TRANSCRIPT`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyloom_engine::infrastructure::config::{
    load_dotenv_from_repo_root, EngineConfig, DEFAULT_LOG_FILTER,
};
use storyloom_engine::infrastructure::transcript_file::FileTranscriptSource;
use storyloom_engine::use_cases::session::state_to_wire;
use storyloom_engine::use_cases::{ReplayConfig, ReplaySummary, ReplayTranscript};

/// Locations shown in the travel path.
const PATH_LENGTH: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    let config = EngineConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.transcript_path.clone())
        .context("usage: storyloom-replay <transcript.json> (or set STORYLOOM_TRANSCRIPT)")?;

    let source = Arc::new(FileTranscriptSource::new(path.clone()));
    tracing::info!(path = %source.path().display(), "Replaying transcript");

    let replay = ReplayTranscript::new(
        source,
        ReplayConfig {
            max_turns: config.max_turns,
            max_integrity: config.max_integrity,
        },
    );

    let summary = replay
        .execute()
        .await
        .with_context(|| format!("failed to replay {}", path.display()))?;

    print_transcript(&summary);
    print_summary(&summary);

    let wire = state_to_wire(summary.session.state());
    println!("wire state: {}", serde_json::to_string(&wire)?);

    Ok(())
}

fn print_transcript(summary: &ReplaySummary) {
    for view in summary.session.views() {
        if view.role.is_game_master() {
            println!("{}", view.narrative);
        } else {
            println!("> {}", view.narrative);
        }

        if let Some(notice) = view.notice {
            for line in notice.lines() {
                println!("  [{}]", line);
            }
        }

        for (index, option) in view.options.iter().enumerate() {
            let marker = if view.selectable { "*" } else { " " };
            println!("  {}{}. {}", marker, index + 1, option);
        }
        println!();
    }
}

fn print_summary(summary: &ReplaySummary) {
    let session = &summary.session;
    let state = session.state();

    println!("--- {} messages across {} page(s)", summary.messages, summary.pages);
    println!(
        "turns: {}/{}{}",
        session.turn_count(),
        session.max_turns(),
        if session.is_over() {
            " (over)"
        } else if session.is_nearing_end() {
            " (nearing end)"
        } else {
            ""
        }
    );
    println!(
        "decoded: {} structured, {} recovered, {} raw",
        summary.structured_turns, summary.recovered_turns, summary.raw_turns
    );
    println!("integrity: {}/{}", state.integrity(), state.max_integrity());
    println!(
        "location: {}",
        state.current_location().unwrap_or("unknown")
    );
    println!("path: {}", session.recent_path(PATH_LENGTH).join(" -> "));
    println!("inventory: {}", state.inventory().join(", "));
    println!("contacts: {}", state.met_npcs().join(", "));
    println!("data: {}", state.discoveries().join(", "));
}
