//! Text-mode REPL front end for the orbit assistant core.
//!
//! Reads commands from stdin, prints the transcript to stdout, and logs to
//! stderr. Runs with the capture-free speech adapter, so "spoken" responses
//! appear as transcript text only.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orbit::config::AssistantConfig;
use orbit::dispatch::Dispatcher;
use orbit::llm::LlmClient;
use orbit::session::{Session, SessionNotice};
use orbit::speech::NullSpeech;
use orbit::system::NoBackend;
use orbit::transcript::EntryKind;

/// Orbit: conversational assistant with local intent rules and LLM fallback.
#[derive(Parser)]
#[command(name = "orbit", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing goes to stderr only; stdout carries the conversation.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbit=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => AssistantConfig::load(path)?,
        None => AssistantConfig::load_default()?,
    };

    info!(model = %config.llm.api_model, "orbit starting");

    let (speech_tx, speech_rx) = mpsc::unbounded_channel();
    let speech = Arc::new(NullSpeech::new(speech_tx));
    let dispatcher = Dispatcher::new(LlmClient::new(config.llm), Arc::new(NoBackend));
    let (session, handle) = Session::new(
        dispatcher,
        speech,
        speech_rx,
        config.session,
        config.speech,
    );

    let mut notices = handle.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice {
                SessionNotice::Entry(entry) => {
                    let tag = match entry.kind {
                        EntryKind::User => "you",
                        EntryKind::System => "orbit",
                        EntryKind::Error => "error",
                    };
                    println!("[{tag}] {}", entry.text);
                }
                SessionNotice::Progress(line) => println!("[orbit] {line}"),
                SessionNotice::Flags(_) | SessionNotice::Processing(_) => {}
            }
        }
    });

    let session_task = tokio::spawn(session.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        handle.submit_text(line);
    }

    handle.shutdown();
    let _ = session_task.await;
    printer.abort();
    info!("orbit stopped");
    Ok(())
}
