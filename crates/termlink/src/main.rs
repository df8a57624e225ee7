//! # termlink
//!
//! Opens a local shell, or a remote shell with `--host`, and attaches it to
//! the console: stdin is typed into the session and output goes to stdout.
//! Logs go to stderr.

use std::io::BufReader;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use termlink::cli::USAGE;
use termlink::{
    find_action, next_line, spawn_line_reader, CliOptions, ConsolePrompt, ConsoleView,
    SharedLines,
};
use termlink_core::{ActionCategory, AppConfig};
use termlink_session::{open_connector, ActionRegistry, SessionEvent, TerminalSession};

#[cfg(feature = "ssh")]
type Transport = termlink_connector::SshTransport;
#[cfg(not(feature = "ssh"))]
type Transport = termlink_connector::NoTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = CliOptions::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match &options.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if options.list_actions {
        for category in ActionCategory::ALL {
            for action in config.catalog(category)?.iter() {
                println!("{}\t{}", category, action.name());
            }
        }
        return Ok(());
    }

    let mut actions = Vec::new();
    for name in &options.actions {
        match find_action(&config, name)? {
            Some(action) => actions.push(action),
            None => anyhow::bail!("no action named '{name}'"),
        }
    }

    tracing::info!("termlink v{} starting", env!("CARGO_PKG_VERSION"));

    let params = options.connection_params();
    let connector = open_connector(&params, Arc::new(Transport::default()), &config)?;

    let lines = spawn_line_reader(BufReader::new(std::io::stdin()));
    let prompt = Arc::new(ConsolePrompt::new(Arc::clone(&lines), std::io::stderr()));

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let view = Arc::new(ConsoleView::new(input_tx.clone()));
    let registry = ActionRegistry::with_defaults(view, &config)?;

    let (session, mut events) = TerminalSession::start(connector, prompt, &Handle::current());
    let mut stdout = tokio::io::stdout();
    let mut exit_code = 0;
    let mut connected = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Connected => {
                        connected = true;
                        tracing::info!("Connected to {}", session.name());
                        for action in &actions {
                            if !registry.dispatch(action) {
                                tracing::warn!("Action '{}' had no effect", action.name());
                            }
                        }
                        forward_lines(Arc::clone(&lines), input_tx.clone());
                    }
                    SessionEvent::Output(text) => {
                        stdout.write_all(text.as_bytes()).await?;
                        stdout.flush().await?;
                    }
                    SessionEvent::Error(message) => {
                        tracing::error!("{}", message);
                    }
                    SessionEvent::Inactive => {
                        tracing::info!("Session inactive");
                        if !connected {
                            exit_code = 1;
                            break;
                        }
                    }
                    SessionEvent::Exited(code) => {
                        tracing::info!("Session exited with code {}", code);
                        exit_code = code;
                        break;
                    }
                }
            }
            Some(text) = input_rx.recv() => {
                if let Err(e) = session.send_input(&text) {
                    tracing::error!("Failed to send input: {}", e);
                }
            }
        }
    }

    session.close();
    tracing::info!("termlink shutting down");

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

/// Type console lines into the session until stdin ends.
fn forward_lines(lines: SharedLines, input: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        while let Some(line) = next_line(&lines) {
            if input.send(line).is_err() {
                return;
            }
        }
        tracing::debug!("Console input ended");
    });
}
