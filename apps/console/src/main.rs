use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use console_core::{load_settings, HttpGateway, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "ocean-console", about = "Operator console for the Ocean Explorer ship API")]
struct Args {
    /// Overrides `api_base` from the config file and environment.
    #[arg(long)]
    api_base: Option<String>,
    /// Settings file; defaults to ./console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start with live-view auto refresh enabled.
    #[arg(long)]
    auto_refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    let api_base = settings.api_base_url()?;
    info!(%api_base, "starting operator console");

    let session = Session::new(
        Arc::new(HttpGateway::new(api_base)),
        settings.session_options(),
    );
    let printer = tokio::spawn(render::print_events(session.subscribe_events()));
    session.start().await;
    if args.auto_refresh {
        session.set_auto_refresh(true).await;
    }
    println!("type 'help' for commands");

    let mut text_input_focused = false;
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = line.context("failed to read operator input")?;
        match commands::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Focus(focused)) => text_input_focused = focused,
            // Commands run concurrently, like clicks on a page.
            Ok(command) => {
                tokio::spawn(commands::execute(
                    Arc::clone(&session),
                    command,
                    text_input_focused,
                ));
            }
            Err(message) if message.is_empty() => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    session.shutdown().await;
    printer.abort();
    info!("operator console stopped");
    Ok(())
}
