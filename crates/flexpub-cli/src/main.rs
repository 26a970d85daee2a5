//! flexpub CLI - Publish compiled applications as debug and release JavaScript trees.

mod args;
mod colors;
mod deps;
mod publish;

use clap::{Parser, Subcommand};
use flexpub_core::AbortHandle;

use crate::args::PublishArgs;

#[derive(Parser)]
#[command(name = "flexpub")]
#[command(about = "Publish compiled applications as debug and release JavaScript trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the project: stage libraries, patch, optimize, assemble both trees
    Publish(#[command(flatten)] PublishArgs),

    /// Print the dependency manifest without writing the output trees
    Deps(#[command(flatten)] PublishArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Helper to format flexpub-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(publish_err) = err.downcast_ref::<flexpub_core::Error>() {
            anyhow::anyhow!("{}", publish_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Publish(args) => run_publish(args).await.map_err(format_error)?,
        Commands::Deps(args) => deps::execute(args).map_err(format_error)?,
    }

    Ok(())
}

/// Run the blocking publish off the async runtime so Ctrl-C can abort it.
async fn run_publish(args: PublishArgs) -> anyhow::Result<()> {
    let abort = AbortHandle::new();
    let task = tokio::task::spawn_blocking({
        let abort = abort.clone();
        move || publish::execute(args, abort)
    });
    tokio::pin!(task);

    tokio::select! {
        result = &mut task => result?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{}", colors::paint(colors::Tone::Muted, "Interrupted, aborting publish..."));
            abort.abort();
            task.await?
        }
    }
}
