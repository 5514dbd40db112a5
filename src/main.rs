//! Countdown CLI - drives a resend-code countdown in the terminal
//!
//! Useful for watching the engine behave:
//! - plain runs to completion
//! - manual stops
//! - offline starts being refused
//! - simulated background periods

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use countdown_button::cli::{Cli, Commands, Display, RunArgs};
use countdown_button::countdown::{
    CountdownDriver, CountdownEngine, CountdownEvent, CountdownHandle, SystemClock,
};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run_countdown(args).await?,
        Some(Commands::Completions { shell }) => generate_completions(shell),
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Runs one countdown until it finishes or is refused.
async fn run_countdown(args: RunArgs) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let engine = CountdownEngine::new(args.to_config(), SystemClock, event_tx)?;
    let (driver, handle) = CountdownDriver::new(engine);
    let driver_task = tokio::spawn(driver.run());

    handle.set_connectivity(!args.offline)?;
    handle.start()?;
    let script_handle = handle.clone();
    let steps = script_steps(&args);
    let script = tokio::spawn(async move {
        if let Err(e) = run_script(script_handle, steps).await {
            tracing::warn!(error = %e, "Scripted signal could not be delivered");
        }
    });

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                Display::show_event(&event, args.json);
                if matches!(event, CountdownEvent::Finished | CountdownEvent::NetworkFailed) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping countdown");
                handle.stop()?;
            }
        }
    }

    script.abort();
    handle.shutdown()?;
    driver_task.await?;
    Ok(())
}

/// Orders the scripted host signals requested on the command line.
///
/// Offsets are seconds after start; equal offsets keep push order so a
/// zero-length suspension still suspends before it resumes.
fn script_steps(args: &RunArgs) -> Vec<(u64, ScriptStep)> {
    let mut steps = Vec::new();
    if let Some(secs) = args.stop_after {
        steps.push((secs, ScriptStep::Stop));
    }
    if let Some((after, length)) = args.suspension() {
        steps.push((after, ScriptStep::Suspend));
        steps.push((after.saturating_add(length), ScriptStep::Resume));
    }
    steps.sort_by_key(|(at, _)| *at);
    steps
}

/// Replays scripted host signals against the running driver.
async fn run_script(handle: CountdownHandle, steps: Vec<(u64, ScriptStep)>) -> Result<()> {
    let mut elapsed = 0;
    for (at, step) in steps {
        tokio::time::sleep(Duration::from_secs(at.saturating_sub(elapsed))).await;
        elapsed = at;

        tracing::debug!(at, ?step, "Scripted signal");
        match step {
            ScriptStep::Stop => handle.stop()?,
            ScriptStep::Suspend => handle.suspend()?,
            ScriptStep::Resume => handle.resume()?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptStep {
    Stop,
    Suspend,
    Resume,
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
