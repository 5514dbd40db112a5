//! Command definitions for the countdown demo CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::types::CountdownConfig;

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown button demo
#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "Drive a resend-code countdown in the terminal",
    long_about = "Runs one countdown engine against the real wall clock and prints\n\
                  what a resend-code button would show on every change.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a countdown until it finishes
    Run(RunArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Countdown duration in seconds
    #[arg(
        short,
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub duration: u64,

    /// Nominal tick period in milliseconds
    #[arg(
        long,
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub tick_ms: u64,

    /// Report no connectivity before starting
    #[arg(long)]
    pub offline: bool,

    /// Stop the countdown manually after this many seconds
    #[arg(
        long,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(0..=86_400)
    )]
    pub stop_after: Option<u64>,

    /// Simulate the app going to the background after this many seconds
    #[arg(
        long,
        value_name = "SECS",
        requires = "suspend_for",
        value_parser = clap::value_parser!(u64).range(0..=86_400)
    )]
    pub suspend_after: Option<u64>,

    /// How long the simulated background period lasts
    #[arg(
        long,
        value_name = "SECS",
        requires = "suspend_after",
        value_parser = clap::value_parser!(u64).range(0..=86_400)
    )]
    pub suspend_for: Option<u64>,

    /// Print each event as a JSON line
    #[arg(long)]
    pub json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            duration: 30,
            tick_ms: 1_000,
            offline: false,
            stop_after: None,
            suspend_after: None,
            suspend_for: None,
            json: false,
        }
    }
}

impl RunArgs {
    /// Builds the countdown configuration for these arguments.
    pub fn to_config(&self) -> CountdownConfig {
        CountdownConfig::default()
            .with_duration_secs(self.duration)
            .with_tick_interval_ms(self.tick_ms)
    }

    /// Returns the simulated suspension as (after, length) in seconds.
    pub fn suspension(&self) -> Option<(u64, u64)> {
        self.suspend_after.zip(self.suspend_for)
    }
}

// ============================================================================
// Tests
// ============================================================================
