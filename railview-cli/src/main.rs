//! Railview CLI - headless operator console
//!
//! Drives the railview core against a running simulation server: follow the
//! live run, step or reset it, and inspect conflicts.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::alerts::AlertsArgs;
use commands::common::{ConnectArgs, SeverityArg};
use commands::config::ConfigCommands;
use commands::control::ControlAction;
use commands::watch::WatchArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "railview")]
#[command(version, about = "Live rail simulation console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or refresh the configuration file
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Follow the live simulation until interrupted
    Watch {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Show every prediction, not just the top high-risk ones
        #[arg(long)]
        show_all: bool,

        /// Only show predictions of these severities (repeatable)
        #[arg(long = "severity", value_enum)]
        severities: Vec<SeverityArg>,

        /// Seconds between status prints
        #[arg(long, default_value_t = 5)]
        print_interval: u64,

        /// Print interpolated train positions
        #[arg(long)]
        positions: bool,
    },

    /// Show the current simulation state without advancing it
    State {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Advance the simulation by one tick
    Step {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Advance the simulation by several ticks (at most 100)
    MultiStep {
        /// Number of ticks
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Restart the simulation from tick zero
    Reset {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Show the alert feed and optionally inspect one conflict
    Alerts {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Show every prediction, not just the top high-risk ones
        #[arg(long)]
        show_all: bool,

        /// Only show predictions of these severities (repeatable)
        #[arg(long = "severity", value_enum)]
        severities: Vec<SeverityArg>,

        /// Conflict id to inspect
        #[arg(long)]
        inspect: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Watch {
            connect,
            show_all,
            severities,
            print_interval,
            positions,
        } => commands::watch::run(WatchArgs {
            connect,
            show_all,
            severities,
            print_interval,
            positions,
        }),
        Commands::State { connect } => commands::control::run(ControlAction::State, connect),
        Commands::Step { connect } => commands::control::run(ControlAction::Step, connect),
        Commands::MultiStep { count, connect } => {
            commands::control::run(ControlAction::MultiStep(count), connect)
        }
        Commands::Reset { connect } => commands::control::run(ControlAction::Reset, connect),
        Commands::Alerts {
            connect,
            show_all,
            severities,
            inspect,
        } => commands::alerts::run(AlertsArgs {
            connect,
            show_all,
            severities,
            inspect,
        }),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(error: &CliError) {
    eprintln!("Error: {}", error);
}
