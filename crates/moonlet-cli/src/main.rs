use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod inspect;
mod snapshot;
mod utils;


use inspect::{handle_inspect, handle_locals, handle_traceback};

/// Get the version string including git revision
fn version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (git:", env!("GIT_HASH"), ")")
}

#[derive(Parser)]
#[command(
    author,
    version = version(),
    about = "Inspect moonlet call-stack snapshots through the debug library",
    long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    /// Runtime configuration file (RON)
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print debug.getinfo for each level of a snapshot as JSON
    Inspect {
        /// The snapshot file (RON), or "-" for stdin
        snapshot: String,
        /// Fields to report, as in debug.getinfo
        #[arg(long, default_value = "flnStu")]
        what: String,
        /// Only report this level (1 is the most recent frame)
        #[arg(long)]
        level: Option<usize>,
    },
    /// Print debug.traceback for a snapshot
    Traceback {
        snapshot: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List the locals visible at a level
    Locals {
        snapshot: String,
        #[arg(long, default_value_t = 1)]
        level: usize,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Inspect {
            snapshot,
            what,
            level,
        } => handle_inspect(snapshot, config, what, *level),
        Commands::Traceback { snapshot, message } => {
            handle_traceback(snapshot, config, message.as_deref())
        }
        Commands::Locals { snapshot, level } => handle_locals(snapshot, config, *level),
    }
}
