use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldscope::commands::{analyze_command, init_config_command, inspect_command, AnalyzeArgs};
use fieldscope::tracing_config::init_tracing;

/// Required-field analysis for JVM repository call sites.
///
/// This CLI is a thin wrapper around `fieldscope-core` (exposed in code as
/// `fieldscope_core`). All substantive logic lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "fieldscope",
    version,
    about = "Compute the aggregate-root fields each repository call site needs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze compiled classes and write the required-fields report.
    ///
    /// An existing report at the output path is merged: callers of classes
    /// not scanned in this pass are kept.
    Analyze {
        /// Configuration file (`.yaml`, `.yml` or `.json`).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory tree of `.class` files. Repeatable; overrides the config.
        #[arg(long = "classes")]
        classes: Vec<PathBuf>,

        /// Report path. Overrides the config.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Replace the existing report instead of merging into it.
        #[arg(long, default_value_t = false)]
        no_merge: bool,

        /// Abort when more class files than this are discovered.
        #[arg(long)]
        max_classes: Option<usize>,

        /// Limit helper-call depth followed from each caller.
        #[arg(long)]
        max_call_depth: Option<u32>,

        /// Decode worker threads.
        #[arg(long)]
        threads: Option<usize>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Decode a single class file and print its model.
    Inspect {
        /// Path to a `.class` file.
        path: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Write a default configuration file.
    InitConfig {
        /// Where to write the configuration.
        #[arg(long, default_value = "fieldscope.yaml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            config,
            classes,
            output,
            no_merge,
            max_classes,
            max_call_depth,
            threads,
            json,
        } => analyze_command(&AnalyzeArgs {
            config,
            classes,
            output,
            no_merge,
            max_classes,
            max_call_depth,
            threads,
            json,
        })?,
        Command::Inspect { path, json } => inspect_command(&path, json)?,
        Command::InitConfig { path, force } => init_config_command(&path, force)?,
    }

    Ok(())
}
