//! Driver command-line interface for the batch-scheduler core.
//!
//! The pipeline wraps this binary to submit its stages; each invocation
//! resolves the configuration, selects a backend (honouring the single-letter
//! selector flags), and performs one scheduler operation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{array, detect, slots, submit, wait};

/// ASHS batch-scheduler driver.
#[derive(Parser)]
#[command(name = "ashs-sched")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Force the SLURM backend
    #[arg(short = 'S', long = "slurm", global = true)]
    use_slurm: bool,

    /// Force the SGE backend
    #[arg(short = 'Q', long = "sge", global = true)]
    use_sge: bool,

    /// Force the LSF backend
    #[arg(short = 'l', long = "lsf", global = true)]
    use_lsf: bool,

    /// Force the GNU parallel backend
    #[arg(short = 'P', long = "parallel", global = true)]
    use_parallel: bool,

    /// Explicit configuration file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the backend that would be selected
    Detect,

    /// Submit a single job script
    Submit {
        /// Pipeline stage index, selects per-stage resource overrides
        #[arg(long, default_value = "0")]
        stage: u32,

        /// Job name; defaults to the script file stem
        #[arg(long)]
        name: Option<String>,

        /// Block until the job terminates
        #[arg(long)]
        sync: bool,

        /// Job script
        script: PathBuf,

        /// Positional arguments passed to the script
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Submit a parameter sweep (1-D, or 2-D with --inner)
    Array {
        /// Pipeline stage index
        #[arg(long, default_value = "0")]
        stage: u32,

        /// Base job name
        #[arg(long)]
        name: String,

        /// Space-separated parameter values
        #[arg(long)]
        values: String,

        /// Inner parameter values for a 2-D Cartesian sweep
        #[arg(long)]
        inner: Option<String>,

        /// Job script
        script: PathBuf,

        /// Fixed arguments placed before the sweep parameters
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Block until the given job identifiers are all terminal
    Wait {
        /// Identifiers as printed by submit/array
        ids: Vec<String>,
    },

    /// Report the slot count of the current execution context
    Slots,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let selection = commands::Selection {
        config_path: cli.config.clone(),
        selector: selector_from_flags(&cli),
    };

    let result = match cli.command {
        Commands::Detect => detect::execute(&selection).await,

        Commands::Submit {
            stage,
            name,
            sync,
            script,
            args,
        } => submit::execute(&selection, stage, name.as_deref(), sync, &script, args).await,

        Commands::Array {
            stage,
            name,
            values,
            inner,
            script,
            args,
        } => {
            array::execute(
                &selection,
                stage,
                &name,
                &values,
                inner.as_deref(),
                &script,
                args,
            )
            .await
        }

        Commands::Wait { ids } => wait::execute(&selection, &ids).await,

        Commands::Slots => slots::execute(&selection).await,
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

/// The first selector flag wins; absence means automatic detection.
fn selector_from_flags(cli: &Cli) -> Option<ashs_sched::BackendKind> {
    use ashs_sched::BackendKind;
    if cli.use_slurm {
        Some(BackendKind::Slurm)
    } else if cli.use_sge {
        Some(BackendKind::Sge)
    } else if cli.use_lsf {
        Some(BackendKind::Lsf)
    } else if cli.use_parallel {
        Some(BackendKind::Parallel)
    } else {
        None
    }
}
