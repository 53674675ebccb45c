use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod compile;
mod config;
mod inspect;
mod logging;
mod state;

use compile::CompileArgs;

#[derive(Parser, Debug)]
#[command(
    name = "remise",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("REMISE_BUILD_SHA"), ")"),
    about = "Compile bank remittance exports (prélèvements / virements) into one report"
)]
struct Cli {
    /// Log level: error, warn, info, debug, trace (default: config, then warn)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse every .csv export in a directory, print the report and write the sheet
    Compile {
        /// Directory holding the exports (default: current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Per-batch details and every diagnostic
        #[arg(short, long)]
        verbose: bool,

        /// Print the parsed batches as JSON instead of the table
        #[arg(long)]
        json: bool,

        /// Do not write the operations sheet
        #[arg(long)]
        no_export: bool,

        /// Sheet file name prefix (default: from config, "ops")
        #[arg(long)]
        prefix: Option<String>,

        /// Do not append a timestamp to the sheet file name
        #[arg(long)]
        no_timestamp: bool,
    },

    /// Show encoding, layout scores, metadata and table preview for one file
    Inspect {
        file: PathBuf,
    },

    /// Manage ~/.remise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // `config path` and `config init` must work with a broken config file
    let cfg = config::load_config();

    let verbose = matches!(cli.command, Command::Compile { verbose: true, .. });
    logging::setup_logging(logging::resolve_level(
        cli.log_level.as_deref(),
        config::log_level_or_default(&cfg),
        verbose,
    ));

    match cli.command {
        Command::Compile {
            dir,
            verbose,
            json,
            no_export,
            prefix,
            no_timestamp,
        } => {
            let args = CompileArgs {
                dir,
                verbose,
                json,
                no_export,
                prefix,
                no_timestamp,
            };
            compile::run_compile(&args, &cfg?)?;
        }

        Command::Inspect { file } => {
            inspect::run_inspect(&file)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}
