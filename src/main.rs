use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheetpipe::remote::local::LocalDrive;
use sheetpipe::{EtlError, EtlRunner, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => execute_run(args),
    }
}

fn execute_run(args: RunArgs) -> Result<()> {
    if !args.drive.is_dir() {
        return Err(EtlError::MissingInput(args.drive));
    }

    let drive = LocalDrive::new(&args.drive);
    let runner = EtlRunner::new(drive.clone(), drive)?;
    runner.run(&args.config, args.from_folder)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Run a configuration-driven spreadsheet ETL pipeline."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one full pipeline run.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Root directory standing in for the remote drive.
    #[arg(long)]
    drive: PathBuf,

    /// Configuration file id (path relative to the drive root), or a folder
    /// id when --from-folder is set.
    #[arg(long)]
    config: String,

    /// Treat the configuration location as a folder and pick its most
    /// recently modified YAML file.
    #[arg(long)]
    from_folder: bool,
}
