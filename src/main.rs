mod cli;

use clap::{Parser, Subcommand};
use tracing::{debug, error, Level};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity of the program:
    /// -v for info, -vv for debug, and -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Superimpose a model structure onto a reference and report the RMSD
    Align(cli::align::Args),
    /// Thread a sequence onto a backbone and build a full-atom model
    Model(cli::model::Args),
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    debug!("{cli:?}");

    let result = match &cli.command {
        Commands::Align(args) => cli::align::run(args),
        Commands::Model(args) => cli::model::run(args),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
