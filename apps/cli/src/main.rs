use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pitstops_cli::{
    commands::{run_shell, Printer},
    config::AppConfig,
    session::{self, HomeSession},
};

#[derive(Parser, Debug)]
#[command(version, about = "Record and review pit stops for one session", long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file; defaults to the per-user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON, one document per line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read commands from stdin until `quit`
    Shell {
        /// Start with the sample pit stops loaded
        #[arg(long)]
        seed: bool,
    },
    /// Load the sample pit stops and print the home summary
    Demo,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    let mut session = HomeSession::new(config);
    let mut printer = Printer::new(io::stdout().lock(), args.json);

    match args.command {
        Commands::Shell { seed } => {
            if seed {
                session::seed(&mut session).context("loading sample pit stops")?;
            }
            if !args.json {
                printer.message("type `help` for commands")?;
            }
            run_shell(&mut session, io::stdin().lock(), &mut printer)?;
        }
        Commands::Demo => {
            session::seed(&mut session).context("loading sample pit stops")?;
            printer.summary(&session.summary())?;
        }
    }
    Ok(())
}
