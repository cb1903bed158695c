mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool) {
    let filter = match verbosity {
        0 if debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        // local-id works without a config file
        Command::LocalId(args) => {
            init_tracing(cli.global.verbose, false);
            commands::local_id::handle(args, &cli.global)
        }

        command => {
            let config = zwdc_config::load_config(&cli.global.config);
            // The config's debug flag raises the default log level.
            init_tracing(
                cli.global.verbose,
                config.as_ref().is_ok_and(|c| c.debug),
            );
            let config = config?;

            tracing::debug!(?command, "dispatching command");
            commands::dispatch(command, &config, &cli.global).await
        }
    }
}
