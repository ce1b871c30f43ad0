mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;
use commands::analyze::Mode;

const DEFAULT_FILTER: &str = "ctrlcmd=info";

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("ctrlcmd=debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = Config::load()?;
    let root = config.source_root(cli.source_root.as_deref());

    match cli.command {
        Commands::Analyze {
            class,
            pattern,
            method_id,
            stats,
            format,
            generated_dir,
        } => {
            let generated_dir = config.generated_dir(generated_dir, root.as_deref())?;
            let mode = if let Some(id) = method_id.as_deref() {
                Mode::Lookup { method_id: id }
            } else if stats {
                Mode::Stats
            } else {
                Mode::List {
                    pattern: pattern.as_deref(),
                }
            };
            commands::analyze::handle(&generated_dir, &class, mode, format)?;
        }

        Commands::Classes {
            generated_dir,
            format,
        } => {
            let generated_dir = config.generated_dir(generated_dir, root.as_deref())?;
            commands::classes::handle(&generated_dir, format)?;
        }

        Commands::Generate {
            ctrl_dir,
            output,
            check,
        } => {
            let ctrl_dir = config.ctrl_dir(ctrl_dir, root.as_deref())?;
            let output = config.output(output, root.as_deref())?;
            commands::generate::handle(&ctrl_dir, &output, &config.deny_fragments, check)?;
        }

        Commands::Configure { show } => {
            commands::configure::handle(cli.source_root, show)?;
        }
    }

    Ok(())
}
