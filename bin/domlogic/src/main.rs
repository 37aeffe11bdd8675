mod commands;

use clap::{Parser, Subcommand};
use commands::query::{QueryArgs, RelationCommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "domlogic")]
#[command(about = "Logic relations over a live browser DOM", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one relation against a page and print every answer
    Query {
        /// Load this URL before querying
        #[arg(long)]
        url: Option<String>,

        /// Attach to this page WebSocket endpoint instead of launching a browser
        #[arg(long)]
        ws: Option<String>,

        /// Query this HTML file offline instead of a live browser
        #[arg(long, value_name = "FILE", conflicts_with = "ws")]
        html: Option<PathBuf>,

        /// Selector for elements considered when an element is unknown
        #[arg(long)]
        root_scope: Option<String>,

        /// Selector for elements considered beneath a known parent
        #[arg(long)]
        child_scope: Option<String>,

        /// Stop after this many answers
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[command(subcommand)]
        relation: RelationCommand,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run environment diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Query {
            url,
            ws,
            html,
            root_scope,
            child_scope,
            limit,
            relation,
        } => {
            commands::query::run(QueryArgs {
                url,
                ws,
                html,
                root_scope,
                child_scope,
                limit,
                relation,
            })?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show()?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(force)?;
            }
        },
        Commands::Doctor => {
            commands::doctor::run()?;
        }
    }

    Ok(())
}
