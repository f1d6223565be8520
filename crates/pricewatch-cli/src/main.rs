mod check;
mod search;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "Track product prices on retail pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one product page and print what was extracted.
    Check {
        url: String,
        /// Allow one retry through the configured proxy if a challenge page persists.
        #[arg(long)]
        proxy: bool,
        /// Send this User-Agent instead of rotating.
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Run only the extractor on a saved HTML file.
    Extract { file: PathBuf },
    /// Search the configured store and check the first results.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Check every watchlist item, repeating on the configured interval.
    Watch {
        /// Overrides `PRICEWATCH_WATCHLIST_PATH`.
        #[arg(long)]
        watchlist: Option<PathBuf>,
        /// Run a single round and exit.
        #[arg(long)]
        once: bool,
    },
}

/// Log level used when no configuration is loaded and `RUST_LOG` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

impl Commands {
    /// Whether the command reads `PRICEWATCH_*` settings. `extract` works
    /// offline on a local file and must not fail on a bad environment.
    fn needs_config(&self) -> bool {
        !matches!(self, Self::Extract { .. })
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pricewatch-cli: run with --help to list commands");
        return Ok(());
    };

    if !command.needs_config() {
        init_tracing(DEFAULT_LOG_LEVEL)?;
        if let Commands::Extract { file } = &command {
            return check::run_extract(file);
        }
    }

    let config = pricewatch_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    match command {
        Commands::Check {
            url,
            proxy,
            user_agent,
        } => check::run_check(&config, &url, proxy, user_agent).await,
        Commands::Extract { file } => check::run_extract(&file),
        Commands::Search { query, limit } => {
            search::run_search(&config, &query.join(" "), limit).await
        }
        Commands::Watch { watchlist, once } => {
            watch::run_watch(&config, watchlist.as_deref(), once).await
        }
    }
}
