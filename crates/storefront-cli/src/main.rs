use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use storefront_core::StorageKeyKind;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod import;
mod runs;

#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront catalog tools: bulk CSV product import")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import products and variants from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Store owner the products are created for
        #[arg(long, env = "STOREFRONT_OWNER_ID")]
        owner: Uuid,
        /// Read, validate and group the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a CSV file and print every row error
    Validate {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Write an example CSV file
    Template {
        /// Output path; prints to stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import run history
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum RunsCommands {
    /// Show the most recent import runs
    List {
        /// Only runs for this owner
        #[arg(long)]
        owner: Option<Uuid>,
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

impl Commands {
    /// Whether the command touches the database or storage and so needs the
    /// full application config.
    fn needs_config(&self) -> bool {
        match self {
            Commands::Import { dry_run, .. } => !dry_run,
            Commands::Db { .. } | Commands::Runs { .. } => true,
            Commands::Validate { .. } | Commands::Template { .. } => false,
        }
    }
}

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.command {
        Some(command) if command.needs_config() => Some(storefront_core::load_app_config()?),
        _ => None,
    };
    let log_level = config
        .as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(config) = &config {
        tracing::debug!(
            env = %config.env,
            bucket = %config.image_bucket,
            "configuration loaded"
        );
        if config.storage_key_kind == StorageKeyKind::Anon {
            tracing::warn!(
                env = %config.env,
                "SUPABASE_SERVICE_ROLE_KEY not set; uploading with the anon key"
            );
        }
    }

    let Some(command) = cli.command else {
        println!("storefront ready; run `storefront --help` for commands");
        return Ok(());
    };
    let require_config = || config.as_ref().context("application config was not loaded");

    match command {
        Commands::Import {
            file,
            dry_run: true,
            ..
        } => import::run_import_dry_run(&file)?,
        Commands::Import { file, owner, .. } => {
            let config = require_config()?;
            let pool = connect(config).await?;
            import::run_import(&pool, config, &file, owner).await?;
        }
        Commands::Validate { file } => import::run_validate(&file)?,
        Commands::Template { output } => import::run_template(output.as_deref())?,
        Commands::Db { command } => {
            let pool = connect(require_config()?).await?;
            match command {
                DbCommands::Ping => {
                    storefront_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = storefront_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Runs {
            command: RunsCommands::List { owner, limit },
        } => {
            let pool = connect(require_config()?).await?;
            runs::run_runs_list(&pool, owner, limit).await?;
        }
    }

    Ok(())
}

async fn connect(config: &storefront_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = storefront_db::PoolConfig::from_app_config(config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
