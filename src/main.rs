use anyhow::Context;
use blog_service::config::Config;
use blog_service::logging;
use blog_service::server;
use blog_service::service::ContentService;
use blog_service::storage::{InMemoryStorage, Storage};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "db")]
use blog_service::{db::DatabaseManager, migrations::Migrator, storage::DatabaseStorage};

#[derive(Parser)]
#[command(name = "blog_service")]
#[command(about = "Accounts, posts and comments over REST and GraphQL")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on, overriding config and PORT
        #[arg(long)]
        port: Option<u16>,
        /// Keep everything in memory instead of opening the database
        #[arg(long)]
        in_memory: bool,
    },
    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply every pending migration
    Up,
    /// Revert the most recently applied migration
    Down,
    /// List migrations and when they were applied
    Status,
}

async fn open_storage(config: &Config, in_memory: bool) -> anyhow::Result<Arc<dyn Storage>> {
    if in_memory {
        info!("Using in-memory storage");
        return Ok(Arc::new(InMemoryStorage::new()));
    }

    #[cfg(feature = "db")]
    {
        let storage = DatabaseStorage::open(&config.database.path)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.path))?;
        info!("Using database {}", config.database.path);
        return Ok(Arc::new(storage));
    }

    #[cfg(not(feature = "db"))]
    {
        let _ = config;
        anyhow::bail!("built without the db feature; run with --in-memory")
    }
}

#[cfg(feature = "db")]
async fn migrate(config: &Config, action: MigrateAction) -> anyhow::Result<()> {
    let db = DatabaseManager::open(&config.database.path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let migrator = Migrator::new(&db);

    match action {
        MigrateAction::Up => {
            let applied = migrator.apply_pending().await?;
            if applied.is_empty() {
                println!("Schema is up to date");
            }
            for name in applied {
                println!("Applied {name}");
            }
        }
        MigrateAction::Down => match migrator.revert_last().await? {
            Some(name) => println!("Reverted {name}"),
            None => println!("Nothing to revert"),
        },
        MigrateAction::Status => {
            for status in migrator.status().await? {
                match status.applied_at {
                    Some(at) => println!("[x] {}  (applied {})", status.name, at),
                    None => println!("[ ] {}", status.name),
                }
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn migrate(_config: &Config, _action: MigrateAction) -> anyhow::Result<()> {
    anyhow::bail!("built without the db feature; there is no schema to migrate")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    let _guard = logging::init_logging(config.logging.directory.as_deref());

    match cli.command {
        Commands::Serve { port, in_memory } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            // No request is served without a working store
            let storage = match open_storage(&config, in_memory).await {
                Ok(storage) => storage,
                Err(e) => {
                    error!("Startup failed: {:#}", e);
                    return Err(e);
                }
            };
            server::start_server(ContentService::new(storage), &config.server).await?;
        }
        Commands::Migrate { action } => migrate(&config, action).await?,
    }
    Ok(())
}
