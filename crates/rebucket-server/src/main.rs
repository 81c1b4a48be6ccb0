//! # Rebucket Server
//!
//! Main binary. Serves the upload tree and redirects requests for legacy flat
//! media paths to their date-bucketed location. Also carries two operator
//! commands for inspecting and correcting individual redirects.

use clap::{Parser, Subcommand};
use rebucket_api::{build_router, AppState, UploadsMount};
use rebucket_common::config::AppConfig;
use rebucket_common::error::RebucketError;
use rebucket_core::{
    CacheBackend, MemoryCacheBackend, Outcome, RedirectCache, RedirectController,
    RedirectSettings,
};
use rebucket_db::Database;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "rebucket",
    version,
    about = "Redirect legacy media URLs to their current location"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default). Expects the schema to exist already.
    Serve,
    /// Create the attachment tables and indexes. Needs a role allowed to
    /// `CREATE EXTENSION pg_trgm`.
    Migrate,
    /// Resolve one request path against the metadata store and print the outcome
    Resolve {
        /// Request path, e.g. /src/files/photo.jpg
        path: String,
        /// Neither read nor populate the shared redirect cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Drop the cached redirect for a filename
    Purge {
        /// Bare filename, e.g. photo-300x200.jpg
        filename: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rebucket=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    // Load configuration, then connect to databases
    let startup = async {
        let config = rebucket_common::config::init()?;
        let db = Database::connect(config).await?;
        Ok::<_, RebucketError>((config, db))
    };
    let (config, db) = match startup.await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::Migrate => Ok(db.migrate().await?),
        Command::Resolve { path, no_cache } => resolve(config, &db, &path, no_cache).await,
        Command::Purge { filename } => purge(&db, &filename).await,
    }
}

fn build_controller(
    config: &AppConfig,
    db: &Database,
    cache: Arc<dyn CacheBackend>,
) -> RedirectController {
    let settings = RedirectSettings::from_config(&config.redirect);
    RedirectController::new(
        &settings,
        config.uploads.base_url.clone(),
        db.metadata_store(),
        cache,
    )
}

async fn serve(config: &AppConfig, db: Database) -> anyhow::Result<()> {
    tracing::info!("🚀 Starting Rebucket v{}", env!("CARGO_PKG_VERSION"));

    let controller = build_controller(config, &db, db.cache_backend());
    let uploads = UploadsMount {
        mount_path: config.uploads.mount_path()?,
        base_dir: PathBuf::from(&config.uploads.base_dir),
    };
    tracing::info!(
        "📦 Serving {} under '{}', redirecting legacy paths in '{}'",
        uploads.base_dir.display(),
        if uploads.mount_path.is_empty() { "/" } else { uploads.mount_path.as_str() },
        config.redirect.namespace
    );

    let state = AppState {
        db,
        controller: Arc::new(controller),
        uploads,
    };
    let router = build_router(state);
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("📡 Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn resolve(
    config: &AppConfig,
    db: &Database,
    path: &str,
    no_cache: bool,
) -> anyhow::Result<()> {
    let cache: Arc<dyn CacheBackend> = if no_cache {
        Arc::new(MemoryCacheBackend::new())
    } else {
        db.cache_backend()
    };
    let controller = build_controller(config, db, cache);

    match controller.resolve_path(path).await {
        Outcome::Resolved(redirect) => {
            println!("301 {} ({})", redirect.url, redirect.strategy.as_str());
        }
        Outcome::NotApplicable => println!("not applicable: path is not a legacy media path"),
        Outcome::Unresolved => println!("unresolved: no attachment matches"),
    }
    Ok(())
}

async fn purge(db: &Database, filename: &str) -> anyhow::Result<()> {
    if db.redis.is_none() {
        tracing::warn!("No Redis URL configured — nothing shared to purge");
        return Ok(());
    }

    let cache = RedirectCache::new(db.cache_backend());
    if cache.purge(filename).await? {
        println!("purged cached redirect for {filename}");
    } else {
        println!("no cached redirect for {filename}");
    }
    Ok(())
}
