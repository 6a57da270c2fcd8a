//! Trackboard - A community track board: upload loops, upvote daily, climb
//! the weekly ranking

#![allow(dead_code)]

mod api;
mod config;
mod core;
mod db;
mod models;
mod storage;
mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Trackboard - community track ranking board
#[derive(Parser, Debug)]
#[command(name = "trackboard")]
#[command(version = "0.1.0")]
#[command(about = "A community track board: upload loops, upvote daily, climb the weekly ranking")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 4810)]
    port: u16,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // initialize logging with filters to suppress noisy dependency warnings
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},sqlx=warn,reqwest=warn,hyper=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Trackboard v0.1.0 starting...");

    // Initialize paths
    let paths = config::Paths::init(args.config)?;
    info!("Config directory: {:?}", paths.config_dir());

    run_setup().await?;

    // Start the server
    let addr = format!("{}:{}", args.host, args.port);
    info!("Server listening on http://{}", addr);

    use actix_cors::Cors;
    use actix_web::{middleware, App, HttpServer};

    HttpServer::new(|| {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

async fn run_setup() -> Result<()> {
    use crate::config::UserConfig;
    use crate::db::{run_migrations, setup_sqlite, DbEngine, UserTable};

    // Setup config file
    let mut config = UserConfig::load()?;
    let mut dirty = false;

    // Generate server ID if missing
    if config.server_id.is_empty() {
        config.server_id = uuid::Uuid::new_v4().to_string();
        dirty = true;
    }

    // sync env overrides on every startup (not just first-run) so docker
    // users can change them between restarts
    dirty |= config.apply_env_overrides();

    if dirty {
        config.save()?;
    }

    if config.bypass_upload_limit {
        tracing::warn!("Upload cooldown bypass is ENABLED; votes are unaffected");
    }
    if config.storage_access_key.is_empty() {
        tracing::warn!(
            "No storage access key configured. \
             Set BUNNYNET_ACCESS_TOKEN or edit settings.json; uploads will fail until then."
        );
    }

    // Setup database
    setup_sqlite().await?;

    let engine = DbEngine::get()?;
    run_migrations(engine.pool()).await?;

    let users = UserTable::count(engine.pool()).await?;
    if users == 0 {
        info!("No users yet; POST /auth/register to create the first account");
    }

    Ok(())
}
