mod cli;

use homily::{config, import, ingest::UploadStore, server};
use homily_db::pool::{get_conn, init_pool, DbPool};
use homily_db::queries::records;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

/// Open the catalog, creating its parent directory on first run.
fn open_catalog(config: &config::Config) -> Result<DbPool> {
    let db_path = &config.storage.database_path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    Ok(init_pool(&db_path_str)?)
}

/// Make the upload directory absolute so stored paths survive a change of
/// working directory.
fn resolve_upload_dir(config: &mut config::Config) -> Result<()> {
    let dir = &config.storage.upload_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create upload directory {:?}", dir))?;
    config.storage.upload_dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Failed to resolve upload directory {:?}", dir))?;
    Ok(())
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;
    resolve_upload_dir(&mut config)?;

    tracing::info!("Starting homily server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Storing uploads in {:?}", config.storage.upload_dir);

    let db_pool = open_catalog(&config)?;
    server::start_server(config, db_pool).await
}

async fn run_import(dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    resolve_upload_dir(&mut config)?;

    let db_pool = open_catalog(&config)?;
    let store = UploadStore::new(
        config.storage.upload_dir.clone(),
        config.storage.max_upload_bytes,
    );

    let summary = import::import_directory(&db_pool, &store, dir).await?;
    let total = records::count_records(&*get_conn(&db_pool)?)?;

    println!(
        "Imported {} file(s), {} failed. Catalog now holds {} recording(s).",
        summary.imported, summary.failed, total
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "homily=trace,homily_db=debug,tower_http=debug".to_string()
        } else {
            "homily=debug,homily_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Import { dir } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_import(&dir, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("homily {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config_summary(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  CORS origins: {}", config.server.cors_origins.join(", "));
    println!("  Database: {:?}", config.storage.database_path);
    println!("  Uploads: {:?}", config.storage.upload_dir);
    println!(
        "  Upload limit: {} MiB",
        config.storage.max_upload_bytes / (1024 * 1024)
    );
}
