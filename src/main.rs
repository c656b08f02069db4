//! Database Gateway - Main entry point.
//!
//! Serves MCP (Model Context Protocol) tools for AI assistants over the
//! SQL databases configured through `DB_<NAME>_*` environment variables.

use clap::Parser;
use db_gateway::config::{Config, TransportMode, load_databases_from_env, mask_credentials};
use db_gateway::db::AdapterRegistry;
use db_gateway::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Output goes to stderr so stdout stays
/// reserved for the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let databases = match load_databases_from_env() {
        Ok(databases) => databases,
        Err(e) => {
            error!(error = %e, "Invalid database configuration");
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("Configure each database with environment variables:");
            eprintln!("  DB_<NAME>_TYPE=postgresql|mysql|sqlite|db2");
            eprintln!("  DB_<NAME>_CONNECTION_STRING=<url>");
            eprintln!("  or DB_<NAME>_HOST / _PORT / _DATABASE / _USERNAME / _PASSWORD");
            eprintln!("  optional: DB_<NAME>_READ_ONLY (default true), _POOL_SIZE, _POOL_TIMEOUT");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  DB_APP_TYPE=sqlite DB_APP_CONNECTION_STRING=sqlite:///data/app.db");
            eprintln!("  DB_SALES_TYPE=postgresql DB_SALES_HOST=localhost DB_SALES_DATABASE=sales");
            std::process::exit(1);
        }
    };

    info!(
        transport = %config.transport,
        databases = databases.len(),
        "Starting Database Gateway v{}",
        env!("CARGO_PKG_VERSION")
    );
    for (name, db) in &databases {
        info!(
            database = %name,
            driver = %db.db_type,
            read_only = db.read_only,
            connection = %mask_credentials(&db.connection_string),
            "Configured database"
        );
    }

    let registry = Arc::new(AdapterRegistry::start(databases).await?);

    let result = match config.transport {
        TransportMode::Stdio => StdioTransport::new(registry).run().await,
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                registry,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
