//! HTTP Server Binary for Quake Query
//!
//! Serves the date-range query endpoint backed by Amazon Athena.
//!
//! Usage:
//!   cargo run --bin http_server -- --host 0.0.0.0 --port 8080 --database earthquakes_db_dashboard

use clap::Parser;
use quake_query::{
    api::QueryHandler,
    config::QueryArgs,
    engine::{AthenaEngine, QueryEngine},
    http::start_server,
    logging::{self, LogFormat},
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "Quake Query HTTP Server")]
#[command(about = "HTTP API server for date-range earthquake queries", long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value = "8080")]
    port: u16,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(flatten)]
    query: QueryArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.log_format);

    let config = args.query.into_config()?;
    tracing::info!(
        table = %config.qualified_table(),
        output = %config.output_location,
        region = %config.region,
        poll_interval = ?config.poll_interval,
        max_wait = ?config.max_wait,
        "starting query service"
    );

    let engine: Arc<dyn QueryEngine> = Arc::new(AthenaEngine::new(&config).await);
    let handler = Arc::new(QueryHandler::new(engine, config)?);

    let addr = format!("{}:{}", args.host, args.port);

    // Set up graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown signal received, stopping server");
    };

    tokio::select! {
        result = start_server(&addr, handler) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "server error");
            }
        }
        () = shutdown_signal => {
            tracing::info!("server shut down gracefully");
        }
    }

    Ok(())
}
