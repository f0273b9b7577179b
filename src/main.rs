//! Quake Query command-line interface
//!
//! `run` executes one date-range query directly against the engine and prints
//! the response envelope in gateway proxy form. `remote` sends the same request
//! to a running HTTP server.

use clap::{Parser, Subcommand};
use quake_query::{
    api::{QueryHandler, RawRequest, RequestBody},
    config::QueryArgs,
    engine::{AthenaEngine, QueryEngine},
    http::QueryApiClient,
    logging::{self, LogFormat},
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "quake-query")]
#[command(about = "Query earthquake records by date range", long_about = None)]
struct Cli {
    #[arg(long, value_enum, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the query pipeline in-process against the engine
    Run {
        #[arg(long)]
        start_date: String,

        #[arg(long)]
        end_date: String,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// Send the query to a running server
    Remote {
        #[arg(long, default_value = "http://127.0.0.1:8080/query")]
        endpoint: String,

        #[arg(long)]
        start_date: String,

        #[arg(long)]
        end_date: String,

        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match cli.command {
        Command::Run { start_date, end_date, query } => {
            let config = query.into_config()?;
            let engine: Arc<dyn QueryEngine> = Arc::new(AthenaEngine::new(&config).await);
            let handler = QueryHandler::new(engine, config)?;

            let payload = serde_json::json!({ "start_date": start_date, "end_date": end_date });
            let request = RawRequest::new(Some("POST".to_string()), RequestBody::Json(payload));
            let envelope = handler.handle(request).await;

            println!("{}", serde_json::to_string_pretty(&envelope.to_proxy_response()?)?);
            if envelope.status_code != 200 {
                std::process::exit(1);
            }
        }
        Command::Remote { endpoint, start_date, end_date, timeout_secs } => {
            let client = QueryApiClient::new(endpoint, Duration::from_secs(timeout_secs))?;
            let response = client.query(&start_date, &end_date).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
