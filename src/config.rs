//! Configuration structures and utilities

use crate::{Error, Result};
use clap::Args;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "earthquakes_db_dashboard";
pub const DEFAULT_TABLE: &str = "earthquake_data";
pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://earthquake-data-dynamic-dashboard/athena-results/";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where queries run and how long the handler waits for them.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Catalog database holding the event table
    pub database: String,
    /// Table of normalised event records
    pub table: String,
    /// Object store prefix the engine writes result artifacts to
    pub output_location: String,
    pub region: String,
    /// Overrides the engine endpoint, e.g. for a local Athena-compatible service
    pub endpoint_url: Option<String>,
    /// Fixed delay between status checks
    pub poll_interval: Duration,
    /// Wait ceiling after which the handler gives up with "Query timeout"
    pub max_wait: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            output_location: DEFAULT_OUTPUT_LOCATION.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl QueryConfig {
    /// Checks the values that end up inside query text or drive the poll loop.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("database", &self.database), ("table", &self.table)] {
            if value.is_empty() {
                return Err(Error::Config(format!("{} must not be empty", field)));
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::Config(format!(
                    "{} '{}' may only contain letters, digits and underscores",
                    field, value
                )));
            }
        }

        if !self.output_location.starts_with("s3://") {
            return Err(Error::Config(format!(
                "output location '{}' is not an s3:// URI",
                self.output_location
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }

        Ok(())
    }

    /// Fully qualified `database.table` name.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

/// Command-line and environment overrides shared by the binaries.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(long, env = "QUAKE_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    #[arg(long, env = "QUAKE_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    #[arg(long, env = "QUAKE_OUTPUT_LOCATION", default_value = DEFAULT_OUTPUT_LOCATION)]
    pub output_location: String,

    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    #[arg(long, env = "QUAKE_ENGINE_ENDPOINT")]
    pub endpoint_url: Option<String>,

    #[arg(long, env = "QUAKE_POLL_INTERVAL_MS", default_value = "2000")]
    pub poll_interval_ms: u64,

    #[arg(long, env = "QUAKE_MAX_WAIT_MS", default_value = "60000")]
    pub max_wait_ms: u64,
}

impl QueryArgs {
    pub fn into_config(self) -> Result<QueryConfig> {
        let config = QueryConfig {
            database: self.database,
            table: self.table,
            output_location: self.output_location,
            region: self.region,
            endpoint_url: self.endpoint_url,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_configuration() {
        let config = QueryConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_wait, Duration::from_secs(60));
        assert_eq!(config.qualified_table(), "earthquakes_db_dashboard.earthquake_data");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let config = QueryConfig { table: "events; DROP TABLE x".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_s3_output() {
        let config =
            QueryConfig { output_location: "/tmp/results".to_string(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_args_defaults_match_config_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct Cli {
            #[command(flatten)]
            query: QueryArgs,
        }

        let config = Cli::parse_from(["quake-query"]).query.into_config().unwrap();
        let defaults = QueryConfig::default();
        assert_eq!(config.database, defaults.database);
        assert_eq!(config.poll_interval, defaults.poll_interval);
        assert_eq!(config.max_wait, defaults.max_wait);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = QueryConfig { poll_interval: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
