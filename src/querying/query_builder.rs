//! Date-range query builder
//!
//! Produces the engine query selecting every event whose `event_date` falls in
//! an inclusive `[start_date, end_date]` range, oldest first. Only the shape of
//! the dates is checked here; calendar validity and the ordering of the two
//! bounds are left to the engine, which fails the execution on a bad date.

use crate::config::QueryConfig;
use crate::{Error, Result};
use regex::Regex;

/// Format the ingestion job writes `event_date` in.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct QueryBuilder {
    qualified_table: String,
    date_regex: Regex,
}

impl QueryBuilder {
    pub fn new(config: &QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(QueryBuilder {
            qualified_table: config.qualified_table(),
            date_regex: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")
                .map_err(|e| Error::Internal(e.to_string()))?,
        })
    }

    /// Builds the range query. Both bounds are inclusive.
    ///
    /// The dates are interpolated into the query text, so anything that is not
    /// literally `dddd-dd-dd` with ASCII digits is rejected with
    /// [`Error::InvalidDate`].
    pub fn build(&self, start_date: &str, end_date: &str) -> Result<String> {
        if start_date.is_empty() || end_date.is_empty() {
            return Err(Error::MissingDates);
        }
        for date in [start_date, end_date] {
            if !self.date_regex.is_match(date) {
                return Err(Error::InvalidDate(format!(
                    "'{}' is not formatted as YYYY-MM-DD",
                    date
                )));
            }
        }

        Ok(format!(
            "SELECT *\nFROM {table}\nWHERE date_parse(event_date, '{format}')\n    BETWEEN DATE('{start}') AND DATE('{end}')\nORDER BY full_time",
            table = self.qualified_table,
            format = EVENT_DATE_FORMAT,
            start = start_date,
            end = end_date,
        ))
    }
}
