//! Dashboard configuration
//!
//! Defaults match the single-file report layout; every field can be
//! overridden from the environment (a `.env` file is honoured by the
//! binaries through `dotenv`).

use crate::error::{DashboardError, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "final_detailed_campaign_report.csv";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TITLE: &str = "Campaign Performance";
pub const DEFAULT_TABLE_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// CSV report the dashboard is built from
    pub data_path: PathBuf,

    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Page title shown above the tiles
    pub title: String,

    /// Maximum number of filtered rows shipped to the table view
    pub table_row_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            title: DEFAULT_TITLE.to_string(),
            table_row_limit: DEFAULT_TABLE_LIMIT,
        }
    }
}

impl DashboardConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unset keys keep their
    /// defaults; a malformed row limit is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CAMPAIGN_REPORT_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("DASHBOARD_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(title) = lookup("DASHBOARD_TITLE") {
            config.title = title;
        }
        if let Some(limit) = lookup("DASHBOARD_TABLE_LIMIT") {
            config.table_row_limit = limit.trim().parse::<usize>().map_err(|e| {
                DashboardError::Config(format!(
                    "DASHBOARD_TABLE_LIMIT must be a non-negative integer, got '{}': {}",
                    limit, e
                ))
            })?;
        }

        Ok(config)
    }

    pub fn with_data_path(mut self, data_path: PathBuf) -> Self {
        self.data_path = data_path;
        self
    }
}
