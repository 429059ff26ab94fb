//! Campaign report dataset
//!
//! The report is one CSV table. Four columns drive the dashboard; every
//! other column is carried through to the table view untouched.

use crate::error::{DashboardError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const CAMPAIGN_ID: &str = "campaign_id";
pub const MESSAGE_STATUS: &str = "message_status";
pub const ORGANIZATION: &str = "organization";
pub const WHATSAPP_PHONE_NUMBER: &str = "whatsapp_phone_number";

/// Columns that must be present in every report
pub const REQUIRED_COLUMNS: [&str; 4] = [
    CAMPAIGN_ID,
    MESSAGE_STATUS,
    ORGANIZATION,
    WHATSAPP_PHONE_NUMBER,
];

/// Sentinel shown first in every selector
pub const ALL: &str = "All";

/// The three categorical fields a user can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    CampaignId,
    MessageStatus,
    Organization,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::CampaignId,
        CategoricalField::MessageStatus,
        CategoricalField::Organization,
    ];

    /// Column name in the report, also used as the query-string key
    pub fn column(&self) -> &'static str {
        match self {
            CategoricalField::CampaignId => CAMPAIGN_ID,
            CategoricalField::MessageStatus => MESSAGE_STATUS,
            CategoricalField::Organization => ORGANIZATION,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoricalField::CampaignId => "Select Campaign ID",
            CategoricalField::MessageStatus => "Select Message Status",
            CategoricalField::Organization => "Select Organization",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

/// Immutable, validated campaign report
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    source: Option<PathBuf>,
}

impl Dataset {
    /// Load the report from a CSV file.
    ///
    /// The header is checked before polars reads the body so a missing
    /// column is reported by name. The four key columns are read as strings
    /// so identifiers keep their textual form (leading zeros, long numbers).
    /// Other columns are typed from the whole file, not a leading sample.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading campaign report from {}", path.display());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        check_required_columns(headers.iter().map(|h| h.as_str()))?;

        let overrides: Schema = REQUIRED_COLUMNS
            .iter()
            .map(|name| Field::new(name, DataType::String))
            .collect();

        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_dtype_overwrite(Some(Arc::new(overrides)))
            .finish()
            .map_err(|e| DashboardError::Polars(format!("Failed to read CSV {}: {}", path.display(), e)))?
            .collect()
            .map_err(|e| DashboardError::Polars(format!("Failed to collect {}: {}", path.display(), e)))?;

        info!(
            "Loaded {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );

        Ok(Self {
            frame,
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory frame, applying the same validation as [`Dataset::load`].
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        check_required_columns(frame.get_column_names().into_iter())?;

        let casts: Vec<Expr> = REQUIRED_COLUMNS
            .iter()
            .map(|name| col(name).cast(DataType::String))
            .collect();
        let frame = frame
            .lazy()
            .with_columns(casts)
            .collect()
            .map_err(|e| DashboardError::Polars(format!("Failed to normalise key columns: {}", e)))?;

        Ok(Self { frame, source: None })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Observed distinct values of a field in first-appearance order.
    /// Nulls are skipped: they can never be matched by a selection.
    pub fn distinct_values(&self, field: CategoricalField) -> Result<Vec<String>> {
        let unique = self
            .frame
            .clone()
            .lazy()
            .select([col(field.column()).unique_stable()])
            .collect()
            .map_err(|e| DashboardError::Polars(format!("Distinct values failed: {}", e)))?;
        let values: Vec<String> = unique
            .column(field.column())?
            .str()?
            .into_iter()
            .flatten()
            .map(|v| v.to_string())
            .collect();

        debug!("{} distinct values for {}", values.len(), field.column());
        Ok(values)
    }

    /// Selector entries: the `All` sentinel followed by the observed values
    pub fn selector_options(&self, field: CategoricalField) -> Result<Vec<String>> {
        let mut options = vec![ALL.to_string()];
        options.extend(self.distinct_values(field)?);
        Ok(options)
    }
}

fn check_required_columns<'a>(present: impl Iterator<Item = &'a str>) -> Result<()> {
    let present: Vec<&str> = present.collect();
    for required in REQUIRED_COLUMNS {
        if !present.contains(&required) {
            return Err(DashboardError::MissingColumn(required.to_string()));
        }
    }
    Ok(())
}
