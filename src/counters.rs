//! Summary counters over a filtered subset

use crate::dataset::{MESSAGE_STATUS, WHATSAPP_PHONE_NUMBER};
use crate::error::{DashboardError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_READ: &str = "read";
pub const STATUS_RESPONDED: &str = "responded";
pub const STATUS_INVALID_USER: &str = "invalid_user";

/// Statuses counted as delivered. `read` and `responded` messages were
/// necessarily delivered, so the set overlaps the read/responded counters.
pub const DELIVERED_STATUSES: [&str; 3] = [STATUS_READ, STATUS_RESPONDED, STATUS_DELIVERED];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    /// Distinct recipients
    pub learners: u64,
    /// Rows in the subset
    pub sent: u64,
    pub delivered: u64,
    pub read: u64,
    pub responded: u64,
    pub invalid: u64,
}

impl Counters {
    /// Tile labels paired with their values, in display order
    pub fn tiles(&self) -> [(&'static str, u64); 6] {
        [
            ("No. of Learners", self.learners),
            ("Messages Sent", self.sent),
            ("Messages Delivered", self.delivered),
            ("Messages Read", self.read),
            ("Messages Responded", self.responded),
            ("Invalid Messages", self.invalid),
        ]
    }
}

fn status_is(status: &str) -> Expr {
    col(MESSAGE_STATUS).eq(lit(status))
}

fn status_in(statuses: &[&str]) -> Expr {
    statuses
        .iter()
        .map(|s| status_is(s))
        .reduce(|acc, expr| acc.or(expr))
        .unwrap_or_else(|| lit(false))
}

fn count_where(predicate: Expr, alias: &str) -> Expr {
    predicate.sum().cast(DataType::UInt64).alias(alias)
}

/// Compute the six counters in a single pass over `subset`.
///
/// Both key columns must be present; a frame without them fails rather
/// than reporting zeros. Null phone numbers are not counted as learners.
pub fn compute_counters(subset: &DataFrame) -> Result<Counters> {
    for required in [MESSAGE_STATUS, WHATSAPP_PHONE_NUMBER] {
        if subset.column(required).is_err() {
            return Err(DashboardError::MissingColumn(required.to_string()));
        }
    }

    let row = subset
        .clone()
        .lazy()
        .select([
            col(WHATSAPP_PHONE_NUMBER)
                .drop_nulls()
                .n_unique()
                .cast(DataType::UInt64)
                .alias("learners"),
            len().cast(DataType::UInt64).alias("sent"),
            count_where(status_in(&DELIVERED_STATUSES), "delivered"),
            count_where(status_is(STATUS_READ), "read"),
            count_where(status_is(STATUS_RESPONDED), "responded"),
            count_where(status_is(STATUS_INVALID_USER), "invalid"),
        ])
        .collect()
        .map_err(|e| DashboardError::Polars(format!("Counter aggregation failed: {}", e)))?;

    let get = |name: &str| -> Result<u64> {
        Ok(row.column(name)?.u64()?.get(0).unwrap_or(0))
    };

    Ok(Counters {
        learners: get("learners")?,
        sent: get("sent")?,
        delivered: get("delivered")?,
        read: get("read")?,
        responded: get("responded")?,
        invalid: get("invalid")?,
    })
}
