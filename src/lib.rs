pub mod cache;
pub mod config;
pub mod counters;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod funnel;
pub mod http;
pub mod table;

pub use counters::{compute_counters, Counters};
pub use dataset::{CategoricalField, Dataset};
pub use error::{DashboardError, Result};
pub use filter::{apply_filters, FilterSelection, Selection};
pub use funnel::{build_funnel_series, FunnelSeries, FunnelStage};
