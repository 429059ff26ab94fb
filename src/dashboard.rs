//! Dashboard view model
//!
//! One `DashboardView` is built per interaction: selector options from the
//! full dataset, everything else from the filtered subset.

use crate::counters::{compute_counters, Counters};
use crate::dataset::{CategoricalField, Dataset};
use crate::error::Result;
use crate::filter::{apply_filters, FilterSelection};
use crate::funnel::{build_funnel_series, FunnelSeries};
use crate::table::TableView;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::info;

const FUNNEL_BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorOptions {
    pub field: CategoricalField,
    pub label: String,
    pub options: Vec<String>,
}

/// Options for all three selectors, in display order
pub fn selector_options(dataset: &Dataset) -> Result<Vec<SelectorOptions>> {
    CategoricalField::ALL
        .into_iter()
        .map(|field| {
            Ok(SelectorOptions {
                field,
                label: field.label().to_string(),
                options: dataset.selector_options(field)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub title: String,
    pub selectors: Vec<SelectorOptions>,
    pub selection: FilterSelection,
    pub counters: Counters,
    pub funnel: FunnelSeries,
    pub table: TableView,
}

impl DashboardView {
    /// Run the filter-aggregate pipeline and assemble the page
    pub fn build(
        title: &str,
        dataset: &Dataset,
        selection: &FilterSelection,
        row_limit: usize,
    ) -> Result<Self> {
        let subset = apply_filters(dataset, selection)?;
        let counters = compute_counters(&subset)?;
        let funnel = build_funnel_series(&counters);

        info!(
            "Dashboard built: {} of {} rows, {} learners",
            counters.sent,
            dataset.height(),
            counters.learners
        );

        Ok(Self {
            title: title.to_string(),
            selectors: selector_options(dataset)?,
            selection: selection.clone(),
            counters,
            funnel,
            table: TableView::from_frame(&subset, row_limit)?,
        })
    }

    /// Plain-text rendering: tiles, funnel bars, then the filtered rows
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, " {}", self.title);
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "\nFilters:");
        for field in CategoricalField::ALL {
            let _ = writeln!(out, "  {:<16} {}", field.column(), self.selection.get(field));
        }

        let _ = writeln!(out, "\nCampaign Summary");
        for (label, value) in self.counters.tiles() {
            let _ = writeln!(out, "  {:<20} {:>10}", label, value);
        }

        let _ = writeln!(out, "\nMessage Status Funnel");
        for stage in self.funnel.stages() {
            let filled = (stage.share_of_sent.min(1.0) * FUNNEL_BAR_WIDTH as f64).round() as usize;
            let _ = writeln!(
                out,
                "  {:<10} {:<width$} {:>8} ({:>5.1}%)",
                stage.label,
                "#".repeat(filled),
                stage.count,
                stage.share_of_sent * 100.0,
                width = FUNNEL_BAR_WIDTH
            );
        }

        let _ = writeln!(
            out,
            "\nFiltered Campaign Data ({} rows{})",
            self.table.total_rows,
            if self.table.truncated { ", truncated" } else { "" }
        );
        let _ = writeln!(out, "  {}", self.table.columns.join(" | "));
        for row in &self.table.rows {
            let cells: Vec<String> = self
                .table
                .columns
                .iter()
                .map(|c| match &row[c] {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            let _ = writeln!(out, "  {}", cells.join(" | "));
        }

        out
    }
}
