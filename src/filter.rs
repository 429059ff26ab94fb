//! Equality filters over the three categorical fields

use crate::dataset::{CategoricalField, Dataset, ALL};
use crate::error::{DashboardError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One selector's state: no constraint, or an exact value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `All` and the empty string mean "no constraint". Anything else,
    /// whitespace included, is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == ALL {
            Selection::All
        } else {
            Selection::Value(raw.to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Value(v) => Some(v.as_str()),
        }
    }
}

impl From<String> for Selection {
    fn from(raw: String) -> Self {
        Selection::parse(&raw)
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        selection.to_string()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "{}", ALL),
            Selection::Value(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub campaign_id: Selection,
    pub message_status: Selection,
    pub organization: Selection,
}

impl FilterSelection {
    pub fn new(campaign_id: Selection, message_status: Selection, organization: Selection) -> Self {
        Self {
            campaign_id,
            message_status,
            organization,
        }
    }

    /// Build a selection from `(column, value)` pairs such as a decoded
    /// query string. Keys that are not one of the three fields are an error
    /// so typos do not silently widen the result.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut selection = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let field = CategoricalField::from_column(key).ok_or_else(|| {
                DashboardError::Config(format!("Unknown filter field: {}", key))
            })?;
            selection.set(field, Selection::parse(value.as_ref()));
        }
        Ok(selection)
    }

    pub fn get(&self, field: CategoricalField) -> &Selection {
        match field {
            CategoricalField::CampaignId => &self.campaign_id,
            CategoricalField::MessageStatus => &self.message_status,
            CategoricalField::Organization => &self.organization,
        }
    }

    pub fn set(&mut self, field: CategoricalField, selection: Selection) {
        match field {
            CategoricalField::CampaignId => self.campaign_id = selection,
            CategoricalField::MessageStatus => self.message_status = selection,
            CategoricalField::Organization => self.organization = selection,
        }
    }

    /// Active constraints in field order
    pub fn constraints(&self) -> Vec<(CategoricalField, &str)> {
        CategoricalField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).value().map(|v| (field, v)))
            .collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.constraints().is_empty()
    }

    /// Predicate ANDing every active constraint, `None` when nothing is selected
    fn predicate(&self) -> Option<Expr> {
        self.constraints()
            .into_iter()
            .map(|(field, value)| col(field.column()).eq(lit(value)))
            .reduce(|acc, expr| acc.and(expr))
    }
}

/// Keep the rows matching every non-`All` constraint, in their original order.
///
/// A value that does not occur in the data produces an empty frame. Null
/// cells never match a concrete value.
pub fn apply_filters(dataset: &Dataset, selection: &FilterSelection) -> Result<DataFrame> {
    let Some(predicate) = selection.predicate() else {
        return Ok(dataset.frame().clone());
    };

    let subset = dataset
        .frame()
        .clone()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(|e| DashboardError::Polars(format!("Filter failed: {}", e)))?;

    debug!(
        "Filter {:?} kept {} of {} rows",
        selection.constraints(),
        subset.height(),
        dataset.height()
    );
    Ok(subset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let df = df! [
            "campaign_id" => ["c1", "c1", "c1", "c2"],
            "message_status" => ["sent", "read", "responded", "invalid_user"],
            "organization" => ["orgA", "orgA", "orgB", "orgA"],
            "whatsapp_phone_number" => ["p1", "p1", "p2", "p3"]
        ]
        .unwrap();
        Dataset::from_frame(df).unwrap()
    }

    fn phones(df: &DataFrame) -> Vec<String> {
        df.column("whatsapp_phone_number")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_sentinel_and_blank() {
        assert_eq!(Selection::parse("All"), Selection::All);
        assert_eq!(Selection::parse(""), Selection::All);
        assert_eq!(Selection::parse(" "), Selection::Value(" ".to_string()));
        assert_eq!(Selection::parse("all"), Selection::Value("all".to_string()));
        assert_eq!(Selection::parse("orgA"), Selection::Value("orgA".to_string()));
    }

    #[test]
    fn test_unfiltered_returns_full_dataset() {
        let dataset = dataset();
        let subset = apply_filters(&dataset, &FilterSelection::default()).unwrap();
        assert!(subset.equals(dataset.frame()));
    }

    #[test]
    fn test_constraints_are_anded_and_order_preserved() {
        let dataset = dataset();
        let selection = FilterSelection::new(
            Selection::parse("c1"),
            Selection::All,
            Selection::parse("orgA"),
        );
        let subset = apply_filters(&dataset, &selection).unwrap();
        assert_eq!(subset.height(), 2);
        assert_eq!(phones(&subset), vec!["p1", "p1"]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let dataset = dataset();
        let selection = FilterSelection::new(Selection::All, Selection::All, Selection::parse("orga"));
        assert_eq!(apply_filters(&dataset, &selection).unwrap().height(), 0);
    }

    #[test]
    fn test_blank_value_matches_exactly() {
        let df = df! [
            "campaign_id" => ["c1", "c1"],
            "message_status" => ["sent", "read"],
            "organization" => [" ", "orgA"],
            "whatsapp_phone_number" => ["p1", "p2"]
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df).unwrap();

        let selection = FilterSelection::from_pairs([("organization", " ")]).unwrap();
        let subset = apply_filters(&dataset, &selection).unwrap();
        assert_eq!(phones(&subset), vec!["p1"]);
    }

    #[test]
    fn test_unknown_value_yields_empty_subset() {
        let dataset = dataset();
        let selection = FilterSelection::new(Selection::parse("c9"), Selection::All, Selection::All);
        let subset = apply_filters(&dataset, &selection).unwrap();
        assert_eq!(subset.height(), 0);
        assert_eq!(subset.width(), dataset.frame().width());
    }

    #[test]
    fn test_from_pairs() {
        let selection = FilterSelection::from_pairs([
            ("message_status", "read"),
            ("organization", "All"),
        ])
        .unwrap();
        assert_eq!(selection.message_status, Selection::Value("read".to_string()));
        assert_eq!(selection.organization, Selection::All);
        assert_eq!(selection.campaign_id, Selection::All);

        assert!(FilterSelection::from_pairs([("channel", "sms")]).is_err());
    }

    #[test]
    fn test_selection_serializes_as_plain_string() {
        let selection = FilterSelection::new(Selection::parse("c1"), Selection::All, Selection::All);
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"campaign_id": "c1", "message_status": "All", "organization": "All"})
        );
    }
}
