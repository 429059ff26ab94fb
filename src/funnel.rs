//! Conversion funnel derived from the counters

use crate::counters::Counters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub label: String,
    pub count: u64,
    /// Fraction of the `sent` stage, 0.0 when nothing was sent
    pub share_of_sent: f64,
}

/// Four stages in the fixed order sent, delivered, read, responded.
///
/// Counts are taken as-is: the data may break the funnel shape (more reads
/// than deliveries, say) and that is shown rather than corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunnelSeries {
    stages: Vec<FunnelStage>,
}

impl FunnelSeries {
    pub fn stages(&self) -> &[FunnelStage] {
        &self.stages
    }

    /// `(label, count)` pairs
    pub fn pairs(&self) -> Vec<(&str, u64)> {
        self.stages
            .iter()
            .map(|s| (s.label.as_str(), s.count))
            .collect()
    }

    pub fn is_monotonic(&self) -> bool {
        self.stages.windows(2).all(|w| w[1].count <= w[0].count)
    }
}

pub fn build_funnel_series(counters: &Counters) -> FunnelSeries {
    let sent = counters.sent;
    let stages = [
        ("sent", counters.sent),
        ("delivered", counters.delivered),
        ("read", counters.read),
        ("responded", counters.responded),
    ]
    .into_iter()
    .map(|(label, count)| FunnelStage {
        label: label.to_string(),
        count,
        share_of_sent: if sent == 0 { 0.0 } else { count as f64 / sent as f64 },
    })
    .collect();

    FunnelSeries { stages }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_order_and_counts() {
        let counters = Counters {
            learners: 2,
            sent: 3,
            delivered: 1,
            read: 1,
            responded: 0,
            invalid: 1,
        };
        let funnel = build_funnel_series(&counters);
        assert_eq!(
            funnel.pairs(),
            vec![("sent", 3), ("delivered", 1), ("read", 1), ("responded", 0)]
        );
        assert!((funnel.stages()[1].share_of_sent - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_monotonic_counts_are_kept() {
        let counters = Counters {
            sent: 2,
            delivered: 1,
            read: 5,
            ..Counters::default()
        };
        let funnel = build_funnel_series(&counters);
        assert_eq!(funnel.stages()[2].count, 5);
        assert!(!funnel.is_monotonic());
    }

    #[test]
    fn test_zero_sent_has_zero_shares() {
        let funnel = build_funnel_series(&Counters::default());
        assert!(funnel.stages().iter().all(|s| s.share_of_sent == 0.0));
        assert_eq!(funnel.stages().len(), 4);
    }
}
