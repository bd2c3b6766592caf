//! Rule-based business recommendations.
//!
//! Rules are an ordered table of [`RecommendationRule`] values. Each rule
//! looks at the same [`RecommendationContext`] and either fires with a
//! message or stays silent; every rule that fires is emitted, in table
//! order. When nothing fires the engine emits a single fallback.

use crate::types::{ConcernSummary, SummaryMetrics, TopZip};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean charging stations below this count as thin infrastructure.
pub const LOW_CHARGING_STATIONS: f64 = 80.0;

/// Mean median income above this counts as a high-income area.
pub const HIGH_MEDIAN_INCOME: f64 = 80_000.0;

/// Mean EV share below this suggests buyers need education.
pub const LOW_EV_SHARE: f64 = 0.12;

/// Rule id of the message emitted when no other rule fires.
pub const FALLBACK_RULE_ID: &str = "maintain_strategy";

const FALLBACK_MESSAGE: &str = "Maintain current strategy; no strong constraints detected. \
     Continue monitoring sentiment and infra density.";

/// Everything the rules may look at for one selection.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub metrics: &'a SummaryMetrics,
    /// The ranked Top-K rows, highest prediction first.
    pub top_zips: &'a [TopZip],
    /// Concern groups, most mentioned first.
    pub concerns: &'a [ConcernSummary],
}

/// A recommendation produced for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Id of the rule that produced it.
    pub rule: String,
    pub message: String,
}

/// One entry of the rule table.
///
/// `evaluate` fuses the predicate and the message formatter: it returns
/// the message when the rule applies and `None` otherwise, so a formatter
/// never runs against data its predicate rejected.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRule {
    pub id: &'static str,
    pub evaluate: fn(&RecommendationContext<'_>) -> Option<String>,
}

/// The built-in rules, in emission order.
pub const DEFAULT_RULES: [RecommendationRule; 4] = [
    RecommendationRule {
        id: "prioritize_top_zip",
        evaluate: prioritize_top_zip,
    },
    RecommendationRule {
        id: "address_top_concern",
        evaluate: address_top_concern,
    },
    RecommendationRule {
        id: "charging_partnership",
        evaluate: charging_partnership,
    },
    RecommendationRule {
        id: "buyer_education",
        evaluate: buyer_education,
    },
];

fn prioritize_top_zip(ctx: &RecommendationContext<'_>) -> Option<String> {
    ctx.top_zips.first().map(|top| {
        format!(
            "Prioritize campaign in ZIP {} ({}, {}) with predicted {} sales.",
            top.zip,
            top.city,
            top.state,
            top.predicted_sales
                .map_or_else(|| "n/a".to_string(), |v| (v.trunc() as i64).to_string())
        )
    })
}

fn address_top_concern(ctx: &RecommendationContext<'_>) -> Option<String> {
    ctx.concerns.first().map(|top| {
        format!(
            "Address {} in targeted messaging; it's the most discussed barrier in the selected region.",
            top.concern.to_lowercase()
        )
    })
}

fn charging_partnership(ctx: &RecommendationContext<'_>) -> Option<String> {
    let stations = ctx.metrics.avg_charging_stations?;
    let income = ctx.metrics.avg_median_income?;

    (stations < LOW_CHARGING_STATIONS && income > HIGH_MEDIAN_INCOME).then(|| {
        "Partner with charging providers: high income but below-average charging density \
         suggests infra-driven lift."
            .to_string()
    })
}

fn buyer_education(ctx: &RecommendationContext<'_>) -> Option<String> {
    let share = ctx.metrics.avg_ev_share?;

    (share < LOW_EV_SHARE).then(|| {
        "Run education webinars with dealerships to build buyer confidence and improve \
         dealer knowledge scores."
            .to_string()
    })
}

/// Evaluates a rule table against a selection.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    rules: Vec<RecommendationRule>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl RecommendationEngine {
    pub fn new(rules: Vec<RecommendationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    /// Run every rule in order; fall back to a single default message.
    pub fn recommend(&self, ctx: &RecommendationContext<'_>) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .rules
            .iter()
            .filter_map(|rule| {
                (rule.evaluate)(ctx).map(|message| Recommendation {
                    rule: rule.id.to_string(),
                    message,
                })
            })
            .collect();

        if recommendations.is_empty() {
            recommendations.push(Recommendation {
                rule: FALLBACK_RULE_ID.to_string(),
                message: FALLBACK_MESSAGE.to_string(),
            });
        }

        debug!(
            "Recommendations fired: {:?}",
            recommendations.iter().map(|r| r.rule.as_str()).collect::<Vec<_>>()
        );

        recommendations
    }
}
