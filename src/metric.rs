use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The closed set of supported order-lifecycle metrics.
///
/// Every variant carries an explicit ranking direction ([`better_high`]) and
/// a daily formula over the pivoted per-day state percentages; the period
/// value is always the volume-weighted average of the daily values, weighted
/// by that day's total order count.
///
/// [`better_high`]: MetricKind::better_high
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    /// `Trade% - CanceledByUser% - Expired%`: execution quality score.
    #[default]
    Eqs,
    /// Share of orders that executed.
    TradePct,
    /// Share of orders the user canceled.
    CanceledByUserPct,
    /// Share of orders that expired unfilled.
    ExpiredPct,
    /// `CanceledByUser% / Trade%`; 0 whenever Trade% is 0.
    CancelTradeRatio,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Ranking direction: true when larger values rank first.
    pub fn better_high(&self) -> bool {
        match self {
            MetricKind::Eqs | MetricKind::TradePct => true,
            MetricKind::CanceledByUserPct
            | MetricKind::ExpiredPct
            | MetricKind::CancelTradeRatio => false,
        }
    }

    /// Human-readable label for the comparison view.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Eqs => "EQS = Trade% - CanceledByUser% - Expired% (volume-weighted)",
            MetricKind::TradePct => "Trade% (volume-weighted)",
            MetricKind::CanceledByUserPct => {
                "CanceledByUser% (volume-weighted, lower is better)"
            }
            MetricKind::ExpiredPct => "Expired% (volume-weighted, lower is better)",
            MetricKind::CancelTradeRatio => {
                "CanceledByUser% / Trade% (volume-weighted, lower is better)"
            }
        }
    }

    /// Formula and interpretation notes, markdown, for the detail expander.
    pub fn detail_md(&self) -> &'static str {
        match self {
            MetricKind::Eqs => {
                "**Formula**: `EQS = Trade% - CanceledByUser% - Expired%`\n\n\
                 High EQS means more execution and fewer cancels/expiries. \
                 Computed daily, then volume-weighted over the selected period."
            }
            MetricKind::TradePct => {
                "**Formula**: `Trade% = trade orders / total orders * 100`\n\n\
                 High Trade% means a high fill rate. \
                 Volume-weighted over the selected period."
            }
            MetricKind::CanceledByUserPct => {
                "**Formula**: `CanceledByUser% = canceled orders / total orders * 100`\n\n\
                 Lower is better; rising cancels usually track quote refreshing, \
                 impatience or execution difficulty. \
                 Volume-weighted over the selected period."
            }
            MetricKind::ExpiredPct => {
                "**Formula**: `Expired% = expired orders / total orders * 100`\n\n\
                 Lower is better; rising expiries usually mean passive orders \
                 failing to fill. Volume-weighted over the selected period."
            }
            MetricKind::CancelTradeRatio => {
                "**Formula**: `Cancel/Trade = CanceledByUser% / Trade%`\n\n\
                 Lower is better; a large ratio signals execution inefficiency. \
                 Defined as 0 on days with Trade% = 0. \
                 Volume-weighted over the selected period."
            }
        }
    }

    /// Resolves a metric label, falling back to [`MetricKind::Eqs`] for
    /// unrecognized input.
    ///
    /// Strict parsing (`FromStr`) rejects unknown labels; this lenient
    /// variant preserves the comparison view's default-metric behavior at
    /// the string boundary.
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}
