use std::sync::Arc;

use polars::{
    frame::DataFrame,
    prelude::{
        DataType, Expr, Field, IntoLazy, LazyFrame, PlSmallStr, Schema, SchemaRef,
        SortMultipleOptions, col, lit, when,
    },
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::{
    dataset::{
        StateDataset,
        schema::{FinalState, StateCol},
        scope::{PeriodScope, ScopeOutcome},
    },
    error::OrderlensResult,
    metric::MetricKind,
    report::{
        io::{Report, ReportName, ToSchema},
        polars_ext::{ExprExt, polars_to_lens_error},
    },
};

/// Columns of the intermediate one-row-per-(date, instrument) pivot.
///
/// Per-state percentage sums default to 0 when a state is absent that day;
/// `total_orders_day` sums the counts of *all* states, known or not, so the
/// weighting never loses volume to unrecognized labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum DailyCol {
    TradePct,
    CancelPct,
    ExpiredPct,
    TotalOrdersDay,
    MetricValue,
}

impl From<DailyCol> for PlSmallStr {
    fn from(value: DailyCol) -> Self {
        value.as_str().into()
    }
}

impl DailyCol {
    pub(crate) fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RankingCol {
    InstrumentId,
    MetricWavg,
    TotalOrders,
}

impl From<RankingCol> for PlSmallStr {
    fn from(value: RankingCol) -> Self {
        value.as_str().into()
    }
}

impl RankingCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The comparison view: one row per instrument in scope, ranked best-first.
///
/// # Columns
///
/// - `instrument_id`: equity identifier.
/// - `metric_wavg`: volume-weighted average of the daily metric over the
///   period, weighted by each day's total order count.
/// - `total_orders`: sum of the per-day total order counts over the period.
///
/// # Example Table (kind = `eqs`)
///
/// | instrument_id | metric_wavg | total_orders |
/// |---------------|-------------|--------------|
/// | GARAN.E       | 100.0       | 200.0        |
/// | AKBNK.E       | 40.0        | 200.0        |
///
/// Rows are sorted descending when the metric's `better_high` direction is
/// true, ascending otherwise, so the best instrument always comes first.
#[derive(Debug, Clone)]
pub struct Ranking {
    df: DataFrame,
    kind: MetricKind,
}

impl Report for Ranking {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for Ranking {
    fn base_name(&self) -> String {
        format!("{}_ranking", self.kind)
    }
}

impl ToSchema for Ranking {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = RankingCol::iter()
            .map(|column| {
                let dtype = match column {
                    RankingCol::InstrumentId => DataType::String,
                    RankingCol::MetricWavg | RankingCol::TotalOrders => DataType::Float64,
                };
                Field::new(column.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl Ranking {
    /// Computes the ranked comparison view for one metric over a scope.
    ///
    /// Absent data never raises: days without a state contribute 0 to that
    /// state's percentage, and an instrument with zero total orders in the
    /// period reports a weighted average and total of exactly 0.
    pub fn compute(
        dataset: &StateDataset,
        scope: &PeriodScope,
        kind: MetricKind,
    ) -> OrderlensResult<ScopeOutcome<Self>> {
        let scoped = dataset.select(scope)?;
        if scoped.is_empty() {
            debug!(metric = %kind, "Ranking scope matched no records");
            return Ok(ScopeOutcome::Empty);
        }

        let weight = col(DailyCol::TotalOrdersDay);
        let df = daily_pivot(scoped.as_df())
            .with_column(daily_metric_expr(kind).alias(DailyCol::MetricValue))
            .group_by([col(StateCol::InstrumentId)])
            .agg([
                when(weight.clone().sum().gt(lit(0.0)))
                    .then(
                        (col(DailyCol::MetricValue) * weight.clone()).sum() / weight.clone().sum(),
                    )
                    .otherwise(lit(0.0))
                    .alias(RankingCol::MetricWavg),
                weight.sum().alias(RankingCol::TotalOrders),
            ])
            .sort(
                [RankingCol::MetricWavg.as_str()],
                SortMultipleOptions::default().with_order_descending(kind.better_high()),
            )
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to compute metric ranking", e))?;

        Ok(ScopeOutcome::Data(Self { df, kind }))
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn instrument_count(&self) -> usize {
        self.df.height()
    }

    /// Total order count across all instruments in scope.
    pub fn total_orders(&self) -> OrderlensResult<f64> {
        let sum = self
            .df
            .column(RankingCol::TotalOrders.as_str())
            .and_then(|column| column.f64())
            .map_err(|e| polars_to_lens_error("Total orders column access failed", e))?
            .sum()
            .unwrap_or(0.0);
        Ok(sum)
    }

    /// Instrument identifiers in ranking order (best first).
    pub fn instrument_ids(&self) -> OrderlensResult<Vec<String>> {
        let ids = self
            .df
            .column(RankingCol::InstrumentId.as_str())
            .and_then(|column| column.str())
            .map_err(|e| polars_to_lens_error("Instrument column access failed", e))?
            .into_no_null_iter()
            .map(str::to_string)
            .collect();
        Ok(ids)
    }

    /// Weighted metric values in ranking order.
    pub fn metric_values(&self) -> OrderlensResult<Vec<f64>> {
        let values = self
            .df
            .column(RankingCol::MetricWavg.as_str())
            .and_then(|column| column.f64())
            .map_err(|e| polars_to_lens_error("Metric column access failed", e))?
            .into_no_null_iter()
            .collect();
        Ok(values)
    }
}

/// Aggregates the raw state rows to one row per (date, instrument).
///
/// Duplicate (date, instrument, state) rows are summed here, per the
/// aggregation-key contract of the source table.
fn daily_pivot(df: &DataFrame) -> LazyFrame {
    df.clone()
        .lazy()
        .group_by([col(StateCol::Date), col(StateCol::InstrumentId)])
        .agg([
            state_pct_sum(FinalState::Trade).alias(DailyCol::TradePct),
            state_pct_sum(FinalState::CanceledByUser).alias(DailyCol::CancelPct),
            state_pct_sum(FinalState::Expired).alias(DailyCol::ExpiredPct),
            col(StateCol::OrderCount).sum().alias(DailyCol::TotalOrdersDay),
        ])
}

fn state_pct_sum(state: FinalState) -> Expr {
    when(col(StateCol::FinalState).eq(lit(state.as_str())))
        .then(col(StateCol::PctOfDay))
        .otherwise(lit(0.0))
        .sum()
}

/// The raw daily metric value for one pivoted (date, instrument) row.
fn daily_metric_expr(kind: MetricKind) -> Expr {
    let trade = col(DailyCol::TradePct);
    let cancel = col(DailyCol::CancelPct);
    let expired = col(DailyCol::ExpiredPct);

    match kind {
        MetricKind::Eqs => trade - cancel - expired,
        MetricKind::TradePct => trade,
        MetricKind::CanceledByUserPct => cancel,
        MetricKind::ExpiredPct => expired,
        MetricKind::CancelTradeRatio => cancel.safe_div(trade, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    /// Builds a dataset from (date, instrument, state, count, pct) rows.
    fn dataset_from_rows(rows: &[(&str, &str, &str, f64, f64)]) -> StateDataset {
        let dates = rows.iter().map(|r| r.0).collect::<Vec<_>>();
        let instruments = rows.iter().map(|r| r.1).collect::<Vec<_>>();
        let states = rows.iter().map(|r| r.2).collect::<Vec<_>>();
        let counts = rows.iter().map(|r| r.3).collect::<Vec<_>>();
        let pcts = rows.iter().map(|r| r.4).collect::<Vec<_>>();

        let df = df![
            StateCol::Date.as_str() => dates,
            StateCol::InstrumentId.as_str() => instruments,
            StateCol::FinalState.as_str() => states,
            StateCol::OrderCount.as_str() => counts,
            StateCol::PctOfDay.as_str() => pcts,
        ]
        .expect("Failed to create raw frame");

        let df = df
            .lazy()
            .with_column(col(StateCol::Date).cast(DataType::Date))
            .collect()
            .expect("Failed to cast date column");

        StateDataset::new(df).expect("Failed to create dataset")
    }

    /// The two-instrument example: A trades 80/20 then 60/40, B trades 100%
    /// on both days. EQS weighted averages are 40 and 100.
    fn two_instrument_dataset() -> StateDataset {
        dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 80.0, 80.0),
            ("2025-11-03", "AKBNK.E", "CanceledByUser", 20.0, 20.0),
            ("2025-11-04", "AKBNK.E", "Trade", 60.0, 60.0),
            ("2025-11-04", "AKBNK.E", "CanceledByUser", 40.0, 40.0),
            ("2025-11-03", "GARAN.E", "Trade", 100.0, 100.0),
            ("2025-11-04", "GARAN.E", "Trade", 100.0, 100.0),
        ])
    }

    fn compute(dataset: &StateDataset, kind: MetricKind) -> Ranking {
        Ranking::compute(dataset, &PeriodScope::all(), kind)
            .expect("Ranking computation failed")
            .into_option()
            .expect("Scope should not be empty")
    }

    #[test]
    fn test_eqs_weighted_average_end_to_end() {
        // Arrange
        let dataset = two_instrument_dataset();

        // Act
        let ranking = compute(&dataset, MetricKind::Eqs);

        // Assert: B (100.0) ranks before A (40.0) since higher is better
        assert_eq!(ranking.instrument_count(), 2, "One row per instrument expected");
        assert_eq!(
            ranking.instrument_ids().unwrap(),
            vec!["GARAN.E".to_string(), "AKBNK.E".to_string()]
        );

        let values = ranking.metric_values().unwrap();
        assert_eq!(values[0], 100.0, "GARAN.E trades 100% on both days");
        assert_eq!(
            values[1], 40.0,
            "AKBNK.E: values 60 and 20 with weights 100 and 100 average to 40"
        );
        assert_eq!(ranking.total_orders().unwrap(), 400.0);
    }

    #[test]
    fn test_uniform_weights_equal_arithmetic_mean() {
        // Same total volume each day, so the weighted average must equal the
        // plain mean of the daily Trade% values: (80 + 60) / 2 = 70.
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 40.0, 80.0),
            ("2025-11-03", "AKBNK.E", "Expired", 10.0, 20.0),
            ("2025-11-04", "AKBNK.E", "Trade", 30.0, 60.0),
            ("2025-11-04", "AKBNK.E", "Expired", 20.0, 40.0),
        ]);

        let ranking = compute(&dataset, MetricKind::TradePct);
        assert_eq!(ranking.metric_values().unwrap(), vec![70.0]);
    }

    #[test]
    fn test_zero_total_orders_reports_zero_not_nan() {
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 0.0, 0.0),
            ("2025-11-04", "AKBNK.E", "CanceledByUser", 0.0, 0.0),
        ]);

        let ranking = compute(&dataset, MetricKind::Eqs);
        assert_eq!(ranking.instrument_count(), 1);
        assert_eq!(
            ranking.metric_values().unwrap(),
            vec![0.0],
            "Zero weights must degrade to 0.0, never NaN"
        );
        assert_eq!(ranking.total_orders().unwrap(), 0.0);
    }

    #[test]
    fn test_cancel_trade_ratio_zero_trade_policy() {
        // Trade% is 0 on every day; the ratio must be exactly 0 regardless
        // of the cancel percentages.
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "CanceledByUser", 50.0, 100.0),
            ("2025-11-04", "AKBNK.E", "CanceledByUser", 80.0, 100.0),
        ]);

        let ranking = compute(&dataset, MetricKind::CancelTradeRatio);
        assert_eq!(ranking.metric_values().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_cancel_trade_ratio_weighted() {
        // Day 1: 20/80 = 0.25 with weight 100; day 2: 40/60 ≈ 0.6667 with
        // weight 300. Weighted: (0.25*100 + (40/60)*300) / 400 = 0.5625.
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 80.0, 80.0),
            ("2025-11-03", "AKBNK.E", "CanceledByUser", 20.0, 20.0),
            ("2025-11-04", "AKBNK.E", "Trade", 180.0, 60.0),
            ("2025-11-04", "AKBNK.E", "CanceledByUser", 120.0, 40.0),
        ]);

        let ranking = compute(&dataset, MetricKind::CancelTradeRatio);
        let value = ranking.metric_values().unwrap()[0];
        assert!(
            (value - 0.5625).abs() < 1e-12,
            "Expected 0.5625, got {value}"
        );
    }

    #[test]
    fn test_lower_is_better_sorts_ascending() {
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Expired", 30.0, 30.0),
            ("2025-11-03", "AKBNK.E", "Trade", 70.0, 70.0),
            ("2025-11-03", "GARAN.E", "Expired", 5.0, 5.0),
            ("2025-11-03", "GARAN.E", "Trade", 95.0, 95.0),
        ]);

        let ranking = compute(&dataset, MetricKind::ExpiredPct);
        let values = ranking.metric_values().unwrap();
        assert!(
            values.windows(2).all(|w| w[0] <= w[1]),
            "Expired% ranking must be non-decreasing: {values:?}"
        );
        assert_eq!(
            ranking.instrument_ids().unwrap()[0],
            "GARAN.E",
            "The lowest Expired% must rank first"
        );
    }

    #[test]
    fn test_unknown_states_count_toward_weights_only() {
        // `New` has no pct column of its own, but its order count must be
        // part of the daily volume weight.
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 50.0, 50.0),
            ("2025-11-03", "AKBNK.E", "New", 50.0, 50.0),
        ]);

        let ranking = compute(&dataset, MetricKind::Eqs);
        assert_eq!(
            ranking.total_orders().unwrap(),
            100.0,
            "New-state orders must count toward the period total"
        );
        assert_eq!(
            ranking.metric_values().unwrap(),
            vec![50.0],
            "EQS sees only the named states: 50 - 0 - 0"
        );
    }

    #[test]
    fn test_duplicate_state_rows_are_summed() {
        // Two raw rows for the same (date, instrument, state) key.
        let dataset = dataset_from_rows(&[
            ("2025-11-03", "AKBNK.E", "Trade", 30.0, 30.0),
            ("2025-11-03", "AKBNK.E", "Trade", 40.0, 40.0),
            ("2025-11-03", "AKBNK.E", "CanceledByUser", 30.0, 30.0),
        ]);

        let ranking = compute(&dataset, MetricKind::TradePct);
        assert_eq!(
            ranking.metric_values().unwrap(),
            vec![70.0],
            "Duplicate key rows must be summed before the pivot"
        );
    }

    #[test]
    fn test_empty_scope_returns_marker() {
        let dataset = two_instrument_dataset();
        let outcome = Ranking::compute(
            &dataset,
            &PeriodScope::single_instrument("THYAO.E"),
            MetricKind::Eqs,
        )
        .expect("Empty scope must not error");

        assert!(outcome.is_empty(), "Unmatched scope must yield the empty marker");
    }
}
