use std::{collections::HashMap, sync::Arc};

use itertools::izip;
use polars::{
    frame::DataFrame,
    prelude::{
        DataType, Field, IntoLazy, PlSmallStr, Schema, SchemaRef, SortMultipleOptions, col, lit,
    },
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    dataset::{StateDataset, schema::StateCol},
    error::OrderlensResult,
    report::{
        io::{Report, ReportName, ToSchema},
        polars_ext::polars_to_lens_error,
    },
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BaselineCol {
    FinalState,
    /// Total order count for the state over the whole supplied period.
    TotalOrders,
    /// State's share (0-100) of the period's total order count; 0 for every
    /// state when the period total is 0.
    PctShare,
    /// Period total divided by the number of distinct trading days.
    DailyAvgCount,
}

impl From<BaselineCol> for PlSmallStr {
    fn from(value: BaselineCol) -> Self {
        value.as_str().into()
    }
}

impl BaselineCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Whole-period reference distributions per final state.
///
/// Serves as the comparison overlay for the bucketed views: the percentage
/// distribution backs the percentage-scale charts, the daily average backs
/// the count-scale daily charts, and the daily average times the bucket size
/// forms the expected-per-week count line.
///
/// Distributions are defined over exactly the states observed in the
/// supplied period; absent states resolve to 0 through the `*_values`
/// accessors when a fixed state ordering asks for them.
#[derive(Debug, Clone)]
pub struct Baseline {
    df: DataFrame,
    n_days: u32,
}

impl Report for Baseline {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for Baseline {
    fn base_name(&self) -> String {
        "baseline_distribution".to_string()
    }
}

impl ToSchema for Baseline {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = BaselineCol::iter()
            .map(|column| {
                let dtype = match column {
                    BaselineCol::FinalState => DataType::String,
                    BaselineCol::TotalOrders
                    | BaselineCol::PctShare
                    | BaselineCol::DailyAvgCount => DataType::Float64,
                };
                Field::new(column.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl Baseline {
    /// Computes the reference distributions over the supplied period slice
    /// (typically one instrument's records).
    pub fn compute(dataset: &StateDataset) -> OrderlensResult<Self> {
        let n_days = dataset.distinct_dates()?.len().max(1) as u32;

        let totals = dataset
            .as_df()
            .clone()
            .lazy()
            .group_by([col(StateCol::FinalState)])
            .agg([col(StateCol::OrderCount).sum().alias(BaselineCol::TotalOrders)])
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to compute state totals", e))?;

        let grand_total = totals
            .column(BaselineCol::TotalOrders.as_str())
            .and_then(|column| column.f64())
            .map_err(|e| polars_to_lens_error("State totals column access failed", e))?
            .sum()
            .unwrap_or(0.0);

        let pct_share = if grand_total > 0.0 {
            col(BaselineCol::TotalOrders) * lit(100.0) / lit(grand_total)
        } else {
            lit(0.0)
        };

        let df = totals
            .lazy()
            .with_columns([
                pct_share.alias(BaselineCol::PctShare),
                (col(BaselineCol::TotalOrders) / lit(f64::from(n_days)))
                    .alias(BaselineCol::DailyAvgCount),
            ])
            .sort(
                [BaselineCol::TotalOrders.as_str()],
                SortMultipleOptions::default().with_order_descending(true),
            )
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to compute baseline distribution", e))?;

        Ok(Self { df, n_days })
    }

    /// Number of distinct trading days in the period, clamped to at least 1.
    pub fn n_days(&self) -> u32 {
        self.n_days
    }

    /// Observed states ordered by period total, descending. This is the
    /// fixed state ordering the presentation layer feeds back into the
    /// `*_values` accessors.
    pub fn state_order(&self) -> OrderlensResult<Vec<String>> {
        let states = self
            .df
            .column(BaselineCol::FinalState.as_str())
            .and_then(|column| column.str())
            .map_err(|e| polars_to_lens_error("State column access failed", e))?
            .into_no_null_iter()
            .map(str::to_string)
            .collect();
        Ok(states)
    }

    /// Percentage shares aligned to the supplied state ordering; states
    /// without occurrences resolve to 0.
    pub fn pct_values<S: AsRef<str>>(&self, order: &[S]) -> OrderlensResult<Vec<f64>> {
        self.aligned_values(BaselineCol::PctShare, order)
    }

    /// Daily average counts aligned to the supplied state ordering.
    pub fn daily_avg_values<S: AsRef<str>>(&self, order: &[S]) -> OrderlensResult<Vec<f64>> {
        self.aligned_values(BaselineCol::DailyAvgCount, order)
    }

    /// Expected per-week counts (daily average times bucket size) aligned to
    /// the supplied state ordering.
    pub fn expected_weekly_values<S: AsRef<str>>(
        &self,
        order: &[S],
        days_per_week: u32,
    ) -> OrderlensResult<Vec<f64>> {
        let daily = self.daily_avg_values(order)?;
        Ok(daily
            .into_iter()
            .map(|value| value * f64::from(days_per_week))
            .collect())
    }

    fn aligned_values<S: AsRef<str>>(
        &self,
        column: BaselineCol,
        order: &[S],
    ) -> OrderlensResult<Vec<f64>> {
        let states = self.state_order()?;
        let values = self
            .df
            .column(column.as_str())
            .and_then(|c| c.f64())
            .map_err(|e| polars_to_lens_error("Baseline column access failed", e))?
            .into_no_null_iter()
            .collect::<Vec<_>>();

        let by_state = izip!(states.iter(), values.iter())
            .map(|(state, value)| (state.as_str(), *value))
            .collect::<HashMap<_, _>>();

        Ok(order
            .iter()
            .map(|state| by_state.get(state.as_ref()).copied().unwrap_or(0.0))
            .collect())
    }
}
