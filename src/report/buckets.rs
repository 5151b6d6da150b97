use std::sync::Arc;

use chrono::NaiveDate;
use polars::{
    frame::DataFrame,
    prelude::{
        Column, DataType, DateChunked, Field, IntoColumn, IntoLazy, IntoSeries, JoinArgs,
        JoinType, LazyFrame, PlSmallStr, Schema, SchemaRef, SortMultipleOptions, SortOptions, col,
        lit,
    },
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::{
    dataset::{StateDataset, schema::StateCol, scope::ScopeOutcome},
    error::{DataError, OrderlensResult},
    report::{
        io::{Report, ReportName, ToSchema},
        polars_ext::polars_to_lens_error,
    },
};

/// Fixed-size week buckets over the leading trading days of a period.
///
/// The weekly/daily breakdown is deliberately scoped to the first `max_days`
/// distinct trading days; rows beyond that are dropped from the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekLayout {
    days_per_week: u32,
    max_days: u32,
}

impl Default for WeekLayout {
    fn default() -> Self {
        Self {
            days_per_week: 5,
            max_days: 20,
        }
    }
}

impl WeekLayout {
    /// Creates a custom layout.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero.
    pub fn new(days_per_week: u32, max_days: u32) -> OrderlensResult<Self> {
        if days_per_week == 0 {
            return Err(
                DataError::InvalidWeekLayout("days_per_week must be at least 1".to_string()).into(),
            );
        }
        if max_days == 0 {
            return Err(
                DataError::InvalidWeekLayout("max_days must be at least 1".to_string()).into(),
            );
        }

        Ok(Self {
            days_per_week,
            max_days,
        })
    }

    pub fn days_per_week(&self) -> u32 {
        self.days_per_week
    }

    pub fn max_days(&self) -> u32 {
        self.max_days
    }

    /// Highest week index the layout can produce.
    pub fn max_weeks(&self) -> u32 {
        self.max_days.div_ceil(self.days_per_week)
    }
}

/// Bucket assignment columns added to the record table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BucketCol {
    /// Zero-based position of the row's date among the kept distinct dates.
    DayIndex,
    /// One-based week bucket: `day_index / days_per_week + 1`.
    WeekIndex,
}

impl From<BucketCol> for PlSmallStr {
    fn from(value: BucketCol) -> Self {
        value.as_str().into()
    }
}

impl BucketCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The record table of one period slice with week/day bucket assignments.
///
/// Week indices are contiguous integers starting at 1; day ordering is by
/// calendar date, independent of row arrival order.
#[derive(Debug, Clone)]
pub struct BucketedView {
    df: DataFrame,
    layout: WeekLayout,
}

impl Report for BucketedView {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for BucketedView {
    fn base_name(&self) -> String {
        "bucketed_daily_states".to_string()
    }
}

impl ToSchema for BucketedView {
    fn to_schema() -> SchemaRef {
        let mut fields: Vec<Field> = StateCol::iter()
            .map(|column| {
                let dtype = match column {
                    StateCol::Date => DataType::Date,
                    StateCol::InstrumentId | StateCol::FinalState => DataType::String,
                    StateCol::OrderCount | StateCol::PctOfDay => DataType::Float64,
                };
                Field::new(column.into(), dtype)
            })
            .collect();
        fields.extend(
            BucketCol::iter().map(|column| Field::new(column.into(), DataType::UInt32)),
        );

        Arc::new(Schema::from_iter(fields))
    }
}

impl BucketedView {
    /// Assigns week/day buckets to the supplied (already scoped) dataset.
    ///
    /// Rows whose date falls outside the first `max_days` distinct dates are
    /// dropped from the view.
    pub fn compute(
        dataset: &StateDataset,
        layout: WeekLayout,
    ) -> OrderlensResult<ScopeOutcome<Self>> {
        if dataset.is_empty() {
            return Ok(ScopeOutcome::Empty);
        }

        let kept = dataset
            .distinct_dates()?
            .into_iter()
            .take(layout.max_days as usize)
            .collect::<Vec<_>>();
        debug!(days = kept.len(), "Assigning week buckets");

        let index_frame = date_index_frame(&kept, &layout)?;
        let df = dataset
            .as_df()
            .clone()
            .lazy()
            .join(
                index_frame.lazy(),
                [col(StateCol::Date)],
                [col(StateCol::Date)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([StateCol::Date.as_str()], SortMultipleOptions::default())
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to assign week buckets", e))?;

        Ok(ScopeOutcome::Data(Self { df, layout }))
    }

    pub fn layout(&self) -> WeekLayout {
        self.layout
    }

    /// Week indices present in the view, ascending.
    pub fn weeks(&self) -> OrderlensResult<Vec<u32>> {
        let frame = self
            .df
            .clone()
            .lazy()
            .select([col(BucketCol::WeekIndex).unique().sort(SortOptions::default())])
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to collect week indices", e))?;

        let weeks = frame
            .column(BucketCol::WeekIndex.as_str())
            .and_then(|column| column.u32())
            .map_err(|e| polars_to_lens_error("Week index column access failed", e))?
            .into_no_null_iter()
            .collect();
        Ok(weeks)
    }

    /// Number of distinct trading days kept in the view.
    pub fn n_days(&self) -> OrderlensResult<usize> {
        Ok(self.distinct_dates(None)?.len())
    }

    /// Distinct dates of one week bucket, ascending.
    pub fn dates_in_week(&self, week: u32) -> OrderlensResult<Vec<NaiveDate>> {
        self.validate_week(week)?;
        self.distinct_dates(Some(week))
    }

    /// Per-(week, state) roll-up of the whole view.
    pub fn weekly(&self) -> OrderlensResult<WeeklyBreakdown> {
        let df = per_day_sums(&self.df, None)
            .group_by([col(BucketCol::WeekIndex), col(StateCol::FinalState)])
            .agg([
                col(StateCol::PctOfDay).mean().alias(WeeklyCol::AvgPct),
                col(StateCol::OrderCount).sum().alias(WeeklyCol::TotalOrders),
            ])
            .sort(
                [BucketCol::WeekIndex.as_str(), StateCol::FinalState.as_str()],
                SortMultipleOptions::default(),
            )
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to compute weekly breakdown", e))?;

        Ok(WeeklyBreakdown { df })
    }

    /// Per-(date, state) table of one selected week bucket.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidWeekIndex`] for a week the view never
    /// produced.
    pub fn daily(&self, week: u32) -> OrderlensResult<DailyBreakdown> {
        self.validate_week(week)?;

        let df = per_day_sums(&self.df, Some(week))
            .select([
                col(StateCol::Date),
                col(StateCol::FinalState),
                col(StateCol::PctOfDay),
                col(StateCol::OrderCount),
            ])
            .sort(
                [StateCol::Date.as_str(), StateCol::FinalState.as_str()],
                SortMultipleOptions::default(),
            )
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to compute daily breakdown", e))?;

        Ok(DailyBreakdown { df, week })
    }

    fn validate_week(&self, week: u32) -> OrderlensResult<()> {
        let weeks = self.weeks()?;
        if !weeks.contains(&week) {
            return Err(DataError::InvalidWeekIndex {
                index: week,
                max: weeks.last().copied().unwrap_or(0),
            }
            .into());
        }
        Ok(())
    }

    fn distinct_dates(&self, week: Option<u32>) -> OrderlensResult<Vec<NaiveDate>> {
        let mut lf = self.df.clone().lazy();
        if let Some(week) = week {
            lf = lf.filter(col(BucketCol::WeekIndex).eq(lit(week)));
        }
        let frame = lf
            .select([col(StateCol::Date).unique().sort(SortOptions::default())])
            .collect()
            .map_err(|e| polars_to_lens_error("Failed to collect view dates", e))?;

        let dates = frame
            .column(StateCol::Date.as_str())
            .and_then(|column| column.date())
            .map_err(|e| polars_to_lens_error("Date column access failed", e))?
            .as_date_iter()
            .flatten()
            .collect();
        Ok(dates)
    }
}

/// Sums duplicate (date, state) rows, optionally restricted to one week.
fn per_day_sums(df: &DataFrame, week: Option<u32>) -> LazyFrame {
    let mut lf = df.clone().lazy();
    if let Some(week) = week {
        lf = lf.filter(col(BucketCol::WeekIndex).eq(lit(week)));
    }
    lf.group_by([
        col(BucketCol::WeekIndex),
        col(StateCol::Date),
        col(StateCol::FinalState),
    ])
    .agg([
        col(StateCol::PctOfDay).sum(),
        col(StateCol::OrderCount).sum(),
    ])
}

fn date_index_frame(dates: &[NaiveDate], layout: &WeekLayout) -> OrderlensResult<DataFrame> {
    let day_indices = (0..dates.len() as u32).collect::<Vec<_>>();
    let week_indices = day_indices
        .iter()
        .map(|day| day / layout.days_per_week + 1)
        .collect::<Vec<_>>();

    let date_column = DateChunked::from_naive_date(StateCol::Date.name(), dates.iter().copied())
        .into_series()
        .into_column();

    DataFrame::new(vec![
        date_column,
        Column::new(BucketCol::DayIndex.name(), day_indices),
        Column::new(BucketCol::WeekIndex.name(), week_indices),
    ])
    .map_err(|e| polars_to_lens_error("Failed to build date index frame", e))
}

// ================================================================================================
// Roll-up tables
// ================================================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WeeklyCol {
    WeekIndex,
    FinalState,
    /// Mean of the per-day percentage sums within the week.
    AvgPct,
    /// Summed order count within the week.
    TotalOrders,
}

impl From<WeeklyCol> for PlSmallStr {
    fn from(value: WeeklyCol) -> Self {
        value.as_str().into()
    }
}

impl WeeklyCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One row per (week bucket, final state) over the bucketed view.
#[derive(Debug, Clone)]
pub struct WeeklyBreakdown {
    df: DataFrame,
}

impl Report for WeeklyBreakdown {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for WeeklyBreakdown {
    fn base_name(&self) -> String {
        "weekly_breakdown".to_string()
    }
}

impl ToSchema for WeeklyBreakdown {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = WeeklyCol::iter()
            .map(|column| {
                let dtype = match column {
                    WeeklyCol::WeekIndex => DataType::UInt32,
                    WeeklyCol::FinalState => DataType::String,
                    WeeklyCol::AvgPct | WeeklyCol::TotalOrders => DataType::Float64,
                };
                Field::new(column.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

/// One row per (date, final state) within a single week bucket.
#[derive(Debug, Clone)]
pub struct DailyBreakdown {
    df: DataFrame,
    week: u32,
}

impl Report for DailyBreakdown {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for DailyBreakdown {
    fn base_name(&self) -> String {
        format!("week{}_daily_breakdown", self.week)
    }
}

impl ToSchema for DailyBreakdown {
    fn to_schema() -> SchemaRef {
        let fields = vec![
            Field::new(StateCol::Date.into(), DataType::Date),
            Field::new(StateCol::FinalState.into(), DataType::String),
            Field::new(StateCol::PctOfDay.into(), DataType::Float64),
            Field::new(StateCol::OrderCount.into(), DataType::Float64),
        ];

        Arc::new(Schema::from_iter(fields))
    }
}

impl DailyBreakdown {
    pub fn week(&self) -> u32 {
        self.week
    }
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    /// One instrument, one `Trade` row per day, for `n` consecutive days.
    fn single_state_dataset(n: u32) -> StateDataset {
        let dates = (1..=n)
            .map(|day| format!("2025-11-{day:02}"))
            .collect::<Vec<_>>();
        let instruments = vec!["AKBNK.E"; n as usize];
        let states = vec!["Trade"; n as usize];
        let counts = vec![10.0; n as usize];
        let pcts = vec![100.0; n as usize];

        let frame = df![
            StateCol::Date.as_str() => dates,
            StateCol::InstrumentId.as_str() => instruments,
            StateCol::FinalState.as_str() => states,
            StateCol::OrderCount.as_str() => counts,
            StateCol::PctOfDay.as_str() => pcts,
        ]
        .expect("Failed to create raw frame");

        let frame = frame
            .lazy()
            .with_column(col(StateCol::Date).cast(DataType::Date))
            .collect()
            .expect("Failed to cast date column");

        StateDataset::new(frame).expect("Failed to create dataset")
    }

    fn view(dataset: &StateDataset, layout: WeekLayout) -> BucketedView {
        BucketedView::compute(dataset, layout)
            .expect("Bucketing failed")
            .into_option()
            .expect("View should not be empty")
    }

    #[test]
    fn test_week_layout_validation() {
        assert!(WeekLayout::new(5, 20).is_ok());
        assert!(WeekLayout::new(0, 20).is_err());
        assert!(WeekLayout::new(5, 0).is_err());
        assert_eq!(WeekLayout::default().max_weeks(), 4);
        assert_eq!(WeekLayout::new(5, 21).unwrap().max_weeks(), 5);
    }

    #[test]
    fn test_twenty_days_map_to_four_weeks() {
        // Arrange: 21 distinct days; only the first 20 may survive.
        let dataset = single_state_dataset(21);

        // Act
        let view = view(&dataset, WeekLayout::default());

        // Assert
        assert_eq!(view.weeks().unwrap(), vec![1, 2, 3, 4], "Week indices must be 1-4");
        assert_eq!(view.n_days().unwrap(), 20, "The 21st distinct date must be dropped");

        // Day indices 0-4 belong to week 1, 15-19 to week 4.
        let week1 = view.dates_in_week(1).unwrap();
        assert_eq!(week1.len(), 5);
        assert_eq!(week1[0], NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(week1[4], NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());

        let week4 = view.dates_in_week(4).unwrap();
        assert_eq!(week4[0], NaiveDate::from_ymd_opt(2025, 11, 16).unwrap());
        assert_eq!(week4[4], NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
    }

    #[test]
    fn test_day_order_is_calendar_not_arrival() {
        // Rows arrive date-shuffled; indices must follow the calendar.
        let frame = df![
            StateCol::Date.as_str() => &["2025-11-05", "2025-11-03", "2025-11-04"],
            StateCol::InstrumentId.as_str() => &["AKBNK.E", "AKBNK.E", "AKBNK.E"],
            StateCol::FinalState.as_str() => &["Trade", "Trade", "Trade"],
            StateCol::OrderCount.as_str() => &[1.0, 2.0, 3.0],
            StateCol::PctOfDay.as_str() => &[100.0, 100.0, 100.0],
        ]
        .expect("Failed to create raw frame")
        .lazy()
        .with_column(col(StateCol::Date).cast(DataType::Date))
        .collect()
        .expect("Failed to cast date column");
        let dataset = StateDataset::new(frame).expect("Failed to create dataset");

        let layout = WeekLayout::new(2, 4).unwrap();
        let view = view(&dataset, layout);

        let day_indices = view
            .as_df()
            .column(BucketCol::DayIndex.as_str())
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect::<Vec<_>>();
        // View rows are date-sorted: 11-03 -> 0, 11-04 -> 1, 11-05 -> 2.
        assert_eq!(day_indices, vec![0, 1, 2]);

        assert_eq!(view.weeks().unwrap(), vec![1, 2], "Days 0-1 in week 1, day 2 in week 2");
    }

    #[test]
    fn test_weekly_breakdown_values() {
        // Two days per week, two states, known values.
        let frame = df![
            StateCol::Date.as_str() => &[
                "2025-11-03", "2025-11-03", "2025-11-04", "2025-11-04",
                "2025-11-05", "2025-11-05",
            ],
            StateCol::InstrumentId.as_str() => &["AKBNK.E"; 6],
            StateCol::FinalState.as_str() => &[
                "Trade", "CanceledByUser", "Trade", "CanceledByUser",
                "Trade", "CanceledByUser",
            ],
            StateCol::OrderCount.as_str() => &[80.0, 20.0, 60.0, 40.0, 90.0, 10.0],
            StateCol::PctOfDay.as_str() => &[80.0, 20.0, 60.0, 40.0, 90.0, 10.0],
        ]
        .expect("Failed to create raw frame")
        .lazy()
        .with_column(col(StateCol::Date).cast(DataType::Date))
        .collect()
        .expect("Failed to cast date column");
        let dataset = StateDataset::new(frame).expect("Failed to create dataset");

        let layout = WeekLayout::new(2, 4).unwrap();
        let weekly = view(&dataset, layout).weekly().expect("Weekly roll-up failed");
        let df = weekly.as_df();

        // Expected rows: (1, CanceledByUser), (1, Trade), (2, CanceledByUser), (2, Trade)
        assert_eq!(df.height(), 4);

        let avg_pct = df
            .column(WeeklyCol::AvgPct.as_str())
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect::<Vec<_>>();
        let totals = df
            .column(WeeklyCol::TotalOrders.as_str())
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect::<Vec<_>>();

        // Week 1 Cancel: mean(20, 40) = 30, total 60. Week 1 Trade: mean(80, 60) = 70, total 140.
        // Week 2 has a single day: means equal the day values.
        assert_eq!(avg_pct, vec![30.0, 70.0, 10.0, 90.0]);
        assert_eq!(totals, vec![60.0, 140.0, 10.0, 90.0]);
    }

    #[test]
    fn test_daily_breakdown_and_invalid_week() {
        let dataset = single_state_dataset(6);
        let layout = WeekLayout::new(5, 20).unwrap();
        let view = view(&dataset, layout);

        let daily = view.daily(2).expect("Week 2 exists");
        assert_eq!(daily.week(), 2);
        assert_eq!(daily.as_df().height(), 1, "Week 2 holds a single trading day");

        let err = view.daily(9).expect_err("Week 9 does not exist");
        match err {
            crate::error::OrderlensError::Data(DataError::InvalidWeekIndex { index, max }) => {
                assert_eq!(index, 9);
                assert_eq!(max, 2);
            }
            other => panic!("Expected InvalidWeekIndex, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_dataset_yields_empty_marker() {
        let dataset = single_state_dataset(3);
        let none = dataset
            .select(&crate::dataset::scope::PeriodScope::single_instrument("THYAO.E"))
            .expect("Filter failed");

        let outcome = BucketedView::compute(&none, WeekLayout::default()).expect("Must not error");
        assert!(outcome.is_empty());
    }
}
