pub mod loader;
pub mod schema;
pub mod scope;

use std::sync::Arc;

use chrono::NaiveDate;
use polars::{
    frame::DataFrame,
    prelude::{
        DataType, Field, IntoLazy, PlSmallStr, Schema, SchemaRef, Series, SortMultipleOptions,
        SortOptions, col, lit,
    },
};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    dataset::{
        schema::StateCol,
        scope::PeriodScope,
    },
    error::{DataError, LoadError, OrderlensResult},
    report::io::{Report, ReportName, ToSchema},
};

/// The immutable handle around the daily final-state table.
///
/// Constructed once at startup from the source file and passed by reference
/// into every computation; queries never mutate it. Clones are cheap (the
/// underlying polars columns are shared), so concurrent readers need no
/// locking.
///
/// # Example Table
///
/// | date       | instrument_id | final_state    | order_count | pct_of_day |
/// |------------|---------------|----------------|-------------|------------|
/// | 2025-11-03 | AKBNK.E       | Trade          | 1840.0      | 61.3       |
/// | 2025-11-03 | AKBNK.E       | CanceledByUser | 1020.0      | 34.0       |
/// | 2025-11-03 | AKBNK.E       | Expired        | 140.0       | 4.7        |
///
/// Rows are sorted by date on construction; the per-day percentages are
/// treated as given and are not re-derived from the counts.
#[derive(Debug, Clone)]
pub struct StateDataset {
    df: DataFrame,
}

impl Report for StateDataset {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for StateDataset {
    fn base_name(&self) -> String {
        "final_state_daily".to_string()
    }
}

impl ToSchema for StateDataset {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = StateCol::iter()
            .map(|column| {
                let dtype = match column {
                    StateCol::Date => DataType::Date,
                    StateCol::InstrumentId | StateCol::FinalState => DataType::String,
                    StateCol::OrderCount | StateCol::PctOfDay => DataType::Float64,
                };
                Field::new(column.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl StateDataset {
    /// Wraps a normalized frame, validating the canonical schema and sorting
    /// rows by date.
    pub fn new(df: DataFrame) -> OrderlensResult<Self> {
        let actual = df.schema();
        for (name, expected_dtype) in Self::to_schema().iter() {
            match actual.get(name.as_str()) {
                None => return Err(LoadError::MissingColumn(name.to_string()).into()),
                Some(dtype) if dtype != expected_dtype => {
                    return Err(LoadError::SchemaMismatch {
                        column: name.to_string(),
                        expected: expected_dtype.to_string(),
                        actual: dtype.to_string(),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let sorted = df
            .sort([StateCol::Date.as_str()], SortMultipleOptions::default())
            .map_err(|e| DataError::DataFrame(format!("Failed to sort dataset by date: {e}")))?;

        Ok(Self { df: sorted })
    }

    /// Wraps a frame that is already validated and date-sorted (e.g. a
    /// filtered view of an existing dataset).
    pub(crate) fn from_frame_unchecked(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.is_empty()
    }

    /// Returns a new dataset restricted to the scope. Both date bounds are
    /// inclusive; an empty result is a valid dataset, not an error.
    pub fn select(&self, scope: &PeriodScope) -> OrderlensResult<Self> {
        if scope.is_unrestricted() {
            return Ok(self.clone());
        }

        let mut lf = self.df.clone().lazy();

        if let Some(instruments) = &scope.instruments {
            let ids = instruments.iter().cloned().collect::<Vec<String>>();
            let set = Series::new(PlSmallStr::EMPTY, ids);
            lf = lf.filter(col(StateCol::InstrumentId).is_in(lit(set).implode(), false));
        }

        if let Some(start) = scope.start {
            lf = lf.filter(col(StateCol::Date).gt_eq(lit(start)));
        }

        if let Some(end) = scope.end {
            lf = lf.filter(col(StateCol::Date).lt_eq(lit(end)));
        }

        let df = lf
            .collect()
            .map_err(|e| DataError::DataFrame(format!("Failed to filter dataset: {e}")))?;

        debug!(rows = df.height(), "Filtered dataset to scope");
        Ok(Self::from_frame_unchecked(df))
    }

    /// Distinct trading days present, ascending.
    pub fn distinct_dates(&self) -> OrderlensResult<Vec<NaiveDate>> {
        let frame = self
            .df
            .clone()
            .lazy()
            .select([col(StateCol::Date).unique().sort(SortOptions::default())])
            .collect()
            .map_err(|e| DataError::DataFrame(format!("Failed to collect distinct dates: {e}")))?;

        let dates = frame
            .column(StateCol::Date.as_str())
            .and_then(|column| column.date())
            .map_err(|e| DataError::DataFrame(format!("Date column access failed: {e}")))?
            .as_date_iter()
            .flatten()
            .collect();

        Ok(dates)
    }

    /// First and last trading day present, or `None` for an empty dataset.
    pub fn date_span(&self) -> OrderlensResult<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.distinct_dates()?;
        Ok(match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        })
    }

    /// Distinct instrument identifiers present, ascending.
    pub fn instruments(&self) -> OrderlensResult<Vec<String>> {
        let frame = self
            .df
            .clone()
            .lazy()
            .select([col(StateCol::InstrumentId).unique().sort(SortOptions::default())])
            .collect()
            .map_err(|e| DataError::DataFrame(format!("Failed to collect instruments: {e}")))?;

        let ids = frame
            .column(StateCol::InstrumentId.as_str())
            .and_then(|column| column.str())
            .map_err(|e| DataError::DataFrame(format!("Instrument column access failed: {e}")))?
            .into_no_null_iter()
            .map(str::to_string)
            .collect();

        Ok(ids)
    }
}
