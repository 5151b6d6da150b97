use polars::prelude::{Expr, PlSmallStr, col};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Canonical columns of the daily final-state table.
///
/// One row per (date, instrument, final state). The triple is an aggregation
/// key, not a uniqueness constraint: duplicate rows are summed wherever the
/// key is consumed.
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
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum StateCol {
    /// Trading day.
    Date,
    /// Equity identifier (e.g. `AKBNK.E`).
    InstrumentId,
    /// Terminal state label the orders ended the day in. Open set; see
    /// [`FinalState`] for the labels with derived semantics.
    FinalState,
    /// Number of orders that ended in this state on this day.
    OrderCount,
    /// Share (0-100) this state represents of the instrument's total orders
    /// that day.
    PctOfDay,
}

impl From<StateCol> for PlSmallStr {
    fn from(value: StateCol) -> Self {
        value.as_str().into()
    }
}

impl StateCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn as_expr(&self) -> Expr {
        col(*self)
    }
}

/// Terminal states with derived semantics.
///
/// The dataset keeps `final_state` as a raw string column because the label
/// set is open (snapshots can surface states like `New`). Only the states
/// that feed metric formulas are named here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter, IntoStaticStr,
)]
pub enum FinalState {
    /// Order matched a counterparty and executed.
    Trade,
    /// Order was canceled by the user before executing.
    CanceledByUser,
    /// Order never executed and was closed at end of day.
    Expired,
    /// Order still open in the end-of-day snapshot.
    New,
}

impl From<FinalState> for PlSmallStr {
    fn from(value: FinalState) -> Self {
        value.as_str().into()
    }
}

impl FinalState {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
