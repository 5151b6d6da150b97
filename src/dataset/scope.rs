use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Restricts a query to an instrument set and an inclusive date range.
///
/// # Usage
/// `None` disables that filter, so the default scope passes every record
/// through. Both date bounds are inclusive.
///
/// # Example
/// ```
/// # use orderlens::prelude::*;
/// # use chrono::NaiveDate;
/// let scope = PeriodScope {
///     instruments: Some(["AKBNK.E".to_string()].into_iter().collect()),
///     start: NaiveDate::from_ymd_opt(2025, 11, 3),
///     end: NaiveDate::from_ymd_opt(2025, 11, 28),
/// };
/// assert!(!scope.is_unrestricted());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PeriodScope {
    /// Allowlist of instrument identifiers.
    ///
    /// - `None`: all instruments pass.
    /// - `Some(ids)`: only records for these instruments are retained.
    pub instruments: Option<BTreeSet<String>>,

    /// First trading day of the period (inclusive). `None` means unbounded.
    pub start: Option<NaiveDate>,

    /// Last trading day of the period (inclusive). `None` means unbounded.
    pub end: Option<NaiveDate>,
}

impl PeriodScope {
    /// Scope covering the whole dataset.
    pub fn all() -> Self {
        Self::default()
    }

    /// Scope over a date range, all instruments.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            instruments: None,
            start: Some(start),
            end: Some(end),
        }
    }

    /// Scope over a set of instruments, unbounded dates.
    pub fn for_instruments<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instruments: Some(ids.into_iter().map(Into::into).collect()),
            start: None,
            end: None,
        }
    }

    /// Scope for one instrument's detail view, unbounded dates.
    pub fn single_instrument(id: impl Into<String>) -> Self {
        Self::for_instruments([id.into()])
    }

    /// Returns true if no filters are active (all records pass).
    pub fn is_unrestricted(&self) -> bool {
        self.instruments.is_none() && self.start.is_none() && self.end.is_none()
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Outcome of a query whose scope may match no records at all.
///
/// An empty scope is not an error: callers render a "no data" state, which
/// must stay distinguishable from a failed computation. Every query entry
/// point returns this marker instead of an empty table.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum ScopeOutcome<T> {
    /// The scope matched records and produced a report.
    Data(T),
    /// The scope matched no records; nothing was computed.
    Empty,
}

impl<T> ScopeOutcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, ScopeOutcome::Empty)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ScopeOutcome::Data(data) => Some(data),
            ScopeOutcome::Empty => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            ScopeOutcome::Data(data) => Some(data),
            ScopeOutcome::Empty => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ScopeOutcome<U> {
        match self {
            ScopeOutcome::Data(data) => ScopeOutcome::Data(f(data)),
            ScopeOutcome::Empty => ScopeOutcome::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("Invalid test date")
    }

    #[test]
    fn test_scope_unrestricted_logic() {
        let scope = PeriodScope::all();
        assert!(scope.is_unrestricted(), "Default scope should be unrestricted");

        let scope = PeriodScope::for_instruments(["GARAN.E"]);
        assert!(!scope.is_unrestricted(), "Instrument scope should not be unrestricted");

        let scope = PeriodScope::between(date(2025, 11, 3), date(2025, 11, 28));
        assert!(!scope.is_unrestricted(), "Dated scope should not be unrestricted");
    }

    #[test]
    fn test_single_instrument_scope() {
        let scope = PeriodScope::single_instrument("AKBNK.E");
        let ids = scope.instruments.expect("Instrument filter should be set");
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("AKBNK.E"));
    }

    #[test]
    fn test_scope_outcome_accessors() {
        let populated: ScopeOutcome<u32> = ScopeOutcome::Data(7);
        assert!(!populated.is_empty());
        assert_eq!(populated.data(), Some(&7));
        assert_eq!(populated.map(|v| v + 1).into_option(), Some(8));

        let empty: ScopeOutcome<u32> = ScopeOutcome::Empty;
        assert!(empty.is_empty());
        assert_eq!(empty.data(), None);
        assert_eq!(empty.map(|v| v + 1).into_option(), None);
    }
}
