// 1. Traits
pub use crate::report::io::{Report, ReportName, ToCsv, ToJson, ToParquet, ToSchema};
pub use crate::report::polars_ext::{DataFrameExt, ExprExt};

// 2. The dataset handle and scoping
pub use crate::dataset::{
    StateDataset,
    loader::{load_csv, load_parquet},
    scope::{PeriodScope, ScopeOutcome},
};

// 3. Domain types
pub use crate::dataset::schema::{FinalState, StateCol};
pub use crate::metric::MetricKind;
pub use crate::universe::Universe;

// 4. Reports
pub use crate::report::{
    baseline::{Baseline, BaselineCol},
    buckets::{BucketCol, BucketedView, DailyBreakdown, WeekLayout, WeeklyBreakdown, WeeklyCol},
    ranking::{Ranking, RankingCol},
};

// 5. Errors
pub use crate::error::{DataError, IoError, LoadError, OrderlensError, OrderlensResult};

// 6. Configuration
pub use crate::config::LensConfig;
