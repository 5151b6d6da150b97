pub mod config;
pub mod dataset;
pub mod error;
pub mod metric;
pub mod prelude;
pub mod report;
pub mod universe;

pub use dataset::{
    StateDataset,
    loader::{load_csv, load_parquet},
    scope::{PeriodScope, ScopeOutcome},
};
pub use error::{OrderlensError, OrderlensResult};
pub use metric::MetricKind;
pub use universe::Universe;
