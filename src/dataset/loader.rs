use std::path::Path;

use polars::prelude::{
    DataType, LazyCsvReader, LazyFileListReader, LazyFrame, PlPath, ScanArgsParquet, col, lit,
};
use strum::IntoEnumIterator;
use tracing::info;

use crate::{
    dataset::{StateDataset, schema::StateCol},
    error::{LoadError, OrderlensResult},
};

/// Loads and normalizes a daily final-state table from a parquet file.
///
/// Fails with [`LoadError`] if the source cannot be read or a required
/// column is absent. Invalid numeric cells coerce to 0.0 rather than
/// dropping the row: absence is zero activity, not missing data.
pub fn load_parquet(path: impl AsRef<Path>) -> OrderlensResult<StateDataset> {
    let path = path.as_ref();
    let lf = LazyFrame::scan_parquet(PlPath::new(utf8_path(path)?), ScanArgsParquet::default())
        .map_err(|e| source_unreadable(path, e))?;

    normalize(lf, path)
}

/// Loads and normalizes a daily final-state table from a CSV file.
///
/// Same contract as [`load_parquet`]; used for fixtures and small exports.
pub fn load_csv(path: impl AsRef<Path>) -> OrderlensResult<StateDataset> {
    let path = path.as_ref();
    let lf = LazyCsvReader::new(PlPath::new(utf8_path(path)?))
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
        .map_err(|e| source_unreadable(path, e))?;

    normalize(lf, path)
}

fn normalize(mut lf: LazyFrame, path: &Path) -> OrderlensResult<StateDataset> {
    let schema = lf
        .collect_schema()
        .map_err(|e| source_unreadable(path, e))?;

    for column in StateCol::iter() {
        if schema.get(column.as_str()).is_none() {
            return Err(LoadError::MissingColumn(column.as_str().to_string()).into());
        }
    }

    // Non-strict casts: unparseable cells become null, then zero.
    let df = lf
        .select([
            col(StateCol::Date).cast(DataType::Date),
            col(StateCol::InstrumentId).cast(DataType::String),
            col(StateCol::FinalState).cast(DataType::String),
            col(StateCol::OrderCount)
                .cast(DataType::Float64)
                .fill_null(lit(0.0)),
            col(StateCol::PctOfDay)
                .cast(DataType::Float64)
                .fill_null(lit(0.0)),
        ])
        .collect()
        .map_err(|e| source_unreadable(path, e))?;

    info!(
        path = %path.display(),
        rows = df.height(),
        "Loaded daily final-state dataset"
    );

    StateDataset::new(df)
}

fn utf8_path(path: &Path) -> Result<&str, LoadError> {
    path.to_str().ok_or_else(|| LoadError::SourceUnreadable {
        path: path.display().to_string(),
        msg: "path contains invalid UTF-8 characters".to_string(),
    })
}

fn source_unreadable(path: &Path, e: polars::error::PolarsError) -> LoadError {
    LoadError::SourceUnreadable {
        path: path.display().to_string(),
        msg: e.to_string(),
    }
}
