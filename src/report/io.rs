use std::{fs, path::Path};

use polars::{
    frame::DataFrame,
    prelude::{
        CsvWriterOptions, IntoLazy, ParquetWriteOptions, PlPath, SchemaRef, SinkOptions,
        SinkTarget,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{DataError, IoError, OrderlensResult},
    report::polars_ext::DataFrameExt,
};

// ================================================================================================
// Traits
// ================================================================================================

/// Common interface for all typed report tables (ranking, breakdowns,
/// baseline, the raw dataset).
pub trait Report {
    /// Access the underlying DataFrame.
    fn as_df(&self) -> &DataFrame;
}

pub trait ReportName {
    fn base_name(&self) -> String;

    fn filename(&self, ext: FileExtension) -> String {
        format!("{}.{}", self.base_name(), ext)
    }
}

pub trait ToSchema {
    /// Returns the canonical schema for this report type.
    fn to_schema() -> SchemaRef;
}

pub trait ToJson {
    /// Serializes the report to a generic JSON Value.
    /// Returns a `Value::Array` containing row objects.
    fn to_json(&self) -> OrderlensResult<Value>;
}

pub trait ToCsv {
    /// Writes the report to a CSV file in the target directory.
    ///
    /// # Side Effects
    /// - Creates the directory if missing.
    /// - Overwrites the file if it exists.
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> OrderlensResult<()>;
}

pub trait ToParquet {
    fn to_parquet(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&ParquetWriteOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> OrderlensResult<()>;
}

// ================================================================================================
// Blanket Implementations
// ================================================================================================

impl<T> ToJson for T
where
    T: Report,
{
    fn to_json(&self) -> OrderlensResult<Value> {
        let rows = self.as_df().to_json_rows()?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }
}

impl<T> ToCsv for T
where
    T: Report + ReportName,
{
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> OrderlensResult<()> {
        let target = sink_target(dir.as_ref(), self.filename(FileExtension::Csv))?;
        let options = opts.cloned().unwrap_or_default();
        let sink_opts = sink_opts.cloned().unwrap_or_default();

        let sink_plan = self
            .as_df()
            .clone()
            .lazy()
            .sink_csv(target, options, None, sink_opts)
            .map_err(|e| DataError::DataFrame(format!("Failed to build CSV sink plan: {e}")))?;

        let _ = sink_plan
            .collect()
            .map_err(|e| DataError::DataFrame(format!("Failed to write CSV: {e}")))?;

        Ok(())
    }
}

impl<T> ToParquet for T
where
    T: Report + ReportName,
{
    fn to_parquet(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&ParquetWriteOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> OrderlensResult<()> {
        let target = sink_target(dir.as_ref(), self.filename(FileExtension::Parquet))?;
        let options = opts.cloned().unwrap_or_default();
        let sink_opts = sink_opts.cloned().unwrap_or_default();

        let sink_plan = self
            .as_df()
            .clone()
            .lazy()
            .sink_parquet(target, options, None, sink_opts)
            .map_err(|e| DataError::DataFrame(format!("Failed to build Parquet sink plan: {e}")))?;

        let _ = sink_plan
            .collect()
            .map_err(|e| DataError::DataFrame(format!("Failed to write Parquet: {e}")))?;

        Ok(())
    }
}

fn sink_target(dir: &Path, filename: String) -> OrderlensResult<SinkTarget> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            IoError::FileSystem(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;
    }

    let file_path = dir.join(filename);
    let uri = file_path.to_str().ok_or_else(|| {
        IoError::FileSystem(format!(
            "Path contains invalid UTF-8 characters: {}",
            file_path.display()
        ))
    })?;

    Ok(SinkTarget::Path(PlPath::new(uri)))
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum FileExtension {
    Csv,
    Parquet,
}
