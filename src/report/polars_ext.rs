use polars::prelude::{DataFrame, Expr, JsonFormat, JsonWriter, SerWriter, lit, when};
use serde_json::Value;

use crate::error::{DataError, IoError, OrderlensError, OrderlensResult};

pub(crate) fn polars_to_lens_error(context: &str, e: polars::error::PolarsError) -> OrderlensError {
    OrderlensError::Data(DataError::DataFrame(format!("{context}: {e}")))
}

pub trait ExprExt {
    /// Divides two expressions, resolving a zero denominator to `fallback`
    /// instead of producing NaN/inf.
    ///
    /// Zero denominators are a policy decision in this crate (e.g. the
    /// Cancel/Trade ratio is 0 on days without trades), so the fallback is
    /// explicit at every call site.
    fn safe_div(self, denominator: Expr, fallback: f64) -> Expr;
}

impl ExprExt for Expr {
    fn safe_div(self, denominator: Expr, fallback: f64) -> Expr {
        when(denominator.clone().eq(lit(0.0)))
            .then(lit(fallback))
            .otherwise(self / denominator)
    }
}

pub trait DataFrameExt {
    fn to_json_rows(&self) -> OrderlensResult<Vec<serde_json::Map<String, Value>>>;
}

impl DataFrameExt for DataFrame {
    fn to_json_rows(&self) -> OrderlensResult<Vec<serde_json::Map<String, Value>>> {
        let height = self.height();
        if height == 0 {
            return Ok(Vec::new());
        }

        let estimated_row_size = self.width() * (1 << 6);
        let mut buf = Vec::with_capacity(height * estimated_row_size);

        JsonWriter::new(&mut buf)
            .with_json_format(JsonFormat::Json)
            .finish(&mut self.clone())
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        let json_val: Value = serde_json::from_slice(&buf).map_err(IoError::Json)?;

        match json_val {
            Value::Array(rows) => {
                let mut out_vec = Vec::with_capacity(rows.len());
                for v in rows {
                    if let Value::Object(map) = v {
                        out_vec.push(map);
                    }
                }
                Ok(out_vec)
            }
            _ => Err(DataError::DataFrame("Polars JSON output was not an array".to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use polars::{df, prelude::{IntoLazy, col}};

    use super::*;

    #[test]
    fn test_safe_div_resolves_zero_denominator() {
        let df = df![
            "num" => &[10.0, 5.0, 3.0],
            "den" => &[2.0, 0.0, 1.0],
        ]
        .expect("Failed to create frame");

        let out = df
            .lazy()
            .with_column(col("num").safe_div(col("den"), 0.0).alias("ratio"))
            .collect()
            .expect("safe_div evaluation failed");

        let ratios = out
            .column("ratio")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect::<Vec<_>>();
        assert_eq!(ratios, vec![5.0, 0.0, 3.0], "Zero denominator must yield the fallback");
    }

    #[test]
    fn test_to_json_rows_empty_frame() {
        let df = df!["a" => &[0.0; 0]].expect("Failed to create empty frame");
        let rows = df.to_json_rows().expect("Empty frame must serialize");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_to_json_rows_round_trip() {
        let df = df![
            "instrument_id" => &["AKBNK.E", "GARAN.E"],
            "metric_wavg" => &[40.0, 100.0],
        ]
        .expect("Failed to create frame");

        let rows = df.to_json_rows().expect("Serialization failed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["instrument_id"], "AKBNK.E");
        assert_eq!(rows[1]["metric_wavg"], 100.0);
    }
}
