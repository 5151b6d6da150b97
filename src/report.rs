pub mod baseline;
pub mod buckets;
pub mod io;
pub mod polars_ext;
pub mod ranking;
