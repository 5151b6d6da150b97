use std::path::PathBuf;

use orderlens::prelude::*;

pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("tests/fixtures").join(name)
}

pub fn load_fixture() -> StateDataset {
    load_csv(fixture_path("final_state_daily.csv")).expect("Failed to load fixture dataset")
}
