//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smart_asset_scheduler::config::ModelConfig;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "Asset_ID,Date,Usage_Hours,Temperature,Pressure,Failure";

/// Synthetic readings where failures follow high usage and temperature
pub fn synthetic_csv(assets: usize, days: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut csv = String::from(HEADER);
    csv.push('\n');
    for day in 0..days {
        let date = start + Duration::days(day as i64);
        for asset in 1..=assets {
            let usage: f64 = rng.gen_range(50.0..600.0);
            let temperature: f64 = rng.gen_range(40.0..100.0);
            let pressure: f64 = rng.gen_range(20.0..50.0);
            let failure = u8::from(usage > 450.0 && temperature > 75.0);
            writeln!(
                csv,
                "A{},{},{:.1},{:.1},{:.1},{}",
                asset, date, usage, temperature, pressure, failure
            )
            .unwrap();
        }
    }
    csv
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Smaller ensemble to keep the suite fast
pub fn test_model() -> ModelConfig {
    ModelConfig {
        n_trees: 20,
        ..ModelConfig::default()
    }
}
