//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

/// Eight records: x = 1..8, y = 1 for x <= 4
pub fn create_scenario_dataframe() -> DataFrame {
    df! {
        "y" => [1i32, 1, 1, 1, 0, 0, 0, 0],
        "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
    }
    .unwrap()
}

/// Synthetic credit-style data with known signal strength.
///
/// - `target`: binary outcome driven mostly by `score`
/// - `score`: strong numeric predictor
/// - `income`: weak numeric predictor with ~10% missing values
/// - `region`: categorical with a mild effect
/// - `noise`: uniform noise
pub fn create_credit_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut target = Vec::with_capacity(rows);
    let mut score = Vec::with_capacity(rows);
    let mut income = Vec::with_capacity(rows);
    let mut region = Vec::with_capacity(rows);
    let mut noise = Vec::with_capacity(rows);
    let regions = ["north", "south", "east", "west"];

    for _ in 0..rows {
        let s: f64 = rng.gen_range(0.0..100.0);
        let inc: f64 = rng.gen_range(20.0..120.0);
        let r = rng.gen_range(0..regions.len());

        let mut p = 0.05 + 0.8 * (s / 100.0);
        p += if r == 0 { 0.05 } else { 0.0 };
        p -= (inc - 70.0) / 1000.0;
        let event = rng.gen::<f64>() < p.clamp(0.01, 0.99);

        target.push(event as i32);
        score.push(s);
        income.push(if rng.gen::<f64>() < 0.1 { None } else { Some(inc) });
        region.push(regions[r]);
        noise.push(rng.gen::<f64>());
    }

    df! {
        "target" => target,
        "score" => score,
        "income" => income,
        "region" => region,
        "noise" => noise,
    }
    .unwrap()
}

/// Synthetic randomized-experiment data.
///
/// - `converted`: binary outcome
/// - `treated`: random 50/50 treatment assignment
/// - `responsive`: treatment lifts conversion only when this is high
/// - `baseline`: shifts conversion equally in both groups
/// - `segment`: categorical with no interaction
pub fn create_uplift_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut converted = Vec::with_capacity(rows);
    let mut treated = Vec::with_capacity(rows);
    let mut responsive = Vec::with_capacity(rows);
    let mut baseline = Vec::with_capacity(rows);
    let mut segment = Vec::with_capacity(rows);
    let segments = ["a", "b", "c"];

    for _ in 0..rows {
        let t = rng.gen_bool(0.5);
        let resp: f64 = rng.gen_range(0.0..1.0);
        let base: f64 = rng.gen_range(0.0..1.0);

        let mut p = 0.1 + 0.3 * base;
        if t && resp > 0.5 {
            p += 0.4;
        }
        converted.push((rng.gen::<f64>() < p) as i32);
        treated.push(t as i32);
        responsive.push(resp);
        baseline.push(base);
        segment.push(segments[rng.gen_range(0..segments.len())]);
    }

    df! {
        "converted" => converted,
        "treated" => treated,
        "responsive" => responsive,
        "baseline" => baseline,
        "segment" => segment,
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert two floats agree to within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} (±{}), got {}",
        expected,
        tol,
        actual
    );
}
