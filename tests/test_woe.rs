//! Tests for WoE / IV calculation through the public pipeline

use infotables::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn woe_of(result: &infotables::report::InfoTables, name: &str) -> WoeTable {
    result.tables[name].as_woe().unwrap().clone()
}

#[test]
fn test_eight_record_scenario() {
    let df = create_scenario_dataframe();
    let config = InfoConfig::default().with_bins(2);
    let result = create_infotables(&InfoInput::new(&df, "y"), &config).unwrap();
    let table = woe_of(&result, "x");

    assert_eq!(table.n_bins(), 2);
    assert_eq!(table.rows[0].label, "[1, 4]");
    assert_eq!(table.rows[1].label, "[5, 8]");
    assert_eq!((table.rows[0].events, table.rows[0].non_events), (4, 0));
    assert_eq!((table.rows[1].events, table.rows[1].non_events), (0, 4));

    // zero counts are smoothed to 0.5: WoE = ±ln(1 / 0.125)
    assert_close(table.rows[0].woe, 8.0f64.ln(), 1e-12);
    assert_close(table.rows[1].woe, -(8.0f64.ln()), 1e-12);
    assert_close(table.iv, 2.0 * 0.875 * 8.0f64.ln(), 1e-12);

    // (k-1) * (1/4 + 1/4) with k = 2
    assert_close(table.penalty, 0.5, 1e-12);
    assert_close(table.adj_iv, table.iv - 0.5, 1e-12);
    assert_close(table.rows[0].population_pct, 50.0, 1e-12);
    assert_close(table.rows[0].event_rate, 1.0, 1e-12);
}

#[test]
fn test_iv_is_sum_of_bin_contributions() {
    let df = create_credit_dataframe(2000, 42);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    for table in result.tables.values() {
        let woe = table.as_woe().unwrap();
        let total: f64 = woe.rows.iter().map(|r| r.iv).sum();
        assert_close(woe.iv, total, 1e-9);
        assert_close(woe.rows.last().unwrap().cum_iv, woe.iv, 1e-9);
        assert_close(woe.adj_iv, woe.iv - woe.penalty, 1e-9);
        assert!(woe.rows.iter().all(|r| r.iv >= 0.0));
    }
}

#[test]
fn test_counts_add_up_to_records() {
    let df = create_credit_dataframe(1500, 3);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    for table in result.tables.values() {
        let woe = table.as_woe().unwrap();
        let count: usize = woe.rows.iter().map(|r| r.count).sum();
        assert_eq!(count, 1500);
        assert_eq!(woe.total_events + woe.total_non_events, 1500);
        let pct: f64 = woe.rows.iter().map(|r| r.population_pct).sum();
        assert_close(pct, 100.0, 1e-9);
    }
}

#[test]
fn test_woe_sign_matches_distributions() {
    let df = create_credit_dataframe(1000, 5);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    for table in result.tables.values() {
        for row in &table.as_woe().unwrap().rows {
            if row.dist_events > row.dist_non_events {
                assert!(row.woe > 0.0);
            } else if row.dist_events < row.dist_non_events {
                assert!(row.woe < 0.0);
            } else {
                assert_close(row.woe, 0.0, 1e-12);
            }
        }
    }
}

#[test]
fn test_strong_predictor_outranks_noise() {
    let df = create_credit_dataframe(3000, 17);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    let score = result.summary.row("score").unwrap();
    let noise = result.summary.row("noise").unwrap();
    assert_eq!(score.rank, Some(1));
    assert!(score.adjusted.unwrap() > noise.adjusted.unwrap());
    assert!(noise.adjusted.unwrap() < 0.1);
}

#[test]
fn test_missing_values_get_their_own_row() {
    let df = create_credit_dataframe(1000, 9);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    let income = woe_of(&result, "income");
    let last = income.rows.last().unwrap();
    assert!(last.bin.is_missing());
    assert_eq!(last.label, MISSING_LABEL);
    assert!(last.count > 0);
}

#[test]
fn test_categorical_variable_one_row_per_level() {
    let df = create_credit_dataframe(800, 21);
    let result = create_infotables(&InfoInput::new(&df, "target"), &InfoConfig::default()).unwrap();

    let region = woe_of(&result, "region");
    assert_eq!(region.kind, VariableKind::Categorical);
    assert_eq!(region.n_bins(), 4);

    let points = result.tables["region"].woe_points();
    assert_eq!(points.len(), 4);
    for (point, row) in points.iter().zip(&region.rows) {
        assert_eq!(point.0, row.label);
        assert_eq!(point.1, row.woe);
    }
}

#[test]
fn test_more_bins_cost_more_penalty() {
    let df = create_credit_dataframe(2000, 31);
    let input = InfoInput::new(&df, "target");
    let coarse = create_infotables(&input, &InfoConfig::default().with_bins(2)).unwrap();
    let fine = create_infotables(&input, &InfoConfig::default().with_bins(20)).unwrap();

    let coarse_noise = coarse.tables["noise"].penalty();
    let fine_noise = fine.tables["noise"].penalty();
    assert!(fine_noise > coarse_noise);
}
