//! Weight of Evidence (WoE) and Information Value (IV) per bin
//!
//! Uses the ln(%events / %non-events) convention: a bin whose share of events
//! exceeds its share of non-events has positive WoE. Each row carries its own
//! IV contribution and penalty next to the running totals, so the last row's
//! cumulative columns equal the variable totals. The one exception is the
//! penalty of the validation OTHER group, which has no training row.

use serde::Serialize;

use super::binning::{BinTable, VariableKind};
use super::config::WoeParams;
use super::error::{InfoError, InfoResult};
use super::validation::Stability;

/// WoE statistics of one bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WoeStats {
    /// Share of all events that fall in this bin (after smoothing)
    pub dist_events: f64,
    /// Share of all non-events that fall in this bin (after smoothing)
    pub dist_non_events: f64,
    pub woe: f64,
    pub iv: f64,
}

/// Calculate WoE and IV contribution for a bin.
///
/// A zero count is replaced by `smoothing` before forming distributions, so
/// the logarithm is always defined. Non-zero counts are used as-is.
pub fn calculate_woe_iv(
    events: usize,
    non_events: usize,
    total_events: usize,
    total_non_events: usize,
    smoothing: f64,
) -> WoeStats {
    let dist_events = smoothed(events, smoothing) / total_events as f64;
    let dist_non_events = smoothed(non_events, smoothing) / total_non_events as f64;

    let woe = (dist_events / dist_non_events).ln();
    let iv = (dist_events - dist_non_events) * woe;

    WoeStats {
        dist_events,
        dist_non_events,
        woe,
        iv,
    }
}

fn smoothed(count: usize, smoothing: f64) -> f64 {
    if count == 0 {
        smoothing
    } else {
        count as f64
    }
}

/// Per-bin share of the bin-count penalty.
///
/// Summed over `k` bins this gives `weight * (k-1) * Σ 1/total`, the
/// small-sample upward bias of IV. A single bin is never penalized.
pub(crate) fn bin_count_penalty(n_bins: usize, totals: &[usize], weight: f64) -> f64 {
    if n_bins <= 1 {
        return 0.0;
    }
    let inverse_sum: f64 = totals.iter().map(|&t| 1.0 / t as f64).sum();
    weight * inverse_sum * (n_bins - 1) as f64 / n_bins as f64
}

/// Count events and non-events per bin.
///
/// Records whose bin is `None` are skipped.
pub(crate) fn count_outcomes<I>(
    assignments: I,
    outcome: &[u8],
    n_bins: usize,
) -> Vec<(usize, usize)>
where
    I: IntoIterator<Item = Option<usize>>,
{
    let mut counts = vec![(0usize, 0usize); n_bins];
    for (bin, &y) in assignments.into_iter().zip(outcome) {
        if let Some(idx) = bin {
            if y == 1 {
                counts[idx].0 += 1;
            } else {
                counts[idx].1 += 1;
            }
        }
    }
    counts
}

/// Fail with `DegenerateOutcome` unless both classes are present
pub(crate) fn check_outcome_classes(
    context: &str,
    events: usize,
    non_events: usize,
) -> InfoResult<()> {
    if events == 0 || non_events == 0 {
        return Err(InfoError::DegenerateOutcome {
            context: context.to_string(),
            events,
            non_events,
        });
    }
    Ok(())
}

/// Validation statistics attached to a training row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationStats {
    /// Validation records routed to this bin
    pub count: usize,
    /// Validation WoE, `None` when the bin received no validation records
    pub woe: Option<f64>,
    /// Instability penalty contributed by this bin
    pub stability_penalty: f64,
}

/// One row of a WoE table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WoeRow {
    pub label: String,
    pub bin: super::binning::Bin,
    pub count: usize,
    pub events: usize,
    pub non_events: usize,
    /// Percentage of all records in this bin
    pub population_pct: f64,
    /// events / count
    pub event_rate: f64,
    pub dist_events: f64,
    pub dist_non_events: f64,
    pub woe: f64,
    /// This bin's IV contribution
    pub iv: f64,
    /// Running IV total up to and including this bin
    pub cum_iv: f64,
    /// This bin's penalty (bin count share plus instability)
    pub penalty: f64,
    /// Running penalty total up to and including this bin
    pub cum_penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStats>,
}

/// WoE / IV table of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WoeTable {
    pub variable: String,
    pub kind: VariableKind,
    pub rows: Vec<WoeRow>,
    pub total_events: usize,
    pub total_non_events: usize,
    /// Σ of row IV contributions
    pub iv: f64,
    /// Σ of row penalties
    pub penalty: f64,
    /// `iv - penalty`
    pub adj_iv: f64,
    /// Validation records that matched no training bin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched_validation: Option<usize>,
    /// Validation-only OTHER group formed by those records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_validation: Option<ValidationStats>,
}

impl WoeTable {
    /// Ordered (bin label, WoE) pairs, e.g. for plotting
    pub fn woe_points(&self) -> Vec<(String, f64)> {
        self.rows.iter().map(|r| (r.label.clone(), r.woe)).collect()
    }

    pub fn n_bins(&self) -> usize {
        self.rows.len()
    }

    /// Add per-bin instability penalties and recompute the penalty columns
    pub fn with_stability(mut self, stability: Stability) -> Self {
        for (row, bin) in self.rows.iter_mut().zip(&stability.bins) {
            row.penalty += bin.penalty;
            row.validation = Some(ValidationStats::from(bin));
        }
        self.unmatched_validation = Some(stability.unmatched);
        self.other_validation = stability.other.as_ref().map(ValidationStats::from);
        self.refresh_totals();
        self
    }

    fn refresh_totals(&mut self) {
        let mut cum_iv = 0.0;
        let mut cum_penalty = 0.0;
        for row in &mut self.rows {
            cum_iv += row.iv;
            cum_penalty += row.penalty;
            row.cum_iv = cum_iv;
            row.cum_penalty = cum_penalty;
        }
        self.iv = cum_iv;
        // the OTHER group has no training row
        self.penalty = cum_penalty
            + self
                .other_validation
                .as_ref()
                .map_or(0.0, |o| o.stability_penalty);
        self.adj_iv = self.iv - self.penalty;
    }
}

/// Compute WoE, IV and the bin-count penalty for a binned variable.
///
/// # Arguments
/// * `table` - Bins learned on the training data
/// * `outcome` - Binary outcome (0/1), one per training record, aligned with
///   the table's assignments
/// * `params` - Smoothing constant and penalty weights
///
/// # Errors
/// `DegenerateOutcome` when the outcome has a single class.
pub fn compute_woe(table: &BinTable, outcome: &[u8], params: &WoeParams) -> InfoResult<WoeTable> {
    let counts = count_outcomes(
        table.assignments().iter().map(|&idx| Some(idx)),
        outcome,
        table.len(),
    );
    let total_events: usize = counts.iter().map(|c| c.0).sum();
    let total_non_events: usize = counts.iter().map(|c| c.1).sum();
    check_outcome_classes("training data", total_events, total_non_events)?;

    let total = (total_events + total_non_events) as f64;
    let penalty = bin_count_penalty(
        table.len(),
        &[total_events, total_non_events],
        params.bin_penalty_weight,
    );

    let rows = table
        .bins
        .iter()
        .zip(&counts)
        .map(|(bin, &(events, non_events))| {
            let count = events + non_events;
            let stats = calculate_woe_iv(
                events,
                non_events,
                total_events,
                total_non_events,
                params.smoothing,
            );
            WoeRow {
                label: bin.label(),
                bin: bin.clone(),
                count,
                events,
                non_events,
                population_pct: count as f64 / total * 100.0,
                event_rate: if count > 0 { events as f64 / count as f64 } else { 0.0 },
                dist_events: stats.dist_events,
                dist_non_events: stats.dist_non_events,
                woe: stats.woe,
                iv: stats.iv,
                cum_iv: 0.0,
                penalty,
                cum_penalty: 0.0,
                validation: None,
            }
        })
        .collect();

    let mut woe_table = WoeTable {
        variable: table.variable.clone(),
        kind: table.kind,
        rows,
        total_events,
        total_non_events,
        iv: 0.0,
        penalty: 0.0,
        adj_iv: 0.0,
        unmatched_validation: None,
        other_validation: None,
    };
    woe_table.refresh_totals();

    Ok(woe_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::binning::{bin_variable, VariableValues};

    fn numeric(values: &[f64]) -> VariableValues {
        VariableValues::Numeric(values.iter().map(|&v| Some(v)).collect())
    }

    #[test]
    fn test_woe_iv_calculation() {
        // equal distributions give WoE 0
        let stats = calculate_woe_iv(10, 90, 100, 900, 0.5);
        assert!(stats.woe.abs() < 1e-12, "WoE should be 0 for equal distributions");
        assert!(stats.iv.abs() < 1e-12);

        let stats = calculate_woe_iv(30, 10, 100, 100, 0.5);
        assert!((stats.woe - 3.0f64.ln()).abs() < 1e-12);
        assert!(stats.iv > 0.0, "IV contribution is never negative");
    }

    #[test]
    fn test_smoothing_only_applies_to_zero_counts() {
        let stats = calculate_woe_iv(0, 4, 4, 4, 0.5);
        assert!((stats.dist_events - 0.125).abs() < 1e-12);
        assert!((stats.dist_non_events - 1.0).abs() < 1e-12);
        assert!(stats.woe.is_finite());
        assert!(stats.woe < 0.0);
    }

    #[test]
    fn test_woe_sign_follows_distribution() {
        for (e, ne) in [(5usize, 1usize), (1, 5), (3, 3), (0, 2), (2, 0)] {
            let stats = calculate_woe_iv(e, ne, 10, 10, 0.5);
            if stats.dist_events > stats.dist_non_events {
                assert!(stats.woe > 0.0);
            } else if stats.dist_events < stats.dist_non_events {
                assert!(stats.woe < 0.0);
            }
        }
    }

    #[test]
    fn test_perfect_split_scenario() {
        let values = numeric(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let table = bin_variable("x", &values, 2).unwrap();
        let outcome = [1u8, 1, 1, 1, 0, 0, 0, 0];
        let woe = compute_woe(&table, &outcome, &WoeParams::default()).unwrap();

        assert_eq!(woe.n_bins(), 2);
        assert_eq!(woe.rows[0].events, 4);
        assert_eq!(woe.rows[0].non_events, 0);
        assert!(woe.rows[0].woe > 0.0);
        assert!(woe.rows[1].woe < 0.0);
        assert!(woe.iv > 0.0);
    }

    #[test]
    fn test_iv_is_exact_sum_of_rows() {
        let values: Vec<f64> = (0..60).map(|i| ((i * 17) % 29) as f64).collect();
        let outcome: Vec<u8> = (0..60).map(|i| ((i * 7) % 3 == 0) as u8).collect();
        let table = bin_variable("x", &numeric(&values), 5).unwrap();
        let woe = compute_woe(&table, &outcome, &WoeParams::default()).unwrap();

        let mut sum = 0.0;
        for row in &woe.rows {
            sum += row.iv;
        }
        assert_eq!(sum, woe.iv);
        assert_eq!(woe.rows.last().unwrap().cum_iv, woe.iv);
        assert_eq!(woe.rows.last().unwrap().cum_penalty, woe.penalty);
        assert_eq!(woe.adj_iv, woe.iv - woe.penalty);
    }

    #[test]
    fn test_counts_sum_to_records() {
        let values =
            VariableValues::Numeric(vec![Some(1.0), None, Some(3.0), Some(4.0), None, Some(6.0)]);
        let outcome = [1u8, 0, 1, 0, 1, 0];
        let table = bin_variable("x", &values, 2).unwrap();
        let woe = compute_woe(&table, &outcome, &WoeParams::default()).unwrap();
        let total: usize = woe.rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 6);
        assert_eq!(woe.rows.last().unwrap().label, "MISSING");
        let pct: f64 = woe.rows.iter().map(|r| r.population_pct).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bin_count_penalty() {
        let values = numeric(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let table = bin_variable("x", &values, 4).unwrap();
        let outcome = [1u8, 0, 1, 0, 1, 0, 1, 0];
        let woe = compute_woe(&table, &outcome, &WoeParams::default()).unwrap();
        // (k-1) * (1/4 + 1/4) with k = 4
        assert!((woe.penalty - 1.5).abs() < 1e-12);

        let single = bin_variable("c", &numeric(&[2.0; 8]), 4).unwrap();
        let woe = compute_woe(&single, &outcome, &WoeParams::default()).unwrap();
        assert_eq!(woe.penalty, 0.0);
        assert_eq!(woe.adj_iv, woe.iv);
    }

    #[test]
    fn test_degenerate_outcome() {
        let table = bin_variable("x", &numeric(&[1.0, 2.0, 3.0]), 2).unwrap();
        let err = compute_woe(&table, &[1, 1, 1], &WoeParams::default()).unwrap_err();
        assert!(matches!(err, InfoError::DegenerateOutcome { events: 3, non_events: 0, .. }));
    }

    #[test]
    fn test_woe_points_in_bin_order() {
        let table = bin_variable("x", &numeric(&[1.0, 2.0, 3.0, 4.0]), 2).unwrap();
        let woe = compute_woe(&table, &[1, 0, 0, 1], &WoeParams::default()).unwrap();
        let points = woe.woe_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, "[1, 2]");
    }
}
