//! Net Weight of Evidence (NWoE) and Net Information Value (NIV) for uplift analysis
//!
//! Each bin is split into the treatment group (flag 1) and the control group
//! (flag 0). WoE is computed separately within each group and
//! `NWoE = WoE(treatment) - WoE(control)`. The NIV contribution of a bin is
//! `(Pt(bin|1)·Pc(bin|0) - Pt(bin|0)·Pc(bin|1)) · NWoE`, which has the same
//! sign as NWoE and is therefore never negative.

use serde::Serialize;

use super::binning::{Bin, BinTable, VariableKind};
use super::config::WoeParams;
use super::error::{InfoError, InfoResult};
use super::iv::{
    bin_count_penalty, calculate_woe_iv, check_outcome_classes, count_outcomes, ValidationStats,
    WoeStats,
};
use super::validation::Stability;

/// Counts and WoE of one treatment arm within a bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmStats {
    pub count: usize,
    pub events: usize,
    pub non_events: usize,
    pub event_rate: f64,
    /// `None` when the arm has no records in this bin
    pub woe: Option<f64>,
}

impl ArmStats {
    fn new(events: usize, non_events: usize, stats: Option<&WoeStats>) -> Self {
        let count = events + non_events;
        Self {
            count,
            events,
            non_events,
            event_rate: if count > 0 { events as f64 / count as f64 } else { 0.0 },
            woe: stats.map(|s| s.woe),
        }
    }
}

/// One row of an NWoE table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NwoeRow {
    pub label: String,
    pub bin: Bin,
    pub count: usize,
    pub treatment: ArmStats,
    pub control: ArmStats,
    /// `None` for excluded bins
    pub nwoe: Option<f64>,
    /// `Pt(bin|1)·Pc(bin|0) - Pt(bin|0)·Pc(bin|1)`, zero for excluded bins
    pub contrast: f64,
    /// This bin's NIV contribution
    pub niv: f64,
    pub cum_niv: f64,
    pub penalty: f64,
    pub cum_penalty: f64,
    /// Why the bin was left out of NIV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStats>,
}

/// Event / non-event totals of one arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArmTotals {
    pub events: usize,
    pub non_events: usize,
}

/// NWoE / NIV table of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NwoeTable {
    pub variable: String,
    pub kind: VariableKind,
    pub rows: Vec<NwoeRow>,
    pub treatment_totals: ArmTotals,
    pub control_totals: ArmTotals,
    pub niv: f64,
    pub penalty: f64,
    /// `niv - penalty`
    pub adj_niv: f64,
    /// Number of bins left out of NIV for lack of records in one arm
    pub excluded_bins: usize,
    /// Validation records that matched no training bin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched_validation: Option<usize>,
    /// Validation-only OTHER group formed by those records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_validation: Option<ValidationStats>,
}

impl NwoeTable {
    /// Ordered (bin label, NWoE) pairs of the bins included in NIV
    pub fn nwoe_points(&self) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.nwoe.map(|v| (r.label.clone(), v)))
            .collect()
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
        let mut cum_niv = 0.0;
        let mut cum_penalty = 0.0;
        for row in &mut self.rows {
            cum_niv += row.niv;
            cum_penalty += row.penalty;
            row.cum_niv = cum_niv;
            row.cum_penalty = cum_penalty;
        }
        self.niv = cum_niv;
        // the OTHER group has no training row
        self.penalty = cum_penalty
            + self
                .other_validation
                .as_ref()
                .map_or(0.0, |o| o.stability_penalty);
        self.adj_niv = self.niv - self.penalty;
    }
}

/// Per-bin arm counts: (treatment events, treatment non-events, control events, control non-events)
pub(crate) fn count_arms<I>(
    assignments: I,
    outcome: &[u8],
    treatment: &[u8],
    n_bins: usize,
) -> (Vec<(usize, usize)>, Vec<(usize, usize)>)
where
    I: IntoIterator<Item = Option<usize>>,
{
    let assignments: Vec<Option<usize>> = assignments.into_iter().collect();
    let treated = count_outcomes(
        assignments
            .iter()
            .zip(treatment)
            .map(|(idx, &t)| if t == 1 { *idx } else { None }),
        outcome,
        n_bins,
    );
    let control = count_outcomes(
        assignments
            .iter()
            .zip(treatment)
            .map(|(idx, &t)| if t == 0 { *idx } else { None }),
        outcome,
        n_bins,
    );
    (treated, control)
}

pub(crate) fn arm_totals(counts: &[(usize, usize)]) -> ArmTotals {
    ArmTotals {
        events: counts.iter().map(|c| c.0).sum(),
        non_events: counts.iter().map(|c| c.1).sum(),
    }
}

/// NWoE and contrast of one bin, `None` if either arm is empty
pub(crate) fn net_woe(
    treated: (usize, usize),
    control: (usize, usize),
    treatment_totals: ArmTotals,
    control_totals: ArmTotals,
    smoothing: f64,
) -> Option<(WoeStats, WoeStats, f64, f64)> {
    if treated.0 + treated.1 == 0 || control.0 + control.1 == 0 {
        return None;
    }
    let t = calculate_woe_iv(
        treated.0,
        treated.1,
        treatment_totals.events,
        treatment_totals.non_events,
        smoothing,
    );
    let c = calculate_woe_iv(
        control.0,
        control.1,
        control_totals.events,
        control_totals.non_events,
        smoothing,
    );
    let nwoe = t.woe - c.woe;
    let contrast = t.dist_events * c.dist_non_events - t.dist_non_events * c.dist_events;
    Some((t, c, nwoe, contrast))
}

/// Compute NWoE, NIV and the bin-count penalty for a binned variable.
///
/// # Arguments
/// * `table` - Bins learned on the training data
/// * `outcome` - Binary outcome (0/1), aligned with the table's assignments
/// * `treatment` - Treatment flag (1 = treatment, 0 = control), same alignment
/// * `params` - Smoothing constant and penalty weights
///
/// # Errors
/// * `DegenerateOutcome` when either arm has a single outcome class
/// * `InsufficientGroup` when no bin has records in both arms. Individual
///   bins missing an arm are excluded from NIV and reported on their row.
pub fn compute_nwoe(
    table: &BinTable,
    outcome: &[u8],
    treatment: &[u8],
    params: &WoeParams,
) -> InfoResult<NwoeTable> {
    let (treated, control) = count_arms(
        table.assignments().iter().map(|&idx| Some(idx)),
        outcome,
        treatment,
        table.len(),
    );
    let treatment_totals = arm_totals(&treated);
    let control_totals = arm_totals(&control);
    check_outcome_classes(
        "treatment group",
        treatment_totals.events,
        treatment_totals.non_events,
    )?;
    check_outcome_classes(
        "control group",
        control_totals.events,
        control_totals.non_events,
    )?;

    let mut rows = Vec::with_capacity(table.len());
    let mut first_exclusion: Option<InfoError> = None;

    for (i, bin) in table.bins.iter().enumerate() {
        let label = bin.label();
        match net_woe(
            treated[i],
            control[i],
            treatment_totals,
            control_totals,
            params.smoothing,
        ) {
            Some((t, c, nwoe, contrast)) => rows.push(NwoeRow {
                label,
                bin: bin.clone(),
                count: bin.count,
                treatment: ArmStats::new(treated[i].0, treated[i].1, Some(&t)),
                control: ArmStats::new(control[i].0, control[i].1, Some(&c)),
                nwoe: Some(nwoe),
                contrast,
                niv: contrast * nwoe,
                cum_niv: 0.0,
                penalty: 0.0,
                cum_penalty: 0.0,
                excluded: None,
                validation: None,
            }),
            None => {
                let arm = if treated[i].0 + treated[i].1 == 0 {
                    "treatment"
                } else {
                    "control"
                };
                let err = InfoError::InsufficientGroup {
                    variable: table.variable.clone(),
                    bin: label.clone(),
                    arm: arm.to_string(),
                };
                tracing::debug!("{}; bin excluded from NIV", err);
                rows.push(NwoeRow {
                    label,
                    bin: bin.clone(),
                    count: bin.count,
                    treatment: ArmStats::new(treated[i].0, treated[i].1, None),
                    control: ArmStats::new(control[i].0, control[i].1, None),
                    nwoe: None,
                    contrast: 0.0,
                    niv: 0.0,
                    cum_niv: 0.0,
                    penalty: 0.0,
                    cum_penalty: 0.0,
                    excluded: Some(err.to_string()),
                    validation: None,
                });
                first_exclusion.get_or_insert(err);
            }
        }
    }

    let excluded_bins = rows.iter().filter(|r| r.excluded.is_some()).count();
    if excluded_bins == rows.len() {
        if let Some(err) = first_exclusion {
            return Err(err);
        }
    }

    let included = rows.len() - excluded_bins;
    let penalty = bin_count_penalty(
        included,
        &[
            treatment_totals.events,
            treatment_totals.non_events,
            control_totals.events,
            control_totals.non_events,
        ],
        params.bin_penalty_weight,
    );
    for row in rows.iter_mut().filter(|r| r.excluded.is_none()) {
        row.penalty = penalty;
    }

    let mut nwoe_table = NwoeTable {
        variable: table.variable.clone(),
        kind: table.kind,
        rows,
        treatment_totals,
        control_totals,
        niv: 0.0,
        penalty: 0.0,
        adj_niv: 0.0,
        excluded_bins,
        unmatched_validation: None,
        other_validation: None,
    };
    nwoe_table.refresh_totals();

    Ok(nwoe_table)
}
