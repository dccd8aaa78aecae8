//! Information tables for every variable of a dataset
//!
//! Resolves the outcome (and optional treatment) columns, checks the
//! validation dataset against the training schema, then bins and scores each
//! variable independently. Run-level problems abort before any variable is
//! touched; a failure inside one variable is recorded on its summary row and
//! the run carries on.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::binning::{bin_variable, VariableKind, VariableValues};
use super::config::{InfoConfig, WoeParams};
use super::error::{InfoError, InfoResult};
use super::iv::{check_outcome_classes, compute_woe, ValidationStats, WoeTable};
use super::target::{binary_column, TargetMapping};
use super::uplift::{compute_nwoe, NwoeTable};
use super::validation::{validate, validate_uplift};
use crate::report::{summarize, InfoTables};
use crate::utils::{create_hidden_progress_bar, create_progress_bar};

/// Binary outcome analysis (WoE / IV) or uplift analysis (NWoE / NIV)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Binary,
    Uplift,
}

impl AnalysisMode {
    /// Name of the score column ("IV" or "NIV")
    pub fn score_name(&self) -> &'static str {
        match self {
            AnalysisMode::Binary => "IV",
            AnalysisMode::Uplift => "NIV",
        }
    }

    /// Name of the adjusted score column ("AdjIV" or "AdjNIV")
    pub fn adjusted_name(&self) -> &'static str {
        match self {
            AnalysisMode::Binary => "AdjIV",
            AnalysisMode::Uplift => "AdjNIV",
        }
    }
}

/// Bin-level table of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VariableTable {
    Woe(WoeTable),
    Nwoe(NwoeTable),
}

impl VariableTable {
    pub fn variable(&self) -> &str {
        match self {
            VariableTable::Woe(t) => &t.variable,
            VariableTable::Nwoe(t) => &t.variable,
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            VariableTable::Woe(t) => t.kind,
            VariableTable::Nwoe(t) => t.kind,
        }
    }

    /// IV or NIV
    pub fn score(&self) -> f64 {
        match self {
            VariableTable::Woe(t) => t.iv,
            VariableTable::Nwoe(t) => t.niv,
        }
    }

    /// Total penalty subtracted from the score
    pub fn penalty(&self) -> f64 {
        match self {
            VariableTable::Woe(t) => t.penalty,
            VariableTable::Nwoe(t) => t.penalty,
        }
    }

    /// AdjIV or AdjNIV
    pub fn adjusted_score(&self) -> f64 {
        match self {
            VariableTable::Woe(t) => t.adj_iv,
            VariableTable::Nwoe(t) => t.adj_niv,
        }
    }

    /// Number of bins produced, including the missing bin
    pub fn n_bins(&self) -> usize {
        match self {
            VariableTable::Woe(t) => t.n_bins(),
            VariableTable::Nwoe(t) => t.n_bins(),
        }
    }

    /// Ordered (bin label, WoE or NWoE) pairs for plotting
    pub fn woe_points(&self) -> Vec<(String, f64)> {
        match self {
            VariableTable::Woe(t) => t.woe_points(),
            VariableTable::Nwoe(t) => t.nwoe_points(),
        }
    }

    /// Validation records that matched no training bin, if any
    pub fn other_validation(&self) -> Option<&ValidationStats> {
        match self {
            VariableTable::Woe(t) => t.other_validation.as_ref(),
            VariableTable::Nwoe(t) => t.other_validation.as_ref(),
        }
    }

    pub fn as_woe(&self) -> Option<&WoeTable> {
        match self {
            VariableTable::Woe(t) => Some(t),
            VariableTable::Nwoe(_) => None,
        }
    }

    pub fn as_nwoe(&self) -> Option<&NwoeTable> {
        match self {
            VariableTable::Nwoe(t) => Some(t),
            VariableTable::Woe(_) => None,
        }
    }
}

/// Datasets and column roles for one analysis run
#[derive(Debug, Clone, Copy)]
pub struct InfoInput<'a> {
    pub train: &'a DataFrame,
    pub outcome: &'a str,
    pub treatment: Option<&'a str>,
    pub valid: Option<&'a DataFrame>,
    pub outcome_mapping: Option<&'a TargetMapping>,
    pub treatment_mapping: Option<&'a TargetMapping>,
}

impl<'a> InfoInput<'a> {
    pub fn new(train: &'a DataFrame, outcome: &'a str) -> Self {
        Self {
            train,
            outcome,
            treatment: None,
            valid: None,
            outcome_mapping: None,
            treatment_mapping: None,
        }
    }

    /// Switch to uplift analysis with this treatment column
    pub fn with_treatment(mut self, treatment: &'a str) -> Self {
        self.treatment = Some(treatment);
        self
    }

    /// Penalize instability against a validation dataset
    pub fn with_valid(mut self, valid: &'a DataFrame) -> Self {
        self.valid = Some(valid);
        self
    }

    pub fn with_outcome_mapping(mut self, mapping: &'a TargetMapping) -> Self {
        self.outcome_mapping = Some(mapping);
        self
    }

    pub fn with_treatment_mapping(mut self, mapping: &'a TargetMapping) -> Self {
        self.treatment_mapping = Some(mapping);
        self
    }

    pub fn mode(&self) -> AnalysisMode {
        if self.treatment.is_some() {
            AnalysisMode::Uplift
        } else {
            AnalysisMode::Binary
        }
    }
}

/// Records of one dataset that take part in the analysis
struct Prepared<'a> {
    df: &'a DataFrame,
    /// Row is kept (outcome, and treatment in uplift mode, are known)
    keep: Vec<bool>,
    outcome: Vec<u8>,
    treatment: Option<Vec<u8>>,
}

impl Prepared<'_> {
    fn values(&self, variable: &str) -> InfoResult<VariableValues> {
        Ok(variable_values(self.df, variable)?.filter(&self.keep))
    }
}

/// Numeric dtypes are binned by quantiles, everything else by level
pub fn variable_kind(dtype: &DataType) -> VariableKind {
    if dtype.is_primitive_numeric() {
        VariableKind::Numeric
    } else {
        VariableKind::Categorical
    }
}

/// Read one column as variable values
pub fn variable_values(df: &DataFrame, name: &str) -> InfoResult<VariableValues> {
    let col = df
        .column(name)
        .map_err(|_| InfoError::ColumnNotFound(name.to_string()))?;

    match variable_kind(col.dtype()) {
        VariableKind::Numeric => {
            let float_col = col.cast(&DataType::Float64)?;
            Ok(VariableValues::Numeric(float_col.f64()?.into_iter().collect()))
        }
        VariableKind::Categorical => {
            let string_col = col.cast(&DataType::String)?;
            Ok(VariableValues::Categorical(
                string_col
                    .str()?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect(),
            ))
        }
    }
}

fn prepare<'a>(
    df: &'a DataFrame,
    input: &InfoInput<'_>,
    context: &str,
) -> InfoResult<Prepared<'a>> {
    let outcome = binary_column(df, input.outcome, input.outcome_mapping)?;
    let treatment = input
        .treatment
        .map(|t| binary_column(df, t, input.treatment_mapping))
        .transpose()?;

    let keep: Vec<bool> = (0..df.height())
        .map(|i| {
            outcome[i].is_some() && treatment.as_ref().map_or(true, |t| t[i].is_some())
        })
        .collect();

    let kept_outcome: Vec<u8> = outcome
        .iter()
        .zip(&keep)
        .filter_map(|(y, &k)| if k { *y } else { None })
        .collect();
    let kept_treatment: Option<Vec<u8>> = treatment.as_ref().map(|t| {
        t.iter()
            .zip(&keep)
            .filter_map(|(v, &k)| if k { *v } else { None })
            .collect()
    });

    let events = kept_outcome.iter().filter(|&&y| y == 1).count();
    check_outcome_classes(context, events, kept_outcome.len() - events)?;

    if let Some(trt) = &kept_treatment {
        for (arm, flag) in [("treatment group", 1u8), ("control group", 0u8)] {
            let arm_outcome: Vec<u8> = kept_outcome
                .iter()
                .zip(trt)
                .filter(|&(_, &t)| t == flag)
                .map(|(&y, _)| y)
                .collect();
            let events = arm_outcome.iter().filter(|&&y| y == 1).count();
            check_outcome_classes(
                &format!("{} of {}", arm, context),
                events,
                arm_outcome.len() - events,
            )?;
        }
    }

    Ok(Prepared {
        df,
        keep,
        outcome: kept_outcome,
        treatment: kept_treatment,
    })
}

/// Columns in the validation set must exist under the same names
fn as_schema_mismatch(err: InfoError) -> InfoError {
    match err {
        InfoError::ColumnNotFound(column) => InfoError::SchemaMismatch {
            column,
            reason: "present in training data but missing from validation data".to_string(),
        },
        other => other,
    }
}

fn resolve_variables(
    df: &DataFrame,
    input: &InfoInput<'_>,
    config: &InfoConfig,
) -> InfoResult<Vec<String>> {
    let reserved = |name: &str| name == input.outcome || Some(name) == input.treatment;

    match &config.variables {
        Some(requested) => {
            for name in requested {
                if reserved(name) {
                    return Err(InfoError::InvalidConfig(format!(
                        "'{}' is the outcome or treatment column and cannot be analyzed",
                        name
                    )));
                }
                if df.column(name).is_err() {
                    return Err(InfoError::ColumnNotFound(name.clone()));
                }
            }
            Ok(requested.clone())
        }
        None => Ok(df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| !reserved(name))
            .collect()),
    }
}

fn check_valid_schema(
    train: &DataFrame,
    valid: &DataFrame,
    variables: &[String],
) -> InfoResult<()> {
    for name in variables {
        let valid_col = valid.column(name).map_err(|_| InfoError::SchemaMismatch {
            column: name.clone(),
            reason: "present in training data but missing from validation data".to_string(),
        })?;
        let train_kind = variable_kind(train.column(name)?.dtype());
        let valid_kind = variable_kind(valid_col.dtype());
        if train_kind != valid_kind {
            return Err(InfoError::SchemaMismatch {
                column: name.clone(),
                reason: format!(
                    "training column is {} but validation column is {}",
                    train_kind, valid_kind
                ),
            });
        }
    }
    Ok(())
}

fn analyze_variable(
    name: &str,
    train: &Prepared<'_>,
    valid: Option<&Prepared<'_>>,
    config: &InfoConfig,
    params: &WoeParams,
) -> InfoResult<VariableTable> {
    let values = train.values(name)?;
    let table = bin_variable(name, &values, config.bins)?;

    match &train.treatment {
        None => {
            let mut woe = compute_woe(&table, &train.outcome, params)?;
            if let Some(valid) = valid {
                let valid_values = valid.values(name)?;
                let stability = validate(&woe, &table, &valid_values, &valid.outcome, params)?;
                woe = woe.with_stability(stability);
            }
            Ok(VariableTable::Woe(woe))
        }
        Some(treatment) => {
            let mut nwoe = compute_nwoe(&table, &train.outcome, treatment, params)?;
            if let Some(valid) = valid {
                let valid_values = valid.values(name)?;
                let valid_treatment = valid.treatment.as_deref().unwrap_or(&[]);
                let stability = validate_uplift(
                    &nwoe,
                    &table,
                    &valid_values,
                    &valid.outcome,
                    valid_treatment,
                    params,
                )?;
                nwoe = nwoe.with_stability(stability);
            }
            Ok(VariableTable::Nwoe(nwoe))
        }
    }
}

/// A run-level error raised inside any variable invalidates them all
fn take_global_error(results: &mut Vec<(String, InfoResult<VariableTable>)>) -> Option<InfoError> {
    let pos = results
        .iter()
        .position(|(_, r)| r.as_ref().is_err_and(InfoError::is_global))?;
    results.swap_remove(pos).1.err()
}

/// Build WoE/IV (or NWoE/NIV) tables for every requested variable.
///
/// # Arguments
/// * `input` - Training data, outcome and optional treatment / validation data
/// * `config` - Bin count, variable subset, smoothing and penalty weights
///
/// # Returns
/// The ranked summary plus the bin-level table of each successful variable.
/// Every requested variable appears in the summary, with a score or a reason.
///
/// # Errors
/// Run-level errors only (see [`InfoError::is_global`]): invalid
/// configuration, missing or non-binary outcome/treatment columns, a
/// single-class outcome, and validation data whose schema differs from the
/// training data.
pub fn create_infotables(input: &InfoInput<'_>, config: &InfoConfig) -> InfoResult<InfoTables> {
    config.validate()?;
    let params = config.woe_params();
    let mode = input.mode();

    let variables = resolve_variables(input.train, input, config)?;
    let train = prepare(input.train, input, "training data")?;
    let valid = match input.valid {
        Some(valid_df) => {
            check_valid_schema(input.train, valid_df, &variables)?;
            Some(prepare(valid_df, input, "validation data").map_err(as_schema_mismatch)?)
        }
        None => None,
    };

    tracing::debug!(
        "analyzing {} variable(s), {} training record(s), mode {:?}",
        variables.len(),
        train.outcome.len(),
        mode
    );

    let pb = if config.show_progress {
        create_progress_bar(variables.len() as u64, "   Binning variables")
    } else {
        create_hidden_progress_bar()
    };

    let run = |name: &String| {
        let result = analyze_variable(name, &train, valid.as_ref(), config, &params);
        match &result {
            Ok(table) => tracing::debug!(
                "{}: {} bin(s), {} = {:.4}, {} = {:.4}",
                name,
                table.n_bins(),
                mode.score_name(),
                table.score(),
                mode.adjusted_name(),
                table.adjusted_score()
            ),
            Err(e) => tracing::warn!("{}: skipped ({})", name, e),
        }
        pb.inc(1);
        (name.clone(), result)
    };

    let mut results: Vec<(String, InfoResult<VariableTable>)> = if config.parallel {
        variables.par_iter().map(run).collect()
    } else {
        variables.iter().map(run).collect()
    };

    pb.finish_and_clear();

    if let Some(err) = take_global_error(&mut results) {
        return Err(err);
    }

    Ok(summarize(mode, results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_df() -> DataFrame {
        df! {
            "y" => [1i32, 1, 1, 1, 0, 0, 0, 0],
            "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        }
        .unwrap()
    }

    #[test]
    fn test_variable_kind() {
        assert_eq!(variable_kind(&DataType::Int32), VariableKind::Numeric);
        assert_eq!(variable_kind(&DataType::Float64), VariableKind::Numeric);
        assert_eq!(variable_kind(&DataType::String), VariableKind::Categorical);
        assert_eq!(variable_kind(&DataType::Boolean), VariableKind::Categorical);
    }

    #[test]
    fn test_variable_values() {
        let df = df! {
            "n" => [Some(1i32), None, Some(3)],
            "s" => [Some("a"), Some("b"), None],
        }
        .unwrap();
        assert_eq!(
            variable_values(&df, "n").unwrap(),
            VariableValues::Numeric(vec![Some(1.0), None, Some(3.0)])
        );
        assert_eq!(
            variable_values(&df, "s").unwrap(),
            VariableValues::Categorical(vec![Some("a".to_string()), Some("b".to_string()), None])
        );
        assert!(matches!(
            variable_values(&df, "missing"),
            Err(InfoError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_prepare_drops_unknown_outcome() {
        let df = df! {
            "y" => [Some(1i32), None, Some(0), Some(1)],
            "x" => [1.0f64, 2.0, 3.0, 4.0],
        }
        .unwrap();
        let input = InfoInput::new(&df, "y");
        let prepared = prepare(&df, &input, "training data").unwrap();
        assert_eq!(prepared.keep, vec![true, false, true, true]);
        assert_eq!(prepared.outcome, vec![1, 0, 1]);
        assert_eq!(
            prepared.values("x").unwrap(),
            VariableValues::Numeric(vec![Some(1.0), Some(3.0), Some(4.0)])
        );
    }

    #[test]
    fn test_prepare_uplift_drops_unknown_treatment() {
        let df = df! {
            "y" => [1i32, 0, 1, 0, 1, 0],
            "t" => [Some(1i32), Some(1), None, Some(0), Some(0), Some(1)],
        }
        .unwrap();
        let input = InfoInput::new(&df, "y").with_treatment("t");
        let prepared = prepare(&df, &input, "training data").unwrap();
        assert_eq!(prepared.outcome, vec![1, 0, 0, 1, 0]);
        assert_eq!(prepared.treatment, Some(vec![1, 1, 0, 0, 1]));
    }

    #[test]
    fn test_scenario_end_to_end() {
        let df = scenario_df();
        let input = InfoInput::new(&df, "y");
        let config = InfoConfig::default().with_bins(2);
        let result = create_infotables(&input, &config).unwrap();

        let table = result.tables["x"].as_woe().unwrap();
        assert_eq!(table.n_bins(), 2);
        assert!(table.rows[0].woe > 0.0);
        assert!(table.rows[1].woe < 0.0);
        assert!(table.iv > 0.0);
        assert_eq!(result.summary.rows[0].rank, Some(1));
    }

    #[test]
    fn test_only_global_errors_abort() {
        let mut results: Vec<(String, InfoResult<VariableTable>)> = vec![
            (
                "a".to_string(),
                Err(InfoError::InsufficientData {
                    variable: "a".to_string(),
                }),
            ),
            ("b".to_string(), Err(InfoError::InvalidConfig("bins".to_string()))),
        ];
        assert!(matches!(
            take_global_error(&mut results),
            Some(InfoError::InvalidConfig(_))
        ));
        assert_eq!(results.len(), 1);
        assert!(take_global_error(&mut results).is_none());

        let mut results: Vec<(String, InfoResult<VariableTable>)> = vec![(
            "c".to_string(),
            Err(InfoError::DegenerateOutcome {
                context: "validation data".to_string(),
                events: 2,
                non_events: 0,
            }),
        )];
        assert!(matches!(
            take_global_error(&mut results),
            Some(InfoError::DegenerateOutcome { .. })
        ));
    }

    #[test]
    fn test_outcome_as_variable_is_rejected() {
        let df = scenario_df();
        let input = InfoInput::new(&df, "y");
        let config = InfoConfig::default().with_variables(["y"]);
        assert!(matches!(
            create_infotables(&input, &config),
            Err(InfoError::InvalidConfig(_))
        ));
    }
}
