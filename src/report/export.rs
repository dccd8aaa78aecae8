//! JSON export of information tables

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::summary::{InfoTables, Summary};
use crate::pipeline::{AnalysisMode, InfoConfig, VariableTable};

/// Metadata about the analysis run
#[derive(Debug, Serialize)]
pub struct AnalysisMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    pub infotables_version: String,
    pub mode: AnalysisMode,
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_file: Option<String>,
    pub outcome_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_column: Option<String>,
    pub bins: usize,
    pub smoothing: f64,
    pub bin_penalty_weight: f64,
    pub stability_weight: f64,
    pub variables_analyzed: usize,
    pub variables_failed: usize,
}

/// Complete export document
#[derive(Debug, Serialize)]
pub struct InfoTablesExport<'a> {
    pub metadata: AnalysisMetadata,
    pub summary: &'a Summary,
    pub tables: &'a BTreeMap<String, VariableTable>,
}

/// Run parameters recorded in the export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub validation_file: Option<&'a str>,
    pub outcome_column: &'a str,
    pub treatment_column: Option<&'a str>,
    pub config: &'a InfoConfig,
}

fn build_export<'a>(result: &'a InfoTables, params: &ExportParams) -> InfoTablesExport<'a> {
    InfoTablesExport {
        metadata: AnalysisMetadata {
            timestamp: Utc::now().to_rfc3339(),
            infotables_version: env!("CARGO_PKG_VERSION").to_string(),
            mode: result.mode(),
            input_file: params.input_file.to_string(),
            validation_file: params.validation_file.map(|s| s.to_string()),
            outcome_column: params.outcome_column.to_string(),
            treatment_column: params.treatment_column.map(|s| s.to_string()),
            bins: params.config.bins,
            smoothing: params.config.smoothing,
            bin_penalty_weight: params.config.bin_penalty_weight,
            stability_weight: params.config.stability_weight,
            variables_analyzed: result.summary.rows.len(),
            variables_failed: result.summary.failed().count(),
        },
        summary: &result.summary,
        tables: &result.tables,
    }
}

/// Export the summary and every variable table to a JSON file
///
/// # Arguments
/// * `result` - Output of `create_infotables`
/// * `output_path` - Path to write the JSON file
/// * `params` - Run parameters for metadata
pub fn export_infotables(
    result: &InfoTables,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = build_export(result, params);

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize information tables to JSON")?;

    std::fs::write(output_path, json).with_context(|| {
        format!(
            "Failed to write information tables to {}",
            output_path.display()
        )
    })?;

    Ok(())
}
