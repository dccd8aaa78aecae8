//! Ranked summary of all analyzed variables

use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::{
    AnalysisMode, InfoError, InfoResult, VariableKind, VariableTable, OTHER_LABEL,
};

/// One variable's line in the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<VariableKind>,
    /// IV or NIV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// AdjIV or AdjNIV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    /// 1 = highest adjusted score; `None` for failed variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    /// Why the variable could not be scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl SummaryRow {
    pub fn is_ranked(&self) -> bool {
        self.rank.is_some()
    }
}

/// Ranked variables followed by failed ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub mode: AnalysisMode,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn ranked(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().filter(|r| r.is_ranked())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().filter(|r| !r.is_ranked())
    }

    pub fn row(&self, variable: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.variable == variable)
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style(format!("{} SUMMARY", self.mode.score_name())).white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Rank").add_attribute(Attribute::Bold),
            Cell::new("Variable").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Bins").add_attribute(Attribute::Bold),
            Cell::new(self.mode.score_name()).add_attribute(Attribute::Bold),
            Cell::new("Penalty").add_attribute(Attribute::Bold),
            Cell::new(self.mode.adjusted_name()).add_attribute(Attribute::Bold),
        ]);

        for row in self.ranked() {
            let adjusted = row.adjusted.unwrap_or_default();
            let color = if adjusted >= 0.3 {
                Color::Green
            } else if adjusted >= 0.1 {
                Color::Yellow
            } else {
                Color::White
            };
            table.add_row(vec![
                Cell::new(row.rank.unwrap_or_default()).set_alignment(CellAlignment::Right),
                Cell::new(&row.variable),
                Cell::new(row.kind.map(|k| k.to_string()).unwrap_or_default()),
                Cell::new(row.bins.unwrap_or_default()).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", row.score.unwrap_or_default()))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", row.penalty.unwrap_or_default()))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", adjusted))
                    .fg(color)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        let failed: Vec<&SummaryRow> = self.failed().collect();
        if !failed.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Not scored").yellow(),
                style(format!("({})", failed.len())).dim()
            );
            for row in failed {
                println!(
                    "        {} {} {}",
                    style("•").dim(),
                    row.variable,
                    style(row.error.as_deref().unwrap_or_default()).dim()
                );
            }
        }
    }
}

/// Summary plus the bin-level table of every scored variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoTables {
    pub summary: Summary,
    pub tables: BTreeMap<String, VariableTable>,
}

impl InfoTables {
    pub fn mode(&self) -> AnalysisMode {
        self.summary.mode
    }

    pub fn table(&self, variable: &str) -> Option<&VariableTable> {
        self.tables.get(variable)
    }

    /// Print bin-level tables in summary order
    pub fn display_tables(&self) {
        for row in self.summary.ranked() {
            if let Some(table) = self.tables.get(&row.variable) {
                display_variable_table(table);
            }
        }
    }
}

fn failed_row(variable: String, err: &InfoError) -> SummaryRow {
    SummaryRow {
        variable,
        kind: None,
        score: None,
        adjusted: None,
        penalty: None,
        bins: None,
        rank: None,
        error: Some(err.to_string()),
        error_kind: Some(err.kind()),
    }
}

/// Rank per-variable results by adjusted score.
///
/// Ties keep input order. Failed variables follow the ranked ones, unranked,
/// in input order.
pub fn summarize(
    mode: AnalysisMode,
    results: Vec<(String, InfoResult<VariableTable>)>,
) -> InfoTables {
    let mut scored: Vec<SummaryRow> = Vec::new();
    let mut failed: Vec<SummaryRow> = Vec::new();
    let mut tables = BTreeMap::new();

    for (variable, result) in results {
        match result {
            Ok(table) => {
                scored.push(SummaryRow {
                    variable: variable.clone(),
                    kind: Some(table.kind()),
                    score: Some(table.score()),
                    adjusted: Some(table.adjusted_score()),
                    penalty: Some(table.penalty()),
                    bins: Some(table.n_bins()),
                    rank: None,
                    error: None,
                    error_kind: None,
                });
                tables.insert(variable, table);
            }
            Err(e) => failed.push(failed_row(variable, &e)),
        }
    }

    // sort_by is stable
    scored.sort_by(|a, b| {
        b.adjusted
            .unwrap_or_default()
            .total_cmp(&a.adjusted.unwrap_or_default())
    });
    for (i, row) in scored.iter_mut().enumerate() {
        row.rank = Some(i + 1);
    }

    scored.extend(failed);
    InfoTables {
        summary: Summary { mode, rows: scored },
        tables,
    }
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{:.4}", value)).set_alignment(CellAlignment::Right)
}

fn optional(value: Option<f64>) -> Cell {
    match value {
        Some(v) => number(v),
        None => Cell::new("-").set_alignment(CellAlignment::Right),
    }
}

/// Print one variable's bin table
pub fn display_variable_table(table: &VariableTable) {
    println!();
    println!(
        "    {} {} {}",
        style("▸").cyan(),
        style(table.variable()).white().bold(),
        style(format!("({}, {} bins)", table.kind(), table.n_bins())).dim()
    );

    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);

    match table {
        VariableTable::Woe(t) => {
            out.set_header(header(&[
                "Bin", "Count", "Pop %", "Events", "Non-events", "Event rate", "WoE", "IV",
                "Cum IV", "Penalty",
            ]));
            for row in &t.rows {
                out.add_row(vec![
                    Cell::new(&row.label),
                    Cell::new(row.count).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.1}", row.population_pct))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(row.events).set_alignment(CellAlignment::Right),
                    Cell::new(row.non_events).set_alignment(CellAlignment::Right),
                    number(row.event_rate),
                    number(row.woe),
                    number(row.iv),
                    number(row.cum_iv),
                    number(row.penalty),
                ]);
            }
            out.add_row(vec![
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new(t.total_events + t.total_non_events).set_alignment(CellAlignment::Right),
                Cell::new(""),
                Cell::new(t.total_events).set_alignment(CellAlignment::Right),
                Cell::new(t.total_non_events).set_alignment(CellAlignment::Right),
                Cell::new(""),
                Cell::new(""),
                number(t.iv).add_attribute(Attribute::Bold),
                Cell::new(""),
                number(t.penalty),
            ]);
        }
        VariableTable::Nwoe(t) => {
            out.set_header(header(&[
                "Bin", "Count", "Trt", "Trt rate", "Ctl", "Ctl rate", "NWoE", "NIV", "Cum NIV",
                "Penalty",
            ]));
            for row in &t.rows {
                out.add_row(vec![
                    Cell::new(&row.label),
                    Cell::new(row.count).set_alignment(CellAlignment::Right),
                    Cell::new(row.treatment.count).set_alignment(CellAlignment::Right),
                    number(row.treatment.event_rate),
                    Cell::new(row.control.count).set_alignment(CellAlignment::Right),
                    number(row.control.event_rate),
                    optional(row.nwoe),
                    number(row.niv),
                    number(row.cum_niv),
                    number(row.penalty),
                ]);
            }
            out.add_row(vec![
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new(""),
                Cell::new(t.treatment_totals.events + t.treatment_totals.non_events)
                    .set_alignment(CellAlignment::Right),
                Cell::new(""),
                Cell::new(t.control_totals.events + t.control_totals.non_events)
                    .set_alignment(CellAlignment::Right),
                Cell::new(""),
                Cell::new(""),
                number(t.niv).add_attribute(Attribute::Bold),
                Cell::new(""),
                number(t.penalty),
            ]);
        }
    }

    for line in out.to_string().lines() {
        println!("    {}", line);
    }
    if let Some(other) = table.other_validation() {
        println!(
            "    {}",
            style(format!(
                "{}: {} validation record(s) outside the training bins, penalty {:.4}",
                OTHER_LABEL, other.count, other.stability_penalty
            ))
            .dim()
        );
    }
}
