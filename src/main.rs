//! infotables: information value screening CLI
//!
//! Bins every variable of a training dataset, computes WoE / IV (or NWoE /
//! NIV when a treatment column is given), optionally penalizes instability
//! against a validation dataset, and prints the ranked summary.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use infotables::cli::Cli;
use infotables::pipeline::{create_infotables, get_column_names, load_dataset, InfoInput};
use infotables::report::{export_infotables, ExportParams};
use infotables::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, ConfigCard,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.info_config();
    let export_path = cli.export_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        input: &cli.input,
        valid: cli.valid.as_deref(),
        outcome: &cli.target,
        treatment: cli.treatment.as_deref(),
        output: export_path.as_deref(),
        bins: config.bins,
    });

    // Step 1: Load datasets
    print_step_header(1, "Load Data");
    let step_start = Instant::now();

    // column roles are checked against the header before any rows are read
    let columns = get_column_names(&cli.input)?;
    for column in std::iter::once(&cli.target).chain(cli.treatment.as_ref()) {
        if !columns.contains(column) {
            anyhow::bail!("Column '{}' not found in {}", column, cli.input.display());
        }
    }

    let spinner = create_spinner("Reading training data...");
    let (train, stats) = load_dataset(&cli.input, cli.infer_schema_length)?;
    finish_with_success(&spinner, "Training data loaded");
    println!(
        "      Rows: {}  Columns: {}  Memory: {:.2} MB",
        stats.rows, stats.columns, stats.memory_mb
    );

    let valid = match &cli.valid {
        Some(path) => {
            let spinner = create_spinner("Reading validation data...");
            let (valid, stats) = load_dataset(path, cli.infer_schema_length)?;
            finish_with_success(&spinner, "Validation data loaded");
            println!("      Rows: {}  Columns: {}", stats.rows, stats.columns);
            Some(valid)
        }
        None => None,
    };
    print_step_time(step_start.elapsed());

    // Step 2: Binning and scoring
    let outcome_mapping = cli.outcome_mapping();
    let treatment_mapping = cli.treatment_mapping();
    let mut input = InfoInput::new(&train, &cli.target);
    if let Some(treatment) = &cli.treatment {
        input = input.with_treatment(treatment);
    }
    if let Some(valid) = &valid {
        input = input.with_valid(valid);
    }
    if let Some(mapping) = &outcome_mapping {
        input = input.with_outcome_mapping(mapping);
    }
    if let Some(mapping) = &treatment_mapping {
        input = input.with_treatment_mapping(mapping);
    }

    let mode = input.mode();
    print_step_header(2, &format!("{} Analysis", mode.score_name()));
    let step_start = Instant::now();
    let result = create_infotables(&input, &config).context("Analysis aborted")?;

    let failed = result.summary.failed().count();
    print_success(&format!(
        "Scored {} variable(s)",
        result.summary.rows.len() - failed
    ));
    if failed > 0 {
        print_count(
            "variable(s) that could not be scored",
            failed,
            Some("(see summary)"),
        );
    }
    print_step_time(step_start.elapsed());

    result.summary.display();
    if cli.show_tables {
        result.display_tables();
    }

    // Step 3: Export
    if let Some(path) = &export_path {
        print_step_header(3, "Save Results");
        let input_file = cli.input.display().to_string();
        let validation_file = cli.valid.as_ref().map(|p| p.display().to_string());
        export_infotables(
            &result,
            path,
            &ExportParams {
                input_file: &input_file,
                validation_file: validation_file.as_deref(),
                outcome_column: &cli.target,
                treatment_column: cli.treatment.as_deref(),
                config: &config,
            },
        )?;
        print_success(&format!("Saved to {}", style(path.display()).cyan()));
    } else {
        print_info("Use --output or --json to export the tables");
    }

    print_completion();

    Ok(())
}
