//! Terminal styling utilities

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static SPLIT: Emoji<'_, '_> = Emoji("🔀 ", "");

const BOX_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("infotables").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Weight of evidence and information value screening").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Run settings shown in the configuration card
pub struct ConfigCard<'a> {
    pub input: &'a Path,
    pub valid: Option<&'a Path>,
    pub outcome: &'a str,
    pub treatment: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub bins: usize,
}

fn card_line(icon: &Emoji<'_, '_>, label: &str, value: &str) {
    println!("    │  {}{:<11} {:<38}│", icon, label, truncate_string(value, 38));
}

/// Print configuration card
pub fn print_config(card: &ConfigCard) {
    let line = "─".repeat(BOX_WIDTH - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(BOX_WIDTH - 20)
    );
    println!("    ├{}┤", line);
    card_line(&FOLDER, "Input:", &card.input.display().to_string());
    if let Some(valid) = card.valid {
        card_line(&FOLDER, "Validation:", &valid.display().to_string());
    }
    card_line(&TARGET, "Outcome:", card.outcome);
    if let Some(treatment) = card.treatment {
        card_line(&SPLIT, "Treatment:", treatment);
    }
    if let Some(output) = card.output {
        card_line(&SAVE, "Output:", &output.display().to_string());
    }
    println!("    ├{}┤", line);
    card_line(&CHART, "Bins:", &card.bins.to_string());
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("completed in {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Information tables complete!").green().bold()
    );
    println!();
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len + 3 - max_len).collect();
        format!("...{}", tail)
    }
}
