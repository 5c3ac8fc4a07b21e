//! Console display logic for the hostcheck CLI.
//!
//! Everything here writes human-facing text to stdout using the `console`
//! crate. Per-entry progress lines are not printed here; they arrive through
//! `tracing` on stderr while the run is in flight.

use console::{pad_str, style, Alignment, StyledObject};
use hostcheck_lib::{Aggregate, CategorySummary, CheckConfig, HostEntry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const RULE: &str = "────────────────────────────────────────────────────────────";

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(source: &Path, entry_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("hostcheck").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- {} unique entr{} from {}",
            entry_count,
            if entry_count == 1 { "y" } else { "ies" },
            source.display()
        ))
        .dim(),
    );

    println!(
        "{}",
        style(format!(
            "Probe: {} | Concurrency: {} | Timeout: {:.1}s",
            probe_label(config),
            config.effective_concurrency(entry_count),
            config.timeout.as_secs_f64()
        ))
        .dim()
    );
    println!();
}

fn probe_label(config: &CheckConfig) -> String {
    match config.probe {
        hostcheck_lib::ProbeKind::Tcp => format!("tcp:{}", config.port),
        kind => kind.to_string(),
    }
}

// ── Category listing ─────────────────────────────────────────────────────────

/// Print how many entries each category contributes.
pub fn print_category_counts(counts: &BTreeMap<&str, usize>) {
    if counts.is_empty() {
        println!("  {}", style("No entries found").yellow());
        return;
    }

    println!("{}", style(format!("── Categories ({}) ", counts.len())).cyan().bold());
    for (category, count) in counts {
        println!(
            "    {} {}",
            pad_str(category, 28, Alignment::Left, Some("…")),
            style(count).bold()
        );
    }
    println!();
}

/// Print every entry that would be probed, in sequence order.
pub fn print_dry_run(entries: &[HostEntry]) {
    println!("{}", style(format!("── Entries ({}) ", entries.len())).cyan().bold());
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "  {} {} {} {}",
            style(format!("{:>4}.", index + 1)).dim(),
            pad_str(&entry.category, 24, Alignment::Left, Some("…")),
            pad_str(&entry.identifier, 18, Alignment::Left, None),
            entry.alias
        );
    }
    println!();
    println!(
        "  {}",
        style("Dry run: nothing was probed").dim()
    );
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the per-category table followed by the overall totals.
pub fn print_summary(aggregate: &Aggregate, duration: Duration, cancelled: bool) {
    println!();
    if !aggregate.categories.is_empty() {
        print_category_table(&aggregate.categories);
    }

    println!("  {}", style(RULE).dim());
    println!("  {}", summary_line(aggregate, duration));

    if cancelled {
        println!(
            "  {}",
            style("Run interrupted: totals cover completed entries only").yellow()
        );
    }
}

/// Totals line: count, duration, online, offline and overall percentage.
fn summary_line(aggregate: &Aggregate, duration: Duration) -> String {
    format!(
        "{} entr{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(aggregate.total).bold(),
        if aggregate.total == 1 { "y" } else { "ies" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} online", aggregate.reachable)).green(),
        style("|").dim(),
        style(format!("{} offline", aggregate.unreachable)).red(),
        style("|").dim(),
        percent_style(aggregate.percent_reachable()),
    )
}

fn print_category_table(categories: &[CategorySummary]) {
    println!(
        "  {} {:>7} {:>7} {:>8} {:>8}",
        style(pad_str("CATEGORY", 28, Alignment::Left, None)).bold(),
        style("TOTAL").bold(),
        style("ONLINE").bold(),
        style("OFFLINE").bold(),
        style("ONLINE%").bold(),
    );

    for summary in categories {
        println!(
            "  {} {:>7} {:>7} {:>8} {:>8}",
            pad_str(&summary.category, 28, Alignment::Left, Some("…")),
            summary.total,
            summary.reachable,
            summary.unreachable,
            percent_style(summary.percent_reachable),
        );
    }
}

/// Color a percentage: green from 80, yellow from 50, red below.
fn percent_style(percent: f64) -> StyledObject<String> {
    let text = format!("{:.1}%", percent);
    match percent_band(percent) {
        Band::High => style(text).green(),
        Band::Medium => style(text).yellow(),
        Band::Low => style(text).red(),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Band {
    High,
    Medium,
    Low,
}

fn percent_band(percent: f64) -> Band {
    if percent >= 80.0 {
        Band::High
    } else if percent >= 50.0 {
        Band::Medium
    } else {
        Band::Low
    }
}

/// Print the paths of written report files.
pub fn print_report_files(paths: &[PathBuf]) {
    for path in paths {
        println!(
            "  {} {}",
            style("Report:").dim(),
            style(path.display()).underlined()
        );
    }
}
