use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::health::HealthCheckResult;
use crate::orchestrator::report::{StartReport, TeardownSummary};
use crate::orchestrator::state::LifecycleState;
use crate::ui::output::use_color;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("  {}", line);
    }
}

fn health_cell(result: &HealthCheckResult, use_color: bool) -> String {
    let (label, ok) = if result.succeeded {
        ("healthy", true)
    } else {
        ("unreachable", false)
    };
    if !use_color {
        return format!("\u{25cf} {label}");
    }
    if ok {
        format!("{} {}", "\u{25cf}".green(), label.green())
    } else {
        format!("{} {}", "\u{25cf}".yellow(), label.yellow())
    }
}

pub fn print_startup_summary(report: &StartReport) {
    let use_color = use_color();

    println!();
    if use_color {
        println!(
            "  {} {} ({})",
            "stackrig".bold(),
            report.mode.label().cyan(),
            report.state.dimmed()
        );
    } else {
        println!("  stackrig {} ({})", report.mode.label(), report.state);
    }
    println!();

    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Service").set_alignment(CellAlignment::Left),
        Cell::new("URL").set_alignment(CellAlignment::Left),
        Cell::new("Attempts").set_alignment(CellAlignment::Right),
        Cell::new("Status").set_alignment(CellAlignment::Center),
    ]);
    for result in [&report.backend, &report.frontend] {
        table.add_row(vec![
            Cell::new(&result.target.name),
            Cell::new(&result.target.url),
            Cell::new(result.attempts).set_alignment(CellAlignment::Right),
            Cell::new(health_cell(result, use_color)),
        ]);
    }
    print_indented(&table);

    if report.state == LifecycleState::Degraded {
        println!();
        let banner = "The stack started but is not healthy yet.";
        if use_color {
            println!("  {} {}", "WARNING".yellow().bold(), banner.yellow());
        } else {
            println!("  WARNING {banner}");
        }
        if let Some(err) = &report.backend.last_error {
            println!("  Last backend error: {err}");
        }
        println!("  Check container logs, or run `stackrig status`.");
    }
    println!();
}

pub fn print_teardown_summary(summary: &TeardownSummary) {
    let use_color = use_color();

    println!();
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Step").set_alignment(CellAlignment::Left),
        Cell::new("Removed").set_alignment(CellAlignment::Right),
        Cell::new("Remaining").set_alignment(CellAlignment::Right),
    ]);
    for step in &summary.steps {
        let remaining = match &step.error {
            Some(_) => "error".to_string(),
            None => step.remaining.len().to_string(),
        };
        table.add_row(vec![
            Cell::new(&step.step),
            Cell::new(step.removed.len()).set_alignment(CellAlignment::Right),
            Cell::new(remaining).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("total resources"),
        Cell::new(summary.total_removed()).set_alignment(CellAlignment::Right),
        Cell::new(summary.total_remaining()).set_alignment(CellAlignment::Right),
    ]);
    print_indented(&table);

    let leftovers: Vec<_> = summary
        .steps
        .iter()
        .flat_map(|s| s.remaining.iter().map(move |(n, r)| (s.step.as_str(), n, r)))
        .collect();
    if !leftovers.is_empty() {
        println!();
        println!("  Remaining resources:");
        for (step, name, reason) in leftovers {
            if use_color {
                println!("    {} {} ({})", format!("[{step}]").dimmed(), name.yellow(), reason);
            } else {
                println!("    [{step}] {name} ({reason})");
            }
        }
    }
    for step in summary.steps.iter().filter(|s| s.error.is_some()) {
        if let Some(err) = &step.error {
            println!("  {} could not run: {}", step.step, err);
        }
    }

    println!();
    let done = match summary.state {
        LifecycleState::Destroyed => "Cleanup complete.",
        _ => "Stack stopped.",
    };
    if use_color {
        println!("  {}", done.bold());
    } else {
        println!("  {done}");
    }
    println!();
}
