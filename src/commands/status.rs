use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::profile::ProfileResolver;
use crate::runtime::detect::detect_container_engine;
use crate::runtime::{list_container_rows, CommandRunner, ContainerRow, ManagedResource, ResourceKind};
use crate::ui::output::use_color;

#[derive(Debug, Serialize)]
pub struct StatusEntry {
    #[serde(flatten)]
    pub resource: ManagedResource,
    pub state: String,
    pub status: String,
    pub ports: String,
}

impl StatusEntry {
    fn from_row(row: ContainerRow) -> Self {
        Self {
            resource: ManagedResource::discovered(ResourceKind::Container, row.name),
            state: row.state,
            status: row.status,
            ports: row.ports,
        }
    }

    /// Exact profile when known, otherwise the naming convention.
    fn origin(&self) -> &'static str {
        if self.resource.is_orphan() {
            return "orphan";
        }
        self.resource
            .profile
            .or(self.resource.convention)
            .unwrap_or_default()
    }
}

/// Stack containers as the engine currently reports them.
pub async fn collect(runner: &dyn CommandRunner) -> Result<Vec<StatusEntry>> {
    let engine = detect_container_engine(runner).await?;
    let rows = list_container_rows(runner, engine, &ProfileResolver::all_containers())
        .await
        .context("listing containers")?;
    Ok(rows.into_iter().map(StatusEntry::from_row).collect())
}

pub async fn run(runner: &dyn CommandRunner, json: bool) -> Result<()> {
    let entries = collect(runner).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No stack containers found.");
        println!("Run `stackrig start` to bring the stack up.");
        return Ok(());
    }

    let use_color = use_color();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Container", "Profile", "State", "Status", "Ports"]);

    for entry in &entries {
        let state = if !use_color {
            entry.state.clone()
        } else if entry.state == "running" {
            entry.state.green().to_string()
        } else {
            entry.state.yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(&entry.resource.name),
            Cell::new(entry.origin()),
            Cell::new(state),
            Cell::new(&entry.status),
            Cell::new(if entry.ports.is_empty() { "-" } else { entry.ports.as_str() }),
        ]);
    }

    println!();
    for line in table.to_string().lines() {
        println!("  {}", line);
    }
    println!();
    Ok(())
}
