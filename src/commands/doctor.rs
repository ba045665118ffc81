use std::path::Path;

use anyhow::Result;

use crate::config::resolve::resolve_project_root;
use crate::config::StackLayout;
use crate::profile::PROFILES;
use crate::runtime::detect::{probe_compose_tools, probe_engines};
use crate::runtime::CommandRunner;

fn line(ok: bool, name: &str, detail: &str) {
    let tag = if ok { "[ok]" } else { "[!!]" };
    println!("  {} {:<28} {}", tag, name, detail);
}

/// Report what is available. Never fails.
pub async fn run(
    runner: &dyn CommandRunner,
    project_dir: Option<&Path>,
    env_file: &Path,
) -> Result<()> {
    println!("stackrig doctor");
    println!("===============");
    println!();

    println!("Container engines:");
    let engines = probe_engines(runner).await;
    for (engine, ok) in &engines {
        line(*ok, engine.binary(), if *ok { "daemon reachable" } else { "not available" });
    }

    let engine = engines.iter().find(|(_, ok)| *ok).map(|(e, _)| *e);
    println!();
    println!("Compose tools:");
    match engine {
        Some(engine) => {
            for (tool, ok) in probe_compose_tools(runner, engine).await {
                line(ok, &tool.label(engine), if ok { "available" } else { "not available" });
            }
        }
        None => println!("  skipped: no container engine"),
    }

    println!();
    println!("Project:");
    match resolve_project_root(project_dir) {
        Ok(root) => {
            line(true, "root", &root.display().to_string());
            let layout = StackLayout::new(&root, env_file);
            for profile in PROFILES.iter() {
                let present = layout.compose_path(profile.compose_file).is_file();
                line(
                    present,
                    profile.name,
                    &format!(
                        "{}{}",
                        profile.compose_file,
                        if present { "" } else { " (missing)" }
                    ),
                );
            }
            let env_present = layout.env_file.is_file();
            line(
                env_present,
                "environment file",
                &if env_present {
                    layout.env_file.display().to_string()
                } else {
                    format!("{} (created on first start)", layout.env_file.display())
                },
            );
        }
        Err(e) => line(false, "root", &format!("{e:#}")),
    }

    println!();
    if engine.is_some() {
        println!("Container engine found.");
    } else {
        println!("No container engine is reachable. Start Docker or Podman first.");
    }
    Ok(())
}
