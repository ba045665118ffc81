use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::aot::generate;
use is_terminal::IsTerminal;
use tokio_util::sync::CancellationToken;

use stackrig::cli::{Cli, Commands, GlobalOpts, StartArgs};
use stackrig::commands;
use stackrig::config::resolve::resolve_project_root;
use stackrig::config::StackLayout;
use stackrig::confirm::{ConfirmationGate, StdinPrompter};
use stackrig::health::{HealthPoller, HealthPolicy, HttpProbe};
use stackrig::orchestrator::{CleanupOutcome, Controller, StartOptions};
use stackrig::profile::{Mode, Variant};
use stackrig::runtime::{CommandRunner, RuntimeProbe, SystemRunner};
use stackrig::ui::summary::{print_startup_summary, print_teardown_summary};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Start(args) => run_start(&cli.global, args).await,
        Commands::Stop => run_stop(&cli.global).await,
        Commands::Cleanup { countdown } => match run_cleanup(&cli.global, countdown).await {
            // Exit without waiting on a stdin read the runtime may still hold.
            Ok(false) => std::process::exit(1),
            other => other.map(|_| ()),
        },
        Commands::Status { json } => commands::status::run(&SystemRunner, json).await,
        Commands::Doctor => {
            commands::doctor::run(
                &SystemRunner,
                cli.global.project_dir.as_deref(),
                &cli.global.env_file,
            )
            .await
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "stackrig", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Resolve the checkout and detect the runtime. Nothing is written before
/// this succeeds.
async fn connect(
    global: &GlobalOpts,
    prompter: Arc<StdinPrompter>,
) -> anyhow::Result<Controller> {
    let root = resolve_project_root(global.project_dir.as_deref())?;
    let layout = StackLayout::new(root, &global.env_file);
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let probe = RuntimeProbe::connect(runner, layout).await?;
    let health = HealthPoller::new(Arc::new(HttpProbe::new()?));
    Ok(Controller::new(probe, health, prompter))
}

async fn run_start(global: &GlobalOpts, args: StartArgs) -> anyhow::Result<()> {
    let mut controller = connect(global, Arc::new(StdinPrompter::new())).await?;
    let opts = StartOptions {
        mode: if args.alt_ports {
            Mode::Alternate
        } else {
            Mode::Default
        },
        variant: if args.dev { Variant::Dev } else { Variant::Prod },
        health: HealthPolicy {
            max_attempts: args.health_attempts,
            interval: args.health_interval,
            grace: args.grace,
        },
        prompt_api_keys: !args.skip_prompts && std::io::stdin().is_terminal(),
    };
    let report = controller.start(&opts).await?;
    print_startup_summary(&report);
    Ok(())
}

async fn run_stop(global: &GlobalOpts) -> anyhow::Result<()> {
    let mut controller = connect(global, Arc::new(StdinPrompter::new())).await?;
    let summary = controller.stop().await?;
    print_teardown_summary(&summary);
    Ok(())
}

/// `Ok(false)` when the operator backed out.
async fn run_cleanup(global: &GlobalOpts, countdown: std::time::Duration) -> anyhow::Result<bool> {
    let prompter = Arc::new(StdinPrompter::new());
    let mut controller = connect(global, prompter.clone()).await?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let gate = ConfirmationGate::new(prompter, countdown, cancel);
    match controller.cleanup(&gate).await? {
        CleanupOutcome::Aborted(_) => Ok(false),
        CleanupOutcome::Destroyed(summary) => {
            print_teardown_summary(&summary);
            Ok(true)
        }
    }
}
