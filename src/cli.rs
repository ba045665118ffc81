use clap::{Args, Parser, Subcommand};
use clap_complete::aot::Shell;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "stackrig",
    version,
    about = "Start, stop and wipe the local airweave container stack"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Project checkout to operate on (default: search upwards for docker/docker-compose.yml)
    #[arg(long, global = true, env = "STACKRIG_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Environment file, relative to the project root
    #[arg(long, global = true, env = "STACKRIG_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configure the environment and bring the stack up
    Start(StartArgs),
    /// Bring every profile down and remove leftover containers and networks
    Stop,
    /// Permanently delete all stack containers, volumes, images and local data
    Cleanup {
        /// Time to cancel with Ctrl+C after confirming
        #[arg(long, default_value = "5s", value_parser = parse_duration)]
        countdown: Duration,
    },
    /// List stack containers and the profile each belongs to
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check that a container engine and compose tool are available
    Doctor,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Use the alternate port set so the stack can run beside another copy
    #[arg(long)]
    pub alt_ports: bool,

    /// Bring up the development compose files instead of the production ones
    #[arg(long)]
    pub dev: bool,

    /// Do not ask for optional API keys
    #[arg(long)]
    pub skip_prompts: bool,

    /// Health check attempts before giving up
    #[arg(long, default_value_t = 30)]
    pub health_attempts: u32,

    /// Delay between failed health checks
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub health_interval: Duration,

    /// Settle time before the first health check
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub grace: Duration,
}

fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn start_defaults() {
        let cli = Cli::try_parse_from(["stackrig", "start"]).unwrap();
        let Commands::Start(args) = cli.command else {
            panic!("expected start");
        };
        assert!(!args.alt_ports);
        assert_eq!(args.health_attempts, 30);
        assert_eq!(args.health_interval, Duration::from_secs(5));
        assert_eq!(args.grace, Duration::from_secs(10));
        assert_eq!(cli.global.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn start_flags_parse_durations() {
        let cli = Cli::try_parse_from([
            "stackrig",
            "start",
            "--alt-ports",
            "--dev",
            "--health-interval",
            "500ms",
            "--grace",
            "0s",
        ])
        .unwrap();
        let Commands::Start(args) = cli.command else {
            panic!("expected start");
        };
        assert!(args.alt_ports && args.dev);
        assert_eq!(args.health_interval, Duration::from_millis(500));
        assert!(args.grace.is_zero());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["stackrig", "cleanup", "--project-dir", "/srv/app", "-v"]).unwrap();
        assert_eq!(cli.global.project_dir, Some(PathBuf::from("/srv/app")));
        assert!(cli.global.verbose);
        assert!(matches!(cli.command, Commands::Cleanup { countdown } if countdown == Duration::from_secs(5)));
    }

    #[test]
    fn bad_duration_is_rejected() {
        assert!(Cli::try_parse_from(["stackrig", "cleanup", "--countdown", "soon"]).is_err());
    }
}
