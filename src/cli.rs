use clap::{Args, Parser, Subcommand};
use stackup::{Environment, Profile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackup")]
#[command(about = "Bring up the local AI stack together with its Supabase dependency")]
pub struct Cli {
    /// Settings file path (defaults to stackup.yaml, searched upward)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stack's compose files
    #[arg(short, long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Suppress summary output (logs still follow RUST_LOG)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `start`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Start(StartArgs::default()))
    }
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Sync the dependency, prepare config files and (re)start both compose projects
    Start(StartArgs),
    /// Tear down every container either compose project may have started
    Stop(TargetArgs),
    /// Check that git, docker and the compose plugin are available
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// Hardware profile for the local services
    #[arg(long, value_enum, default_value_t = Profile::Cpu)]
    pub profile: Profile,

    /// Which override files to use
    #[arg(long, value_enum, default_value_t = Environment::Private)]
    pub environment: Environment,
}

#[derive(Args, Clone, Debug, Default)]
pub struct StartArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Do not clone or update the dependency checkout
    #[arg(long)]
    pub skip_clone: bool,

    /// Leave the cap_drop declaration in docker-compose.yml untouched
    #[arg(long)]
    pub no_cap_adjust: bool,

    /// Extra seconds to wait when the database never becomes reachable
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub wait_seconds: u64,

    /// Database port probed for readiness (overrides stackup.yaml)
    #[arg(long, value_name = "N")]
    pub pg_port: Option<u16>,

    /// Readiness budget in seconds (overrides stackup.yaml)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the compose commands without running anything
    #[arg(long)]
    pub dry_run: bool,
}
