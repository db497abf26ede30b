mod cli;
mod commands;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use output::{CliOutput, QuietOutput, UserOutput};
use stackup::Error as StackError;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(stack_error) = e.downcast_ref::<StackError>() {
            eprintln!("Error: {}", stack_error.with_suggestion());
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let out: &dyn UserOutput = if cli.quiet { &QuietOutput } else { &CliOutput };

    // Commands that need no settings
    match cli.command_or_default() {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Doctor => return commands::run_doctor(out).await,
        _ => {}
    }

    let workspace = commands::load_workspace(cli.config.clone(), cli.workdir.clone())?;
    match cli.command_or_default() {
        Commands::Start(args) => commands::run_start(&args, workspace, out).await,
        Commands::Stop(target) => commands::run_stop(&target, workspace, out).await,
        Commands::Doctor | Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
