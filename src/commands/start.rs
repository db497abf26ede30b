use super::Workspace;
use crate::cli::StartArgs;
use crate::output::UserOutput;
use stackup::{CapabilityOutcome, RunReport, StackConfiguration, StackController, Step};
use std::time::Duration;

pub async fn run_start(
    args: &StartArgs,
    workspace: Workspace,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let mut config = StackConfiguration::from_settings(&workspace.settings)?;
    config.profile = args.target.profile;
    config.environment = args.target.environment;
    config.skip_sync = args.skip_clone;
    config.skip_capability = args.no_cap_adjust;
    config.fallback_wait = Duration::from_secs(args.wait_seconds);
    if let Some(port) = args.pg_port {
        config.probe_port = port;
    }
    if let Some(secs) = args.timeout {
        config.readiness_timeout = Duration::from_secs(secs);
    }

    let controller = StackController::builder()
        .work_dir(workspace.work_dir)
        .settings(workspace.settings)
        .configuration(config)
        .build()?;

    if args.dry_run {
        out.status("Dry run: the following compose commands would be executed:");
        for (operation, argv) in controller.plan() {
            out.status(&format!("  [{}] docker {}", operation, argv.join(" ")));
        }
        return Ok(());
    }

    out.status(&format!(
        "Starting stack (profile: {}, environment: {})",
        args.target.profile, args.target.environment
    ));
    let report = controller.run().await?;
    summarize(&report, out);
    Ok(())
}

fn summarize(report: &RunReport, out: &dyn UserOutput) {
    out.blank();
    if let Step::Ran((first_run, outcome)) = &report.capability {
        match outcome {
            CapabilityOutcome::Disabled => {
                out.warning("cap_drop was disabled for the search service's first run.");
                out.warning("Run `stackup start` again once it has initialized to restore it.");
            }
            CapabilityOutcome::Enabled => out.status("cap_drop restored for the search service."),
            _ if *first_run => out.status("Search service has not finished its first run yet."),
            _ => {}
        }
    }
    if !report.ready {
        out.warning("The database never accepted connections; local services were started anyway.");
    }
    if !report.teardown_clean {
        out.warning("Teardown of the previous deployment reported errors (ignored).");
    }
    out.success("Stack is up.");
}
