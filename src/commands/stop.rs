use super::Workspace;
use crate::cli::TargetArgs;
use crate::output::UserOutput;
use stackup::{StackConfiguration, StackController};

pub async fn run_stop(
    args: &TargetArgs,
    workspace: Workspace,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let mut config = StackConfiguration::from_settings(&workspace.settings)?;
    config.profile = args.profile;
    config.environment = args.environment;

    let controller = StackController::builder()
        .work_dir(workspace.work_dir)
        .settings(workspace.settings)
        .configuration(config)
        .build()?;

    out.status(&format!(
        "Stopping project '{}'...",
        controller.settings().project_name
    ));
    let outcome = controller.teardown().await?;
    if outcome.success() {
        out.success("All containers stopped.");
    } else {
        out.warning("docker compose down reported errors; some containers may still be running.");
    }
    Ok(())
}
