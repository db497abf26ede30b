use crate::output::UserOutput;
use stackup::exec::{CommandRunner, Invocation, SystemRunner};
use stackup::DockerClient;
use std::sync::Arc;

pub async fn run_doctor(out: &dyn UserOutput) -> anyhow::Result<()> {
    out.status("Checking system requirements...\n");

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let docker = DockerClient::new(runner.clone());
    let mut all_ok = true;

    out.progress("Git: ");
    let git = runner
        .run(&Invocation::new("git", ["--version"]).captured().tolerant())
        .await;
    if git.success() {
        out.finish_progress(git.stdout.trim());
    } else {
        out.finish_progress("Not found");
        all_ok = false;
    }

    out.progress("Docker: ");
    let version = docker.version().await;
    if version.success() {
        out.finish_progress(version.stdout.trim());

        out.progress("Docker daemon: ");
        let info = runner
            .run(&Invocation::new("docker", ["info"]).captured().tolerant())
            .await;
        if info.success() {
            out.finish_progress("Running");
        } else {
            out.finish_progress(
                "Not running (start Docker Desktop or run: sudo systemctl start docker)",
            );
            all_ok = false;
        }
    } else {
        out.finish_progress("Not found");
        all_ok = false;
    }

    out.progress("Docker Compose: ");
    match docker.compose_version().await {
        Ok(line) => out.finish_progress(&line),
        Err(_) => {
            out.finish_progress("Not found (the `docker compose` plugin is required)");
            all_ok = false;
        }
    }

    out.blank();
    if all_ok {
        out.success("All required tools are installed");
    } else {
        out.status("Some required tools are missing");
        out.error("\nInstallation guides:");
        out.error("  Git: https://git-scm.com/downloads");
        out.error("  Docker: https://docs.docker.com/get-docker/");
    }

    Ok(())
}
