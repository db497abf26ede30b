use std::io::Write;

/// User-facing output for the command layer.
///
/// Library code logs through `tracing`; commands report results through this
/// trait so `--quiet` can drop them without touching the log filter.
pub trait UserOutput: Send + Sync {
    /// Informational status message (e.g., "Stopping project 'localai'...")
    fn status(&self, message: &str);

    /// Success message, shown in green (e.g., "Stack 'localai' is up")
    fn success(&self, message: &str);

    /// Something the user should act on, but not a failure
    /// (e.g., "Database not reachable after 120s; continuing")
    fn warning(&self, message: &str);

    /// Error message, shown in red (e.g., "docker compose plugin not found")
    fn error(&self, message: &str);

    /// Inline progress (no trailing newline). Call `finish_progress` after.
    fn progress(&self, message: &str);

    /// Finish an inline progress line, e.g. "ok" after "Checking git... ".
    fn finish_progress(&self, result: &str);

    /// A blank line between summary sections.
    fn blank(&self);
}

/// Standard CLI output: stdout for results, stderr for warnings and errors.
pub struct CliOutput;

impl UserOutput for CliOutput {
    fn status(&self, message: &str) {
        println!("{}", message);
    }

    fn success(&self, message: &str) {
        println!("\x1b[32m{}\x1b[0m", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("\x1b[33m{}\x1b[0m", message);
    }

    fn error(&self, message: &str) {
        eprintln!("\x1b[31m{}\x1b[0m", message);
    }

    fn progress(&self, message: &str) {
        print!("{}", message);
        std::io::stdout().flush().ok();
    }

    fn finish_progress(&self, result: &str) {
        println!("{}", result);
    }

    fn blank(&self) {
        println!();
    }
}

/// Suppresses all output (`--quiet`). Errors still reach stderr through `main`.
pub struct QuietOutput;

impl UserOutput for QuietOutput {
    fn status(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn progress(&self, _message: &str) {}
    fn finish_progress(&self, _result: &str) {}
    fn blank(&self) {}
}
