//! Shared fakes for integration tests: a scripted command runner and a fixed branch probe.
#![allow(dead_code)]

use async_trait::async_trait;
use stackup::exec::{CommandOutcome, CommandRunner, Invocation};
use stackup::{BranchProbe, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Canned result for invocations whose command line starts with a prefix.
#[derive(Debug, Clone)]
pub struct Reply {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub spawn_error: Option<String>,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            spawn_error: None,
        }
    }

    pub fn fail(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            spawn_error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            spawn_error: Some("No such file or directory (os error 2)".to_string()),
        }
    }
}

/// Records every invocation and answers from a prefix table; unmatched commands succeed.
///
/// `git clone` additionally initializes `<dir>` as a repository holding
/// `docker/docker-compose.yml`, so
/// later steps see the sparse checkout they expect.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    replies: Vec<(String, Reply)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, prefix: &str, reply: Reply) -> Self {
        self.replies.push((prefix.to_string(), reply));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::display)
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Compose invocations only, without the leading `docker compose -p <project>`.
    pub fn compose_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with("docker compose -p"))
            .collect()
    }

    fn materialize_clone(invocation: &Invocation) {
        let (Some(cwd), Some(dir)) = (invocation.cwd.as_ref(), invocation.args.last()) else {
            return;
        };
        let checkout = cwd.join(dir);
        git2::Repository::init(&checkout).unwrap();
        let docker_dir = checkout.join("docker");
        std::fs::create_dir_all(&docker_dir).unwrap();
        std::fs::write(
            docker_dir.join("docker-compose.yml"),
            "services:\n  db:\n    image: supabase/postgres\n",
        )
        .unwrap();
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> CommandOutcome {
        self.calls.lock().unwrap().push(invocation.clone());
        let command = invocation.display();

        let reply = self
            .replies
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::ok(""));

        if reply.exit_code == Some(0) && command.starts_with("git clone") {
            Self::materialize_clone(invocation);
        }

        CommandOutcome {
            command,
            policy: invocation.policy,
            exit_code: reply.exit_code,
            stdout: reply.stdout,
            stderr: String::new(),
            spawn_error: reply.spawn_error,
        }
    }
}

pub struct FixedBranches(pub Vec<&'static str>);

#[async_trait]
impl BranchProbe for FixedBranches {
    async fn remote_branches(&self, _url: &str) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

pub const ROOT_ENV: &str = "\
# Supabase secrets
POSTGRES_PASSWORD=your-super-secret-and-long-postgres-password
JWT_SECRET=your-super-secret-jwt-token-with-at-least-32-characters-long
N8N_ENCRYPTION_KEY=super-secret-key
";

pub const SEARXNG_TEMPLATE: &str = "\
use_default_settings: true
server:
  secret_key: \"ultrasecretkey\"  # change this!
  limiter: false
";

pub const LOCAL_COMPOSE: &str = "\
services:
  searxng:
    container_name: searxng
    image: docker.io/searxng/searxng:latest
    restart: unless-stopped
    cap_drop:
      - ALL
    cap_add:
      - CHOWN
      - SETGID
      - SETUID
  redis:
    container_name: redis
    image: docker.io/valkey/valkey:8-alpine
    cap_drop:
      - ALL
";

/// A work dir holding the files a fresh clone of the stack repo ships with.
pub fn stack_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".env", ROOT_ENV);
    write(dir.path(), "searxng/settings-base.yml", SEARXNG_TEMPLATE);
    write(dir.path(), "docker-compose.yml", LOCAL_COMPOSE);
    write(
        dir.path(),
        "docker-compose.override.private.yml",
        "services:\n  searxng:\n    ports:\n      - 127.0.0.1:8080:8080\n",
    );
    dir
}

pub fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}
