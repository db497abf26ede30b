//! # stackup
//!
//! Brings up a local AI service stack that depends on a separately maintained
//! Supabase deployment.
//!
//! A run syncs a sparse checkout of the dependency, merges env files, provisions
//! a settings secret, toggles a capability restriction around the search
//! service's first run, tears down any previous deployment, and then starts
//! the dependency and the local services as one compose project, gated on a
//! TCP readiness probe.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stackup::{Parser, StackController};
//!
//! # async fn example() -> Result<(), stackup::Error> {
//! let (settings, _path) = Parser::new().load_or_default(None)?;
//! let controller = StackController::builder()
//!     .work_dir(".")
//!     .settings(settings)
//!     .build()?;
//!
//! for (operation, args) in controller.plan() {
//!     println!("{operation}: docker {}", args.join(" "));
//! }
//! let report = controller.run().await?;
//! assert!(report.reached(stackup::Stage::Done));
//! # Ok(())
//! # }
//! ```
//!
//! ## Side effects
//!
//! Every external command goes through [`exec::CommandRunner`], and every
//! shared-file mutation goes through [`fsutil::rewrite`], so a fake runner and
//! a temp directory are enough to exercise a whole run.

pub mod capability;
pub mod compose;
pub mod config;
pub mod docker;
pub mod envfile;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod orchestrator;
pub mod readiness;
pub mod secret;
pub mod sync;

// Re-export commonly used types
pub use capability::{CapabilityOutcome, CapabilityState};
pub use compose::{ComposeOperation, CompositionFileSet};
pub use config::{Environment, Parser, Profile, StackConfiguration, StackSettings};
pub use docker::DockerClient;
pub use envfile::EnvMergeOutcome;
pub use error::{Error, Result};
pub use orchestrator::{RunReport, Stage, StackController, StackControllerBuilder, Step};
pub use readiness::{ReadinessProber, ServiceEndpoint};
pub use secret::SecretOutcome;
pub use sync::{BranchProbe, DependencySynchronizer, SyncOutcome};
