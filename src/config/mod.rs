//! Configuration parsing and types.
//!
//! - `types` - Settings file structure (`StackSettings`) and the per-run `StackConfiguration`
//! - `environment` - Closed enumerations for environment mode and compose profile
//! - `duration` - Duration strings used by the readiness settings
//! - `parser` - stackup.yaml discovery and parsing
//! - `validation` - Settings validation

mod duration;
mod environment;
mod parser;
mod types;
mod validation;

pub use duration::*;
pub use environment::*;
pub use parser::*;
pub use types::*;
