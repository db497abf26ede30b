//! Docker utilities: compose invocations and container inspection.

pub mod client;

pub use client::DockerClient;
