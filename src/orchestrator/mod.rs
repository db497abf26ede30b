mod builder;
mod controller;
mod report;

pub use builder::StackControllerBuilder;
pub use controller::StackController;
pub use report::{RunReport, Stage, Step};
