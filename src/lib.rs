pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ProjectConfig;

pub use adapters::{process::TokioRunner, workspace::Workspace};
pub use core::{engine::ScaffoldEngine, pipeline::ScaffoldPipeline};
pub use utils::error::{Result, ScaffoldError};
