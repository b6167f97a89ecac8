#[cfg(feature = "cli")]
pub mod cli;
pub mod project;

#[cfg(feature = "cli")]
pub use cli::{CliArgs, LogFormat};
pub use project::{ProjectConfig, DEFAULT_CONFIG_FILE};
