pub mod coverage;
pub mod engine;
pub mod extractor;
pub mod locator;
pub mod pipeline;
pub mod synthesizer;

pub use crate::domain::model::{
    Declaration, DeclarationKind, Extraction, GeneratedTestModule, ToolCommand, ToolOutput,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Runner};
pub use crate::utils::error::Result;
