// Catalog pipeline: processing stages and the batch orchestrator

pub mod pipeline;
pub mod processing;

pub use pipeline::{Pipeline, PipelineResult, RunReport};
