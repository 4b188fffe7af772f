//! Reconciles orbital-element records for resident space objects from several
//! tracking sources into one de-duplicated catalog.

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod storage;
pub mod types;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use pipeline::{Pipeline, PipelineResult, RunReport};
