//! Capture pipeline: configuration, source boundary, reconfiguration
//!
//! The pipeline side of the server is deliberately small: a source
//! implements [`VideoSource`] and publishes encoded frames into the shared
//! slot; the [`PipelineController`] owns its lifecycle and serializes
//! configuration changes against production.

pub mod config;
pub mod controller;
pub mod source;
pub mod synthetic;

pub use config::{ConfigUpdate, PipelineConfig};
pub use controller::PipelineController;
pub use source::VideoSource;
pub use synthetic::SyntheticSource;
