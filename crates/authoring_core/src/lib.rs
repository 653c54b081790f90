//! Presenter-independent logic for the course authoring tool: the dispatch
//! service seam, course object normalization, add-dialog validation, concept
//! reconciliation, question tables and the file generation pipeline.

pub mod client;
pub mod concepts;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod naming;
pub mod pipeline;
pub mod quadrants;
pub mod questions;
pub mod refresh;
pub mod validation;

pub use client::{ServiceCallError, ServiceClient};
pub use config::{load_settings, AuthoringSettings};
pub use dispatch::{DispatchService, HttpDispatchService, MissingDispatchService};
pub use events::EventBus;
pub use pipeline::{GenerationPipeline, PipelineError};
pub use refresh::{RefreshDebouncer, RefreshSequencer, RefreshStamp};
