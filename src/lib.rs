// ============================================================================
// canvasflow
// ============================================================================

pub mod agents;
pub mod config;
pub mod core;
pub mod json;
pub mod llm;
pub mod pipeline;
pub mod storage;
pub mod warehouse;
pub mod web;

// Re-export main types for convenience
pub use crate::core::{Result, Row, StoreError};
pub use json::{JsonError, SchemaPolicy};
pub use llm::{GeminiClient, LlmError, TextModel};
pub use pipeline::{Pipeline, PipelineError, ProjectId};
pub use storage::{MemoryStore, TableStore};
pub use warehouse::{TableSpec, UpsertReport, Warehouse};
pub use web::{AppState, build_router};
