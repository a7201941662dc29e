//! JSON handling between the model and the store.
//!
//! - `extract.rs` - model text to JSON (fence stripping, fallbacks)
//! - `normalize.rs` - JSON to flat text rows and back
//! - `schema_inference.rs` - first-row schema and the schema policy
//! - `validator.rs` - table and column identifier rules
//! - `error.rs` - domain-specific errors

mod error;
pub mod extract;
pub mod normalize;
pub mod schema_inference;
pub mod validator;

pub use error::{JsonError, JsonResult};
pub use extract::{extract, extract_object};
pub use normalize::{PAYLOAD_COLUMN, denormalize, normalize, normalize_record, normalize_value};
pub use schema_inference::{SchemaPolicy, infer_schema, widen_columns};
pub use validator::{sanitize_column_name, validate_table_name};
