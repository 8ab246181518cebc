//! Schema-driven forms for the terminal.
//!
//! A [`SchemaNode`](core::schema::SchemaNode) describes the shape of the data
//! and its validation rules. [`FormSession`](form::FormSession) owns the value
//! tree being edited and re-validates it on every change, and the `app`
//! module drives a session interactively on a crossterm terminal.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod form;
pub mod load;
pub mod terminal;
pub mod ui;

pub use crate::core::schema::{SchemaNode, generate_default, infer_schema};
pub use crate::core::validation::{ErrorMap, validate};
pub use crate::core::value::Value;
pub use crate::core::value_path::ValuePath;
pub use error::AppError;
pub use form::{FormError, FormSession, SubmitOutcome};
