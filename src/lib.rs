//! docvars - template variable extraction and expression resolution
//!
//! Extracts named variables embedded in document templates and
//! resolves their final values. Literal variables carry their value
//! directly; expression variables reference other variables through
//! `${name}` placeholders and are evaluated lazily, on demand, with
//! memoization and cycle detection.

pub mod config;
pub mod error;
pub mod expr;
pub mod holder;
pub mod processor;
pub mod source;

pub use config::{DataSourceConfig, CONST_SOURCE_NAME};
pub use error::{DocvarsError, FixSuggestion};
pub use holder::DataHolder;
pub use processor::TemplateProcessor;
pub use source::DataSource;
