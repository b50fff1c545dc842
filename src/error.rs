//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum DocvarsError {
    #[error("value of variable '{name}' requested before its expression was evaluated")]
    UnresolvedExpression { name: String },

    #[error("expression references unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("cyclic reference while resolving '{name}': {chain}")]
    CyclicReference { name: String, chain: String },

    #[error("expression syntax error in '{expr}': {details}")]
    ExpressionSyntax { expr: String, details: String },

    #[error("duplicate variable '{name}' in data source '{source_name}'")]
    DuplicateVariable { name: String, source_name: String },

    #[error("cannot read template '{path}': {source}")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template format error in '{path}': {details}")]
    TemplateFormat { path: String, details: String },

    #[error("cannot load config '{path}': {details}")]
    ConfigLoad { path: String, details: String },
}

impl FixSuggestion for DocvarsError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            DocvarsError::UnresolvedExpression { .. } => {
                Some("Call fill_value() on the holder before reading its value")
            }
            DocvarsError::UnknownVariable { .. } => {
                Some("Declare the referenced variable in the same data source")
            }
            DocvarsError::CyclicReference { .. } => {
                Some("Break the reference cycle - a variable cannot depend on itself")
            }
            DocvarsError::ExpressionSyntax { .. } => {
                Some("Expressions support ${name} placeholders, + - * / and parentheses")
            }
            DocvarsError::DuplicateVariable { .. } => {
                Some("Variable names must be unique within a data source")
            }
            DocvarsError::TemplateRead { .. } => Some("Check the template path and permissions"),
            DocvarsError::TemplateFormat { .. } => {
                Some("Definitions use ${name=value}; every '${' needs a closing '}'")
            }
            DocvarsError::ConfigLoad { .. } => {
                Some("Check YAML syntax; each var needs exactly one of 'value' or 'expr'")
            }
        }
    }
}
