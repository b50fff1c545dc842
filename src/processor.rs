//! Template extraction front end
//!
//! Scans a template document for variable definitions and populates
//! the constant data source of a freshly built `DataSourceConfig`.
//!
//! Definition syntax inside the document text: `${name=value}`. A
//! value containing a `${` placeholder makes the variable an
//! expression, anything else a literal. Values are brace-balanced, so
//! `${testexpr=${num}+${readme}}` nests. Bare `${name}` occurrences
//! are rendering placeholders and are ignored by extraction.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{DataSourceConfig, CONST_SOURCE_NAME};
use crate::error::DocvarsError;
use crate::expr;
use crate::holder::DataHolder;
use crate::source::DataSource;

pub struct TemplateProcessor {
    config_path: PathBuf,
}

#[derive(Debug)]
struct ScannedVar {
    name: String,
    raw: String,
    is_expr: bool,
}

impl TemplateProcessor {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Extract every variable defined in the template at `path` into
    /// the constant source of a new registry. Builds the registry via
    /// `DataSourceConfig::new_instance` exactly once per call.
    pub fn static_var_extract(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<DataSourceConfig, DocvarsError> {
        let path = path.as_ref();
        let mut config = DataSourceConfig::new_instance(&self.config_path)?;

        let text = fs::read_to_string(path).map_err(|source| DocvarsError::TemplateRead {
            path: path.display().to_string(),
            source,
        })?;

        let path_str = path.display().to_string();
        let defs = scan_definitions(&path_str, &text)?;
        tracing::debug!(
            template = %path_str,
            count = defs.len(),
            "extracted static variables"
        );

        let mut source = DataSource::new(CONST_SOURCE_NAME);
        for def in defs {
            let holder = if def.is_expr {
                DataHolder::expression(def.name, def.raw)
            } else {
                DataHolder::literal(def.name, def.raw)
            };
            source.push(holder).map_err(|err| DocvarsError::TemplateFormat {
                path: path_str.clone(),
                details: err.to_string(),
            })?;
        }

        config.set_const_data_source(source);
        Ok(config)
    }
}

fn scan_definitions(path: &str, text: &str) -> Result<Vec<ScannedVar>, DocvarsError> {
    let mut defs = Vec::new();
    let mut curr = 0;

    while let Some(rel) = text[curr..].find("${") {
        let body_start = curr + rel + 2;
        let Some(close_rel) = find_balanced_close(&text[body_start..]) else {
            return Err(format_err(path, "unterminated '${' placeholder"));
        };
        let body = &text[body_start..body_start + close_rel];

        if let Some(eq) = body.find('=') {
            let name = &body[..eq];
            let value = &body[eq + 1..];
            if !expr::is_valid_identifier(name) {
                return Err(format_err(path, format!("invalid variable name '{}'", name)));
            }
            defs.push(ScannedVar {
                name: name.to_string(),
                raw: value.to_string(),
                is_expr: value.contains("${"),
            });
        }
        // no '=': a rendering placeholder, not a definition

        curr = body_start + close_rel + 1;
    }

    Ok(defs)
}

/// Index of the `}` closing the outer `${`, counting nested `${`
fn find_balanced_close(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut chars = s.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '$' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn format_err(path: &str, details: impl Into<String>) -> DocvarsError {
    DocvarsError::TemplateFormat {
        path: path.to_string(),
        details: details.into(),
    }
}
