//! Data source registry built from a backing YAML configuration
//!
//! One `DataSourceConfig` belongs to one template-processing session.
//! `new_instance` is the only creation path: an explicit factory taking
//! the backing configuration path, with no process-wide state, so tests
//! can build isolated instances.
//!
//! Configuration shape:
//!
//! ```yaml
//! sources:
//!   - name: test
//!     vars:
//!       - name: readme
//!         value: "5"
//!       - name: total
//!         expr: "${readme}+1"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::DocvarsError;
use crate::holder::DataHolder;
use crate::source::DataSource;

/// Name of the distinguished source populated from template extraction
pub const CONST_SOURCE_NAME: &str = "constant";

/// Config file parsed from YAML (raw)
#[derive(Debug, Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    sources: Vec<SourceDef>,
}

#[derive(Debug, Deserialize)]
struct SourceDef {
    name: String,
    #[serde(default)]
    vars: Vec<VarDef>,
}

/// A variable carries exactly one of `value` (literal) or `expr`
#[derive(Debug, Deserialize)]
struct VarDef {
    name: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    expr: Option<String>,
}

#[derive(Debug)]
pub struct DataSourceConfig {
    filename: String,
    sources: Vec<DataSource>,
    index: HashMap<String, usize>,
    const_source: DataSource,
}

impl DataSourceConfig {
    /// Build a fresh registry from the backing configuration file.
    /// Fails with `ConfigLoad` if the file cannot be read or is
    /// malformed (duplicate sources, duplicate variables, a var with
    /// both or neither of `value`/`expr`).
    pub fn new_instance(path: impl AsRef<Path>) -> Result<DataSourceConfig, DocvarsError> {
        let path = path.as_ref();
        let filename = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|err| DocvarsError::ConfigLoad {
            path: filename.clone(),
            details: err.to_string(),
        })?;
        Self::from_config_str(&filename, &contents)
    }

    /// Build a registry from already-loaded configuration text
    pub fn from_config_str(
        filename: &str,
        contents: &str,
    ) -> Result<DataSourceConfig, DocvarsError> {
        let raw: ConfigRaw = if contents.trim().is_empty() {
            ConfigRaw {
                sources: Vec::new(),
            }
        } else {
            serde_yaml::from_str(contents).map_err(|err| load_err(filename, err.to_string()))?
        };

        let mut sources = Vec::new();
        let mut index = HashMap::new();
        for source_def in raw.sources {
            if index.contains_key(&source_def.name) {
                return Err(load_err(
                    filename,
                    format!("duplicate data source '{}'", source_def.name),
                ));
            }

            let mut ds = DataSource::new(source_def.name.as_str());
            for var in source_def.vars {
                let holder = match (var.value, var.expr) {
                    (Some(value), None) => DataHolder::literal(var.name, value),
                    (None, Some(expr)) => DataHolder::expression(var.name, expr),
                    _ => {
                        return Err(load_err(
                            filename,
                            format!(
                                "variable '{}' needs exactly one of 'value' or 'expr'",
                                var.name
                            ),
                        ))
                    }
                };
                ds.push(holder)
                    .map_err(|err| load_err(filename, err.to_string()))?;
            }

            index.insert(source_def.name, sources.len());
            sources.push(ds);
        }

        tracing::debug!(
            config = filename,
            sources = sources.len(),
            "loaded data source config"
        );

        Ok(DataSourceConfig {
            filename: filename.to_string(),
            sources,
            index,
            const_source: DataSource::new(CONST_SOURCE_NAME),
        })
    }

    /// The distinguished source populated by template extraction.
    /// Always present; not reachable through `data_source`.
    pub fn const_data_source(&self) -> &DataSource {
        &self.const_source
    }

    pub(crate) fn set_const_data_source(&mut self, source: DataSource) {
        self.const_source = source;
    }

    /// Named lookup among the config-declared sources
    pub fn data_source(&self, name: &str) -> Option<&DataSource> {
        self.index.get(name).map(|&i| &self.sources[i])
    }

    /// Config-declared sources in declaration order
    pub fn data_sources(&self) -> &[DataSource] {
        &self.sources
    }

    /// Identifier of the backing configuration this was built from
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

fn load_err(path: &str, details: impl Into<String>) -> DocvarsError {
    DocvarsError::ConfigLoad {
        path: path.to_string(),
        details: details.into(),
    }
}
