//! Named, ordered collection of data holders
//!
//! Holders keep their declaration order for iteration and export; a
//! name index gives O(1) lookup. The resolver is a memoizing recursive
//! walk that threads an explicit visit stack, so reference cycles
//! abort with `CyclicReference` instead of recursing forever.

use std::collections::HashMap;

use crate::error::DocvarsError;
use crate::expr;
use crate::holder::DataHolder;

#[derive(Debug, Clone, Default)]
pub struct DataSource {
    name: String,
    vars: Vec<DataHolder>,
    index: HashMap<String, usize>,
}

impl DataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Holders in declaration order, stable across calls
    pub fn vars(&self) -> &[DataHolder] {
        &self.vars
    }

    /// Exact, case-sensitive lookup by variable name
    pub fn data_holder(&self, name: &str) -> Option<&DataHolder> {
        self.index.get(name).map(|&i| &self.vars[i])
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Append a holder, rejecting duplicate names
    pub fn push(&mut self, holder: DataHolder) -> Result<(), DocvarsError> {
        if self.index.contains_key(holder.name()) {
            return Err(DocvarsError::DuplicateVariable {
                name: holder.name().to_string(),
                source_name: self.name.clone(),
            });
        }
        self.index.insert(holder.name().to_string(), self.vars.len());
        self.vars.push(holder);
        Ok(())
    }

    /// Resolve a variable to its final value, evaluating expression
    /// holders (and anything they reference) on demand. Results are
    /// memoized inside each holder, so shared sub-expressions are
    /// evaluated once per source.
    pub fn resolve(&self, name: &str) -> Result<String, DocvarsError> {
        tracing::debug!(source = %self.name, variable = name, "resolving variable");
        let mut stack = Vec::new();
        self.resolve_inner(name, &mut stack)
    }

    fn resolve_inner(&self, name: &str, stack: &mut Vec<String>) -> Result<String, DocvarsError> {
        let holder = self
            .data_holder(name)
            .ok_or_else(|| DocvarsError::UnknownVariable {
                name: name.to_string(),
            })?;

        let raw = match holder.expr() {
            None => return Ok(holder.value()?.to_string()),
            Some(raw) => raw,
        };
        if let Some(value) = holder.cached_value() {
            return Ok(value.to_string());
        }

        if stack.iter().any(|visited| visited == name) {
            let chain = format!("{} -> {}", stack.join(" -> "), name);
            return Err(DocvarsError::CyclicReference {
                name: name.to_string(),
                chain,
            });
        }

        stack.push(name.to_string());
        let result = expr::evaluate(raw, &mut |referenced| self.resolve_inner(referenced, stack));
        stack.pop();

        let value = result?;
        holder.store(value.clone());
        Ok(value)
    }
}
