//! A single named template variable
//!
//! A holder is either a literal (value known at extraction time) or an
//! unevaluated expression. Expression holders memoize their resolved
//! value in a `OnceCell`: the cache is written once, on success only,
//! so a failed evaluation can be retried and a second `fill_value`
//! call returns the cached result without re-running anything.

use once_cell::sync::OnceCell;

use crate::error::DocvarsError;
use crate::source::DataSource;

#[derive(Debug, Clone)]
pub struct DataHolder {
    name: String,
    kind: VarKind,
}

#[derive(Debug, Clone)]
enum VarKind {
    Literal(String),
    Expression { raw: String, cached: OnceCell<String> },
}

impl DataHolder {
    /// A variable whose value is known up front
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Literal(value.into()),
        }
    }

    /// A variable holding an unevaluated expression
    pub fn expression(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Expression {
                raw: raw.into(),
                cached: OnceCell::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.kind, VarKind::Expression { .. })
    }

    /// The raw expression string, `None` for literals. Preserved
    /// verbatim even after evaluation.
    pub fn expr(&self) -> Option<&str> {
        match &self.kind {
            VarKind::Literal(_) => None,
            VarKind::Expression { raw, .. } => Some(raw),
        }
    }

    /// The resolved value. Errors with `UnresolvedExpression` if this
    /// holder carries an expression that has not been evaluated yet.
    pub fn value(&self) -> Result<&str, DocvarsError> {
        match &self.kind {
            VarKind::Literal(value) => Ok(value),
            VarKind::Expression { cached, .. } => {
                cached.get().map(String::as_str).ok_or_else(|| {
                    DocvarsError::UnresolvedExpression {
                        name: self.name.clone(),
                    }
                })
            }
        }
    }

    /// Evaluate this holder's expression against its owning source and
    /// cache the result. Idempotent: a second call returns the cached
    /// value without re-evaluating.
    pub fn fill_value(&self, owner: &DataSource) -> Result<&str, DocvarsError> {
        match &self.kind {
            VarKind::Literal(value) => Ok(value),
            VarKind::Expression { cached, .. } => {
                if let Some(value) = cached.get() {
                    return Ok(value);
                }
                let value = owner.resolve(&self.name)?;
                Ok(cached.get_or_init(|| value).as_str())
            }
        }
    }

    pub(crate) fn cached_value(&self) -> Option<&str> {
        match &self.kind {
            VarKind::Literal(_) => None,
            VarKind::Expression { cached, .. } => cached.get().map(String::as_str),
        }
    }

    pub(crate) fn store(&self, value: String) {
        if let VarKind::Expression { cached, .. } = &self.kind {
            // first writer wins; later stores of the same name are no-ops
            let _ = cached.set(value);
        }
    }
}
