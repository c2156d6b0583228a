//! Named, identity-bearing placeholders for deferred numeric values.
//!
//! Two parameters created with the same name are still distinct: identity is the
//! pair of name and a process-unique id drawn from an atomic counter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::expression::ParameterExpression;

static NEXT_UUID: AtomicU64 = AtomicU64::new(1);

/// A named placeholder with a unique identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parameter {
    uuid: u64,
    name: Arc<str>,
}

/// Stable hash key of a parameter, used for identity and equality of expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey {
    pub name: Arc<str>,
    pub uuid: u64,
}

impl Parameter {
    /// Creates a parameter with a fresh identity.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            uuid: NEXT_UUID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    /// Rebuilds a parameter with a known identity, e.g. when reading one back from storage.
    pub fn with_uuid(name: impl Into<Arc<str>>, uuid: u64) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> u64 {
        self.uuid
    }

    pub fn hash_key(&self) -> ParameterKey {
        ParameterKey {
            name: Arc::clone(&self.name),
            uuid: self.uuid,
        }
    }

    /// Wraps the parameter in a standalone expression containing only itself.
    pub fn expr(&self) -> ParameterExpression {
        ParameterExpression::from_parameter(self)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({})", self.name)
    }
}

impl From<Parameter> for ParameterExpression {
    fn from(parameter: Parameter) -> Self {
        parameter.expr()
    }
}

impl From<&Parameter> for ParameterExpression {
    fn from(parameter: &Parameter) -> Self {
        parameter.expr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_distinct_identity() {
        let a = Parameter::new("theta");
        let b = Parameter::new("theta");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
        assert_ne!(a.hash_key(), b.hash_key());
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_with_uuid_restores_identity() {
        let a = Parameter::new("phi");
        let restored = Parameter::with_uuid("phi", a.uuid());
        assert_eq!(a, restored);
        assert_eq!(a.hash_key(), restored.hash_key());
    }

    #[test]
    fn test_ordering_follows_creation() {
        let first = Parameter::new("b");
        let second = Parameter::new("a");
        assert!(first < second);
    }

    #[test]
    fn test_display() {
        let p = Parameter::new("gamma");
        assert_eq!(p.to_string(), "gamma");
        assert_eq!(format!("{:?}", p), "Parameter(gamma)");
    }
}
