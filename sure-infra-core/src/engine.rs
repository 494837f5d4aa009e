//! Engine - Boundary trait for the external provisioning engine
//!
//! The program only issues declarations; diffing desired against actual
//! state, dependency-ordered parallel creation, retries and state
//! persistence all live behind this trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::resource::{ResourceDeclaration, ResourceId, Value};

/// Error type for engine operations
#[derive(Debug)]
pub struct EngineError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Provisioning engine boundary
///
/// `read` serves data sources (lookups of existing infrastructure),
/// `create` serves managed resources. Both receive the declaration and its
/// fully resolved properties, and return the engine-assigned attribute
/// map the deferred outputs of that resource resolve from.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Name of this engine (e.g., "simulation")
    fn name(&self) -> &'static str;

    /// Look up a data source
    async fn read(
        &self,
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>>;

    /// Create a managed resource
    async fn create(
        &self,
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display_includes_resource() {
        let err = EngineError::new("no such network")
            .for_resource(ResourceId::new("ec2.vpc", "default"));
        assert_eq!(err.to_string(), "[ec2.vpc.default] no such network");
    }

    #[test]
    fn engine_error_source_is_preserved() {
        let cause = std::io::Error::other("connection reset");
        let err = EngineError::new("lookup failed").with_cause(cause);
        assert!(std::error::Error::source(&err).is_some());
    }
}
