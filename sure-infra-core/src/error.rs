//! Error types for the declaration pass

use thiserror::Error;

use crate::engine::EngineError;
use crate::resource::ResourceId;

/// Errors raised while building or running a declaration pass
///
/// Every variant is fatal: the pass aborts on the first error and no
/// partial apply of later declarations is attempted.
#[derive(Debug, Error)]
pub enum StackError {
    /// A (type, name) pair was declared twice
    #[error("Duplicate declaration: {0}")]
    DuplicateDeclaration(ResourceId),

    /// A depends_on target was not declared before the resource naming it
    #[error("{resource} depends on {dependency}, which is not declared before it")]
    UndeclaredDependency {
        resource: ResourceId,
        dependency: ResourceId,
    },

    /// A value referenced an output this context never minted
    #[error("Unknown output reference in {context}")]
    UnknownReference { context: String },

    /// An attribute was read before the resource producing it resolved
    #[error("{resource}.{attribute} is referenced before the resource is resolved")]
    UnresolvedReference {
        resource: ResourceId,
        attribute: String,
    },

    /// The engine did not produce a referenced attribute
    #[error("{resource} has no attribute '{attribute}'")]
    UnknownAttribute {
        resource: ResourceId,
        attribute: String,
    },

    /// A registered transformation failed; terminal for the apply
    #[error("Transformation '{name}' failed: {cause}")]
    Transform {
        name: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A transformation handle was resolved twice
    #[error("Transformation '{0}' was already applied")]
    TransformReused(String),

    /// A stack output name was registered twice
    #[error("Duplicate export: {0}")]
    DuplicateExport(String),

    /// Declaration or provisioning failure reported by the engine
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type StackResult<T> = Result<T, StackError>;
