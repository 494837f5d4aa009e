//! Output - Deferred values resolved by the provisioning engine
//!
//! An `OutputRef` is a handle to data that is not known until the engine
//! provisions the resource that produces it. The program never reads the
//! concrete value; it can only pass the handle onward or register a
//! transformation that the declaration pass invokes exactly once, after
//! the value resolves.

use std::fmt;

use crate::resource::{ResourceId, Value};

/// Opaque handle to a deferred value, minted by the stack context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef(pub(crate) u32);

impl OutputRef {
    #[cfg(test)]
    pub(crate) fn for_tests(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Where a deferred value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSource {
    /// An engine-assigned attribute of a declared resource
    Attribute {
        resource: ResourceId,
        attribute: String,
    },
    /// The result of a registered transformation over other deferred
    /// values embedded in `input`
    Transform { name: String, input: Value },
}

/// Error type returned by transformation bodies; the declaration pass
/// wraps it with the transformation name
pub type TransformResult = Result<Value, Box<dyn std::error::Error + Send + Sync>>;

/// A registered transformation, consumed on its single invocation
pub type TransformFn = Box<dyn FnOnce(Value) -> TransformResult + Send>;
