//! Resource - Immutable resource declarations and their property values

use std::collections::HashMap;
use std::fmt;

use crate::output::OutputRef;

/// Unique identifier for a declared resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "ec2.security_group", "ecs.service")
    pub resource_type: String,
    /// Logical name of the declaration
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Property value of a resource declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to a deferred output value (an engine-assigned attribute
    /// or the result of a registered transformation)
    Ref(OutputRef),
}

impl Value {
    /// Build a map value from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Ref(_) => "ref",
        }
    }

    /// Collect every output reference embedded in this value
    pub fn collect_refs(&self, out: &mut Vec<OutputRef>) {
        match self {
            Value::Ref(r) => out.push(*r),
            Value::List(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Value::Map(map) => {
                for v in map.values() {
                    v.collect_refs(out);
                }
            }
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<OutputRef> for Value {
    fn from(r: OutputRef) -> Self {
        Value::Ref(r)
    }
}

/// A desired resource, immutable once submitted to the context
///
/// `read_only` marks data sources: existing infrastructure that is looked
/// up rather than created (default network, subnet listing, registry
/// credentials). `depends_on` records explicit ordering constraints that
/// are not implied by property references.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    pub id: ResourceId,
    pub properties: HashMap<String, Value>,
    pub read_only: bool,
    pub depends_on: Vec<ResourceId>,
}

impl ResourceDeclaration {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            properties: HashMap::new(),
            read_only: false,
            depends_on: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_depends_on(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.depends_on.extend(ids);
        self
    }

    /// Returns true if this declaration is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("ecs.service", "sure-svc");
        assert_eq!(id.to_string(), "ecs.service.sure-svc");
    }

    #[test]
    fn collect_refs_walks_nested_values() {
        let r = OutputRef::for_tests(7);
        let value = Value::map([
            ("subnets", Value::list([Value::Ref(r)])),
            ("count", Value::Int(5)),
        ]);

        let mut refs = Vec::new();
        value.collect_refs(&mut refs);
        assert_eq!(refs, vec![r]);
    }

    #[test]
    fn declaration_builder() {
        let decl = ResourceDeclaration::new("ec2.vpc", "default")
            .with_property("default", Value::Bool(true))
            .with_read_only(true);

        assert!(decl.is_data_source());
        assert_eq!(decl.properties.get("default"), Some(&Value::Bool(true)));
    }
}
