//! Context - One-shot declaration context threaded through the stack
//!
//! The context accumulates resource declarations in program order, mints
//! deferred output handles, and records named stack outputs. It enforces
//! the reference invariant at declaration time: every output reference and
//! every depends_on target used by a declaration must already exist, so
//! forward references are impossible by construction.

use std::collections::{HashMap, HashSet};

use crate::error::{StackError, StackResult};
use crate::output::{OutputRef, OutputSource, TransformFn, TransformResult};
use crate::resource::{ResourceDeclaration, ResourceId, Value};

/// Handle to a declared resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHandle {
    id: ResourceId,
}

impl ResourceHandle {
    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

/// Options for a declaration beyond its property map
#[derive(Debug, Clone, Default)]
pub struct DeclareOptions {
    /// Explicit ordering constraints, for dependencies the engine cannot
    /// infer from property references
    pub depends_on: Vec<ResourceId>,
}

impl DeclareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depends_on(mut self, id: ResourceId) -> Self {
        self.depends_on.push(id);
        self
    }
}

/// Declaration context for a single apply invocation
///
/// Consumed by `Deployment::run`; a new context is built for every pass.
pub struct StackContext {
    declarations: Vec<ResourceDeclaration>,
    index: HashMap<ResourceId, usize>,
    sources: HashMap<OutputRef, OutputSource>,
    transforms: HashMap<OutputRef, TransformFn>,
    exports: Vec<(String, Value)>,
    export_names: HashSet<String>,
    next_output: u32,
}

/// Pieces of a consumed context, handed to the declaration-pass driver
pub(crate) struct ContextParts {
    pub declarations: Vec<ResourceDeclaration>,
    pub sources: HashMap<OutputRef, OutputSource>,
    pub transforms: HashMap<OutputRef, TransformFn>,
    pub exports: Vec<(String, Value)>,
}

impl StackContext {
    pub fn new() -> Self {
        Self {
            declarations: Vec::new(),
            index: HashMap::new(),
            sources: HashMap::new(),
            transforms: HashMap::new(),
            exports: Vec::new(),
            export_names: HashSet::new(),
            next_output: 0,
        }
    }

    /// Declare a managed resource
    pub fn declare(
        &mut self,
        resource_type: &str,
        name: &str,
        properties: HashMap<String, Value>,
    ) -> StackResult<ResourceHandle> {
        self.submit(resource_type, name, properties, false, DeclareOptions::new())
    }

    /// Declare a managed resource with explicit options
    pub fn declare_with(
        &mut self,
        resource_type: &str,
        name: &str,
        properties: HashMap<String, Value>,
        options: DeclareOptions,
    ) -> StackResult<ResourceHandle> {
        self.submit(resource_type, name, properties, false, options)
    }

    /// Declare a data source: existing infrastructure looked up, not created
    pub fn lookup(
        &mut self,
        resource_type: &str,
        name: &str,
        properties: HashMap<String, Value>,
    ) -> StackResult<ResourceHandle> {
        self.submit(resource_type, name, properties, true, DeclareOptions::new())
    }

    fn submit(
        &mut self,
        resource_type: &str,
        name: &str,
        properties: HashMap<String, Value>,
        read_only: bool,
        options: DeclareOptions,
    ) -> StackResult<ResourceHandle> {
        let id = ResourceId::new(resource_type, name);
        if self.index.contains_key(&id) {
            return Err(StackError::DuplicateDeclaration(id));
        }

        for value in properties.values() {
            self.check_refs(value, &id.to_string())?;
        }
        for dependency in &options.depends_on {
            if !self.index.contains_key(dependency) {
                return Err(StackError::UndeclaredDependency {
                    resource: id,
                    dependency: dependency.clone(),
                });
            }
        }

        self.index.insert(id.clone(), self.declarations.len());
        self.declarations.push(ResourceDeclaration {
            id: id.clone(),
            properties,
            read_only,
            depends_on: options.depends_on,
        });

        Ok(ResourceHandle { id })
    }

    /// Mint a deferred handle to an engine-assigned attribute
    pub fn output(&mut self, handle: &ResourceHandle, attribute: &str) -> OutputRef {
        self.mint(OutputSource::Attribute {
            resource: handle.id.clone(),
            attribute: attribute.to_string(),
        })
    }

    /// Register a transformation over deferred values
    ///
    /// `input` may embed any number of output references; the declaration
    /// pass invokes `f` exactly once, after all of them resolve and before
    /// any declaration referencing the returned handle is submitted.
    pub fn apply(
        &mut self,
        name: &str,
        input: Value,
        f: impl FnOnce(Value) -> TransformResult + Send + 'static,
    ) -> StackResult<OutputRef> {
        self.check_refs(&input, &format!("transformation '{}'", name))?;
        let r = self.mint(OutputSource::Transform {
            name: name.to_string(),
            input,
        });
        self.transforms.insert(r, Box::new(f));
        Ok(r)
    }

    /// Register a named, string-valued stack output
    pub fn export(&mut self, name: &str, value: impl Into<Value>) -> StackResult<()> {
        if !self.export_names.insert(name.to_string()) {
            return Err(StackError::DuplicateExport(name.to_string()));
        }
        let value = value.into();
        self.check_refs(&value, &format!("export '{}'", name))?;
        self.exports.push((name.to_string(), value));
        Ok(())
    }

    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    pub fn exports(&self) -> &[(String, Value)] {
        &self.exports
    }

    /// Find a declaration by id
    pub fn get(&self, id: &ResourceId) -> Option<&ResourceDeclaration> {
        self.index.get(id).map(|&i| &self.declarations[i])
    }

    /// Source of a deferred value minted by this context
    pub fn source(&self, r: OutputRef) -> Option<&OutputSource> {
        self.sources.get(&r)
    }

    pub(crate) fn into_parts(self) -> ContextParts {
        ContextParts {
            declarations: self.declarations,
            sources: self.sources,
            transforms: self.transforms,
            exports: self.exports,
        }
    }

    fn mint(&mut self, source: OutputSource) -> OutputRef {
        let r = OutputRef(self.next_output);
        self.next_output += 1;
        self.sources.insert(r, source);
        r
    }

    fn check_refs(&self, value: &Value, context: &str) -> StackResult<()> {
        let mut refs = Vec::new();
        value.collect_refs(&mut refs);
        for r in refs {
            if !self.sources.contains_key(&r) {
                return Err(StackError::UnknownReference {
                    context: context.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for StackContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_declaration_is_rejected() {
        let mut ctx = StackContext::new();
        ctx.declare("ecs.cluster", "sure-cluster", HashMap::new())
            .unwrap();
        let err = ctx
            .declare("ecs.cluster", "sure-cluster", HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateDeclaration(_)));
    }

    #[test]
    fn same_name_different_type_is_allowed() {
        let mut ctx = StackContext::new();
        ctx.declare("ecr.repository", "sure-oracle", HashMap::new())
            .unwrap();
        ctx.declare("docker.image", "sure-oracle", HashMap::new())
            .unwrap();
        assert_eq!(ctx.declarations().len(), 2);
    }

    #[test]
    fn foreign_ref_is_rejected() {
        let mut other = StackContext::new();
        let handle = other.declare("ec2.vpc", "default", HashMap::new()).unwrap();
        let foreign = other.output(&handle, "id");

        let mut ctx = StackContext::new();
        let mut properties = HashMap::new();
        properties.insert("vpc_id".to_string(), Value::Ref(foreign));
        let err = ctx
            .declare("ec2.security_group", "web-sg", properties)
            .unwrap_err();
        assert!(matches!(err, StackError::UnknownReference { .. }));
    }

    #[test]
    fn depends_on_must_be_declared_first() {
        let mut ctx = StackContext::new();
        let err = ctx
            .declare_with(
                "ecs.service",
                "sure-svc",
                HashMap::new(),
                DeclareOptions::new().depends_on(ResourceId::new("ecs.cluster", "sure-cluster")),
            )
            .unwrap_err();
        assert!(matches!(err, StackError::UndeclaredDependency { .. }));
    }

    #[test]
    fn duplicate_export_is_rejected() {
        let mut ctx = StackContext::new();
        ctx.export("url", "a").unwrap();
        let err = ctx.export("url", "b").unwrap_err();
        assert!(matches!(err, StackError::DuplicateExport(_)));
    }

    #[test]
    fn exports_keep_registration_order() {
        let mut ctx = StackContext::new();
        ctx.export("baseImageName", "base").unwrap();
        ctx.export("fullImageName", "full").unwrap();
        let names: Vec<_> = ctx.exports().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["baseImageName", "fullImageName"]);
    }
}
