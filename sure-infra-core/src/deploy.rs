//! Deploy - Run a declaration pass against an engine
//!
//! Declarations are submitted in program order. Property references are
//! substituted from already-resolved resources, registered transformations
//! run lazily the first time their result is needed, and the first failure
//! of any kind aborts the pass.

use std::collections::HashMap;

use crate::context::StackContext;
use crate::engine::Engine;
use crate::error::{StackError, StackResult};
use crate::output::{OutputRef, OutputSource, TransformFn};
use crate::resource::{ResourceId, Value};

/// Result of submitting one declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceOutcome {
    /// Data source looked up
    Read { id: ResourceId },
    /// Managed resource created
    Created { id: ResourceId },
}

impl ResourceOutcome {
    pub fn id(&self) -> &ResourceId {
        match self {
            ResourceOutcome::Read { id } | ResourceOutcome::Created { id } => id,
        }
    }
}

/// Result of a whole declaration pass
#[derive(Debug)]
pub struct ApplyOutcome {
    pub outcomes: Vec<ResourceOutcome>,
    /// Named stack outputs, resolved to strings, in registration order
    pub outputs: Vec<(String, String)>,
}

impl ApplyOutcome {
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Runs declaration passes against an engine
pub struct Deployment<E: Engine> {
    engine: E,
}

impl<E: Engine> Deployment<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Execute the pass described by a consumed context
    pub async fn run(&self, ctx: StackContext) -> StackResult<ApplyOutcome> {
        let parts = ctx.into_parts();
        let mut resolution = Resolution {
            sources: &parts.sources,
            transforms: parts.transforms,
            created: HashMap::new(),
            resolved: HashMap::new(),
        };

        let mut outcomes = Vec::with_capacity(parts.declarations.len());
        for declaration in &parts.declarations {
            let mut properties = HashMap::new();
            for (key, value) in &declaration.properties {
                properties.insert(key.clone(), resolution.resolve(value)?);
            }

            // Sequential submission keeps depends_on ordering trivially
            // satisfied; the annotation itself travels with the declaration.
            let attributes = if declaration.read_only {
                self.engine.read(declaration, &properties).await?
            } else {
                self.engine.create(declaration, &properties).await?
            };

            // Engine-assigned attributes win over echoed inputs.
            let mut all = properties;
            all.extend(attributes);
            resolution.created.insert(declaration.id.clone(), all);

            outcomes.push(if declaration.read_only {
                ResourceOutcome::Read {
                    id: declaration.id.clone(),
                }
            } else {
                ResourceOutcome::Created {
                    id: declaration.id.clone(),
                }
            });
        }

        let mut outputs = Vec::with_capacity(parts.exports.len());
        for (name, value) in &parts.exports {
            let resolved = resolution.resolve(value)?;
            outputs.push((name.clone(), export_string(&resolved)));
        }

        Ok(ApplyOutcome { outcomes, outputs })
    }
}

/// Resolution state for a single pass
struct Resolution<'a> {
    sources: &'a HashMap<OutputRef, OutputSource>,
    transforms: HashMap<OutputRef, TransformFn>,
    created: HashMap<ResourceId, HashMap<String, Value>>,
    resolved: HashMap<OutputRef, Value>,
}

impl Resolution<'_> {
    fn resolve(&mut self, value: &Value) -> StackResult<Value> {
        match value {
            Value::Ref(r) => self.resolve_ref(*r),
            Value::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve(item)?);
                }
                Ok(Value::List(resolved))
            }
            Value::Map(map) => {
                let mut resolved = HashMap::with_capacity(map.len());
                for (k, v) in map {
                    resolved.insert(k.clone(), self.resolve(v)?);
                }
                Ok(Value::Map(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(&mut self, r: OutputRef) -> StackResult<Value> {
        if let Some(v) = self.resolved.get(&r) {
            return Ok(v.clone());
        }

        let source = self
            .sources
            .get(&r)
            .cloned()
            .ok_or_else(|| StackError::UnknownReference {
                context: r.to_string(),
            })?;

        let value = match source {
            OutputSource::Attribute {
                resource,
                attribute,
            } => {
                let attributes =
                    self.created
                        .get(&resource)
                        .ok_or_else(|| StackError::UnresolvedReference {
                            resource: resource.clone(),
                            attribute: attribute.clone(),
                        })?;
                attributes
                    .get(&attribute)
                    .cloned()
                    .ok_or(StackError::UnknownAttribute {
                        resource,
                        attribute,
                    })?
            }
            OutputSource::Transform { name, input } => {
                let input = self.resolve(&input)?;
                let f = self
                    .transforms
                    .remove(&r)
                    .ok_or_else(|| StackError::TransformReused(name.clone()))?;
                f(input).map_err(|cause| StackError::Transform { name, cause })?
            }
        };

        self.resolved.insert(r, value.clone());
        Ok(value)
    }
}

/// Render a resolved value as a string-valued stack output
fn export_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let parts: Vec<_> = items.iter().map(export_string).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let parts: Vec<_> = keys
                .iter()
                .map(|k| format!("{}: {}", k, export_string(&map[*k])))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        // Refs are resolved before export rendering.
        Value::Ref(r) => r.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::engine::{EngineError, EngineResult};
    use crate::resource::ResourceDeclaration;

    /// Engine that assigns an id to every resource and echoes lookups
    struct TestEngine {
        creates: AtomicUsize,
    }

    impl TestEngine {
        fn new() -> Self {
            Self {
                creates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Engine for TestEngine {
        fn name(&self) -> &'static str {
            "test"
        }

        async fn read(
            &self,
            declaration: &ResourceDeclaration,
            _properties: &HashMap<String, Value>,
        ) -> EngineResult<HashMap<String, Value>> {
            let mut attributes = HashMap::new();
            attributes.insert(
                "id".to_string(),
                Value::String(format!("{}-found", declaration.id.name)),
            );
            Ok(attributes)
        }

        async fn create(
            &self,
            declaration: &ResourceDeclaration,
            _properties: &HashMap<String, Value>,
        ) -> EngineResult<HashMap<String, Value>> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let mut attributes = HashMap::new();
            attributes.insert(
                "id".to_string(),
                Value::String(format!("{}-id", declaration.id.name)),
            );
            Ok(attributes)
        }
    }

    /// Engine that fails every create
    struct FailingEngine;

    #[async_trait]
    impl Engine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn read(
            &self,
            declaration: &ResourceDeclaration,
            _properties: &HashMap<String, Value>,
        ) -> EngineResult<HashMap<String, Value>> {
            Err(EngineError::new("lookup failed").for_resource(declaration.id.clone()))
        }

        async fn create(
            &self,
            declaration: &ResourceDeclaration,
            _properties: &HashMap<String, Value>,
        ) -> EngineResult<HashMap<String, Value>> {
            Err(EngineError::new("create failed").for_resource(declaration.id.clone()))
        }
    }

    #[tokio::test]
    async fn resolves_attribute_references_across_declarations() {
        let mut ctx = StackContext::new();
        let vpc = ctx.declare("ec2.vpc", "main", HashMap::new()).unwrap();
        let vpc_id = ctx.output(&vpc, "id");

        let mut properties = HashMap::new();
        properties.insert("vpc_id".to_string(), Value::Ref(vpc_id));
        ctx.declare("ec2.security_group", "web-sg", properties)
            .unwrap();
        ctx.export("vpc", vpc_id).unwrap();

        let outcome = Deployment::new(TestEngine::new()).run(ctx).await.unwrap();
        assert_eq!(outcome.outcomes.len(), 2);
        assert_eq!(outcome.output("vpc"), Some("main-id"));
    }

    #[tokio::test]
    async fn transform_runs_exactly_once() {
        let invocations = std::sync::Arc::new(AtomicUsize::new(0));
        let seen = invocations.clone();

        let mut ctx = StackContext::new();
        let repo = ctx.declare("ecr.repository", "repo", HashMap::new()).unwrap();
        let id = ctx.output(&repo, "id");
        let upper = ctx
            .apply("uppercase", Value::Ref(id), move |value| {
                seen.fetch_add(1, Ordering::SeqCst);
                let s = value.as_str().ok_or("expected string")?;
                Ok(Value::String(s.to_uppercase()))
            })
            .unwrap();

        // Referenced twice: once by a declaration, once by an export.
        let mut properties = HashMap::new();
        properties.insert("image".to_string(), Value::Ref(upper));
        ctx.declare("docker.image", "image", properties).unwrap();
        ctx.export("upper", upper).unwrap();

        let outcome = Deployment::new(TestEngine::new()).run(ctx).await.unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.output("upper"), Some("REPO-ID"));
    }

    #[tokio::test]
    async fn transform_failure_aborts_before_dependents() {
        let engine = TestEngine::new();

        let mut ctx = StackContext::new();
        let repo = ctx.declare("ecr.repository", "repo", HashMap::new()).unwrap();
        let id = ctx.output(&repo, "id");
        let broken = ctx
            .apply("broken", Value::Ref(id), |_| Err("no credentials".into()))
            .unwrap();

        let mut properties = HashMap::new();
        properties.insert("registry".to_string(), Value::Ref(broken));
        ctx.declare("docker.image", "image", properties).unwrap();

        let deployment = Deployment::new(engine);
        let err = deployment.run(ctx).await.unwrap_err();
        assert!(matches!(err, StackError::Transform { .. }));
        assert!(err.to_string().contains("no credentials"));
        // Only the repository was submitted; the image never was.
        assert_eq!(deployment.engine.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_failure_is_fatal() {
        let mut ctx = StackContext::new();
        ctx.lookup("ec2.vpc", "default", HashMap::new()).unwrap();
        ctx.declare("ecs.cluster", "sure-cluster", HashMap::new())
            .unwrap();

        let err = Deployment::new(FailingEngine).run(ctx).await.unwrap_err();
        assert!(matches!(err, StackError::Engine(_)));
        assert!(err.to_string().contains("lookup failed"));
    }

    #[tokio::test]
    async fn unknown_attribute_is_reported() {
        let mut ctx = StackContext::new();
        let vpc = ctx.declare("ec2.vpc", "main", HashMap::new()).unwrap();
        let missing = ctx.output(&vpc, "cidr_block");
        ctx.export("cidr", missing).unwrap();

        let err = Deployment::new(TestEngine::new()).run(ctx).await.unwrap_err();
        assert!(matches!(err, StackError::UnknownAttribute { .. }));
    }

    #[tokio::test]
    async fn data_sources_are_read_not_created() {
        let engine = TestEngine::new();
        let mut ctx = StackContext::new();
        ctx.lookup("ec2.vpc", "default", HashMap::new()).unwrap();

        let deployment = Deployment::new(engine);
        let outcome = deployment.run(ctx).await.unwrap();
        assert!(matches!(outcome.outcomes[0], ResourceOutcome::Read { .. }));
        assert_eq!(deployment.engine.creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn export_string_renders_scalars_bare() {
        assert_eq!(export_string(&Value::String("a".into())), "a");
        assert_eq!(export_string(&Value::Int(5)), "5");
        assert_eq!(
            export_string(&Value::list([Value::from("a"), Value::from("b")])),
            "[a, b]"
        );
    }
}
