//! Graph - Dependency edges implied by a declaration context
//!
//! The engine derives creation order from references, not from program
//! order; this module makes that graph inspectable for display and tests.
//! Edges come from property references (followed transitively through
//! transformations) and from explicit depends_on annotations.

use std::collections::{BTreeSet, HashMap};

use crate::context::StackContext;
use crate::output::OutputSource;
use crate::resource::{ResourceId, Value};

/// Dependency graph over the declarations of one context
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<ResourceId, BTreeSet<ResourceId>>,
}

impl DependencyGraph {
    /// Extract the graph from a context
    pub fn from_context(ctx: &StackContext) -> Self {
        let mut edges: HashMap<ResourceId, BTreeSet<ResourceId>> = HashMap::new();

        for declaration in ctx.declarations() {
            let mut deps = BTreeSet::new();
            for value in declaration.properties.values() {
                collect_resource_deps(value, ctx, &mut deps);
            }
            deps.extend(declaration.depends_on.iter().cloned());
            deps.remove(&declaration.id);
            edges.insert(declaration.id.clone(), deps);
        }

        Self { edges }
    }

    /// Resources `id` depends on, directly
    pub fn dependencies_of(&self, id: &ResourceId) -> impl Iterator<Item = &ResourceId> {
        self.edges.get(id).into_iter().flatten()
    }

    pub fn depends_on(&self, id: &ResourceId, dependency: &ResourceId) -> bool {
        self.edges
            .get(id)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// Resources that depend on `id`, directly
    pub fn dependents_of(&self, id: &ResourceId) -> Vec<&ResourceId> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(id))
            .map(|(from, _)| from)
            .collect()
    }
}

fn collect_resource_deps(value: &Value, ctx: &StackContext, out: &mut BTreeSet<ResourceId>) {
    match value {
        Value::Ref(r) => match ctx.source(*r) {
            Some(OutputSource::Attribute { resource, .. }) => {
                out.insert(resource.clone());
            }
            Some(OutputSource::Transform { input, .. }) => {
                collect_resource_deps(input, ctx, out);
            }
            None => {}
        },
        Value::List(items) => {
            for item in items {
                collect_resource_deps(item, ctx, out);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_resource_deps(v, ctx, out);
            }
        }
        _ => {}
    }
}
