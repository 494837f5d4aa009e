//! End-to-end declaration pass over the whole topology

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sure_infra_core::context::StackContext;
use sure_infra_core::deploy::{Deployment, ResourceOutcome};
use sure_infra_core::engine::{Engine, EngineError, EngineResult};
use sure_infra_core::resource::{ResourceDeclaration, Value};
use sure_infra_stack::config::StackConfig;
use sure_infra_stack::declare_stack;

const REGISTRY: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com";
const DNS_NAME: &str = "sure-lb-1234567890.us-east-1.elb.amazonaws.com";

/// Engine fabricating plausible attributes for every resource type the
/// topology declares
struct FakeCloud {
    /// Registry credential record as the image build received it
    image_registry: Mutex<Option<HashMap<String, Value>>>,
    /// Container specification JSON as the task definition received it
    container_spec: Mutex<Option<String>>,
    /// Load balancer bindings as the service received them
    service_bindings: Mutex<Option<Value>>,
}

impl FakeCloud {
    fn new() -> Self {
        Self {
            image_registry: Mutex::new(None),
            container_spec: Mutex::new(None),
            service_bindings: Mutex::new(None),
        }
    }

    fn string_property(
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
        key: &str,
    ) -> EngineResult<String> {
        match properties.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            other => Err(EngineError::new(format!(
                "expected string property '{}', got {:?}",
                key, other
            ))
            .for_resource(declaration.id.clone())),
        }
    }
}

#[async_trait]
impl Engine for FakeCloud {
    fn name(&self) -> &'static str {
        "fake-cloud"
    }

    async fn read(
        &self,
        declaration: &ResourceDeclaration,
        _properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>> {
        let mut attributes = HashMap::new();
        match declaration.id.resource_type.as_str() {
            "ec2.vpc" => {
                attributes.insert("id".to_string(), Value::from("vpc-0a1b2c3d"));
            }
            "ec2.subnets" => {
                attributes.insert(
                    "ids".to_string(),
                    Value::list([Value::from("subnet-aaa"), Value::from("subnet-bbb")]),
                );
            }
            "ecr.credentials" => {
                attributes.insert(
                    "authorization_token".to_string(),
                    Value::String(STANDARD.encode("AWS:secretpass")),
                );
                attributes.insert(
                    "proxy_endpoint".to_string(),
                    Value::String(format!("https://{}", REGISTRY)),
                );
            }
            other => {
                return Err(EngineError::new(format!("unexpected lookup: {}", other))
                    .for_resource(declaration.id.clone()));
            }
        }
        Ok(attributes)
    }

    async fn create(
        &self,
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>> {
        let name = declaration.id.name.as_str();
        let mut attributes = HashMap::new();
        match declaration.id.resource_type.as_str() {
            "ec2.security_group" => {
                attributes.insert("id".to_string(), Value::from("sg-0f00ba4"));
            }
            "lb.load_balancer" => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/{}/50dc6c",
                        name
                    )),
                );
                attributes.insert("dns_name".to_string(), Value::from(DNS_NAME));
            }
            "lb.target_group" => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/{}/73e2d6",
                        name
                    )),
                );
            }
            "lb.listener" | "acm.certificate" => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!("arn:aws:{}:{}", declaration.id.resource_type, name)),
                );
            }
            "iam.role" => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!("arn:aws:iam::123456789012:role/{}", name)),
                );
                attributes.insert("name".to_string(), Value::String(name.to_string()));
            }
            "iam.role_policy_attachment" => {
                attributes.insert("id".to_string(), Value::String(format!("{}-attachment", name)));
            }
            "ecr.repository" => {
                attributes.insert("registry_id".to_string(), Value::from("123456789012"));
                attributes.insert(
                    "repository_url".to_string(),
                    Value::String(format!("{}/{}", REGISTRY, name)),
                );
            }
            "docker.image" => {
                match properties.get("registry") {
                    Some(Value::Map(registry)) => {
                        *self.image_registry.lock().unwrap() = Some(registry.clone());
                    }
                    other => {
                        return Err(EngineError::new(format!(
                            "registry did not resolve to a credential record: {:?}",
                            other
                        ))
                        .for_resource(declaration.id.clone()));
                    }
                }
                let base = Self::string_property(declaration, properties, "image_name")?;
                attributes.insert("base_image_name".to_string(), Value::String(base.clone()));
                attributes.insert(
                    "image_name".to_string(),
                    Value::String(format!("{}:latest", base)),
                );
            }
            "ecs.cluster" => {
                attributes.insert("id".to_string(), Value::String(format!("{}-id", name)));
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!("arn:aws:ecs:us-east-1:123456789012:cluster/{}", name)),
                );
            }
            "ecs.task_definition" => {
                let spec =
                    Self::string_property(declaration, properties, "container_definitions")?;
                *self.container_spec.lock().unwrap() = Some(spec);
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:ecs:us-east-1:123456789012:task-definition/{}:1",
                        name
                    )),
                );
            }
            "ecs.service" => {
                *self.service_bindings.lock().unwrap() =
                    properties.get("load_balancers").cloned();
                attributes.insert("id".to_string(), Value::String(format!("{}-id", name)));
            }
            other => {
                return Err(EngineError::new(format!("unexpected create: {}", other))
                    .for_resource(declaration.id.clone()));
            }
        }
        Ok(attributes)
    }
}

async fn apply_default_stack(engine: FakeCloud) -> (Deployment<FakeCloud>, Vec<ResourceOutcome>, Vec<(String, String)>) {
    let mut ctx = StackContext::new();
    declare_stack(&mut ctx, &StackConfig::default()).unwrap();

    let deployment = Deployment::new(engine);
    let outcome = deployment.run(ctx).await.unwrap();
    (deployment, outcome.outcomes, outcome.outputs)
}

#[tokio::test]
async fn stack_outputs_resolve_end_to_end() {
    let (_, _, outputs) = apply_default_stack(FakeCloud::new()).await;
    let output = |name: &str| {
        outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing output {}", name))
    };

    assert_eq!(output("url"), DNS_NAME);
    assert_eq!(output("baseImageName"), format!("{}/sure-oracle", REGISTRY));
    assert_eq!(
        output("fullImageName"),
        format!("{}/sure-oracle:latest", REGISTRY)
    );
    assert_eq!(output("sure-ecs"), "sure-cluster-id");
    assert_eq!(
        output("cluster"),
        "arn:aws:ecs:us-east-1:123456789012:cluster/sure-cluster"
    );
}

#[tokio::test]
async fn registry_credentials_are_decoded_before_the_image_build() {
    let (deployment, _, _) = apply_default_stack(FakeCloud::new()).await;

    let registry = deployment.engine().image_registry.lock().unwrap();
    let registry = registry.as_ref().expect("image was never submitted");
    assert_eq!(
        registry.get("server"),
        Some(&Value::String(format!("https://{}", REGISTRY)))
    );
    assert_eq!(registry.get("username"), Some(&Value::from("AWS")));
    assert_eq!(registry.get("password"), Some(&Value::from("secretpass")));
}

#[tokio::test]
async fn container_name_matches_between_task_and_service() {
    let (deployment, _, _) = apply_default_stack(FakeCloud::new()).await;

    let spec = deployment.engine().container_spec.lock().unwrap();
    let spec: serde_json::Value =
        serde_json::from_str(spec.as_ref().expect("task was never submitted")).unwrap();
    let spec_name = spec[0]["name"].as_str().unwrap();
    assert_eq!(
        spec[0]["image"].as_str().unwrap(),
        format!("{}/sure-oracle:latest", REGISTRY)
    );
    assert_eq!(spec[0]["portMappings"][0]["containerPort"], 80);

    let bindings = deployment.engine().service_bindings.lock().unwrap();
    let bindings = match bindings.as_ref() {
        Some(Value::List(bindings)) => bindings.clone(),
        other => panic!("unexpected bindings: {:?}", other),
    };
    assert_eq!(bindings.len(), 1);
    match &bindings[0] {
        Value::Map(binding) => {
            assert_eq!(binding.get("container_name"), Some(&Value::from(spec_name)));
            assert_eq!(binding.get("container_port"), Some(&Value::Int(80)));
            assert_eq!(
                binding.get("target_group_arn"),
                Some(&Value::from(
                    "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/web-tg/73e2d6"
                ))
            );
        }
        other => panic!("unexpected binding: {:?}", other),
    }
}

#[tokio::test]
async fn lookups_are_reads_and_everything_else_is_created() {
    let (_, outcomes, _) = apply_default_stack(FakeCloud::new()).await;

    let reads: Vec<String> = outcomes
        .iter()
        .filter(|o| matches!(o, ResourceOutcome::Read { .. }))
        .map(|o| o.id().to_string())
        .collect();
    assert_eq!(
        reads,
        vec!["ec2.vpc.default", "ec2.subnets.default", "ecr.credentials.sure-oracle"]
    );
    // 14 managed resources plus the three lookups.
    assert_eq!(outcomes.len(), 17);
}
