//! Simulation engine - local, file-backed stand-in for a real cloud
//!
//! Fabricates deterministic attributes for every resource type the
//! topology declares and persists created resources to a JSON state
//! file, so repeated applies see the same identifiers.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use sure_infra_aws::{acm, docker, ec2, ecr, ecs, iam, lb};
use sure_infra_core::engine::{Engine, EngineError, EngineResult};
use sure_infra_core::resource::{ResourceDeclaration, ResourceId, Value};

const ACCOUNT: &str = "000000000000";
const REGION: &str = "us-east-1";

pub struct SimulationEngine {
    state_file: PathBuf,
}

impl SimulationEngine {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_dir.into().join("state.json"),
        }
    }

    fn load_states(&self) -> HashMap<String, HashMap<String, serde_json::Value>> {
        if let Ok(content) = fs::read_to_string(&self.state_file) {
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            HashMap::new()
        }
    }

    fn save_states(
        &self,
        states: &HashMap<String, HashMap<String, serde_json::Value>>,
    ) -> Result<(), std::io::Error> {
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(states)?;
        fs::write(&self.state_file, content)
    }

    fn resource_key(id: &ResourceId) -> String {
        id.to_string()
    }

    fn value_to_json(value: &Value) -> serde_json::Value {
        match value {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::value_to_json).collect())
            }
            Value::Map(map) => {
                let obj: serde_json::Map<_, _> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::value_to_json(v)))
                    .collect();
                serde_json::Value::Object(obj)
            }
            // References are resolved before properties reach the engine.
            Value::Ref(r) => serde_json::Value::String(r.to_string()),
        }
    }

    fn json_to_value(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => Value::Int(n.as_i64().unwrap_or(0)),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Self::json_to_value).collect())
            }
            serde_json::Value::Object(map) => {
                let m: HashMap<_, _> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::json_to_value(v)))
                    .collect();
                Value::Map(m)
            }
            serde_json::Value::Null => Value::String("null".to_string()),
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

    /// Fabricate the attributes a real engine would assign
    fn fabricate(
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>> {
        let name = declaration.id.name.as_str();
        let registry = format!("{}.dkr.ecr.{}.amazonaws.com", ACCOUNT, REGION);

        let mut attributes = HashMap::new();
        match declaration.id.resource_type.as_str() {
            ec2::VPC => {
                attributes.insert("id".to_string(), Value::from("vpc-simulated"));
            }
            ec2::SUBNETS => {
                attributes.insert(
                    "ids".to_string(),
                    Value::list([
                        Value::from("subnet-simulated-a"),
                        Value::from("subnet-simulated-b"),
                    ]),
                );
            }
            ec2::SECURITY_GROUP => {
                attributes.insert("id".to_string(), Value::String(format!("sg-{}", name)));
            }
            lb::LOAD_BALANCER => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:elasticloadbalancing:{}:{}:loadbalancer/app/{}/simulated",
                        REGION, ACCOUNT, name
                    )),
                );
                attributes.insert(
                    "dns_name".to_string(),
                    Value::String(format!("{}-simulated.{}.elb.amazonaws.com", name, REGION)),
                );
            }
            lb::TARGET_GROUP => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:elasticloadbalancing:{}:{}:targetgroup/{}/simulated",
                        REGION, ACCOUNT, name
                    )),
                );
            }
            lb::LISTENER => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:elasticloadbalancing:{}:{}:listener/app/{}/simulated",
                        REGION, ACCOUNT, name
                    )),
                );
            }
            acm::CERTIFICATE => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:acm:{}:{}:certificate/{}",
                        REGION, ACCOUNT, name
                    )),
                );
            }
            iam::ROLE => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!("arn:aws:iam::{}:role/{}", ACCOUNT, name)),
                );
                attributes.insert("name".to_string(), Value::String(name.to_string()));
            }
            iam::ROLE_POLICY_ATTACHMENT => {
                attributes.insert("id".to_string(), Value::String(format!("{}-attachment", name)));
            }
            ecr::REPOSITORY => {
                attributes.insert("registry_id".to_string(), Value::from(ACCOUNT));
                attributes.insert(
                    "repository_url".to_string(),
                    Value::String(format!("{}/{}", registry, name)),
                );
            }
            ecr::CREDENTIALS => {
                attributes.insert(
                    "authorization_token".to_string(),
                    Value::String(STANDARD.encode("AWS:simulated-password")),
                );
                attributes.insert(
                    "proxy_endpoint".to_string(),
                    Value::String(format!("https://{}", registry)),
                );
            }
            docker::IMAGE => {
                let base = Self::string_property(declaration, properties, "image_name")?;
                attributes.insert("base_image_name".to_string(), Value::String(base.clone()));
                attributes.insert(
                    "image_name".to_string(),
                    Value::String(format!("{}:latest", base)),
                );
            }
            ecs::CLUSTER => {
                attributes.insert("id".to_string(), Value::String(format!("{}-simulated", name)));
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:ecs:{}:{}:cluster/{}",
                        REGION, ACCOUNT, name
                    )),
                );
            }
            ecs::TASK_DEFINITION => {
                attributes.insert(
                    "arn".to_string(),
                    Value::String(format!(
                        "arn:aws:ecs:{}:{}:task-definition/{}:1",
                        REGION, ACCOUNT, name
                    )),
                );
            }
            ecs::SERVICE => {
                attributes.insert("id".to_string(), Value::String(format!("{}-simulated", name)));
            }
            other => {
                return Err(
                    EngineError::new(format!("unsupported resource type: {}", other))
                        .for_resource(declaration.id.clone()),
                );
            }
        }
        Ok(attributes)
    }
}

#[async_trait]
impl Engine for SimulationEngine {
    fn name(&self) -> &'static str {
        "simulation"
    }

    async fn read(
        &self,
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>> {
        // Lookups are deterministic; nothing to persist.
        Self::fabricate(declaration, properties)
    }

    async fn create(
        &self,
        declaration: &ResourceDeclaration,
        properties: &HashMap<String, Value>,
    ) -> EngineResult<HashMap<String, Value>> {
        let mut states = self.load_states();
        let key = Self::resource_key(&declaration.id);

        // A previously created resource keeps its recorded attributes.
        if let Some(stored) = states.get(&key) {
            return Ok(stored
                .iter()
                .map(|(k, v)| (k.clone(), Self::json_to_value(v)))
                .collect());
        }

        let attributes = Self::fabricate(declaration, properties)?;

        let mut record = HashMap::new();
        for (k, v) in properties {
            record.insert(k.clone(), Self::value_to_json(v));
        }
        for (k, v) in &attributes {
            record.insert(k.clone(), Self::value_to_json(v));
        }
        states.insert(key, record);
        self.save_states(&states).map_err(|e| {
            EngineError::new("Failed to save state")
                .for_resource(declaration.id.clone())
                .with_cause(e)
        })?;

        Ok(attributes)
    }
}
