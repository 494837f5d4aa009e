//! ECS cluster, task definition and service arguments

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sure_infra_core::resource::Value;

pub const CLUSTER: &str = "ecs.cluster";
pub const TASK_DEFINITION: &str = "ecs.task_definition";
pub const SERVICE: &str = "ecs.service";

/// One container of a task definition's container specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: String,
}

impl PortMapping {
    pub fn tcp(port: u16) -> Self {
        Self {
            container_port: port,
            host_port: port,
            protocol: "tcp".to_string(),
        }
    }
}

/// Render the container specification JSON for a single container
/// exposing one TCP port
pub fn container_definitions(name: &str, image: &str, port: u16) -> serde_json::Result<String> {
    serde_json::to_string(&[ContainerDefinition {
        name: name.to_string(),
        image: image.to_string(),
        port_mappings: vec![PortMapping::tcp(port)],
    }])
}

/// Arguments for a task definition declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinitionArgs {
    pub family: String,
    pub cpu: String,
    pub memory: String,
    pub network_mode: String,
    pub requires_compatibilities: Vec<String>,
    pub execution_role_arn: Value,
    pub container_definitions: Value,
}

impl TaskDefinitionArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("family".to_string(), Value::String(self.family));
        properties.insert("cpu".to_string(), Value::String(self.cpu));
        properties.insert("memory".to_string(), Value::String(self.memory));
        properties.insert("network_mode".to_string(), Value::String(self.network_mode));
        properties.insert(
            "requires_compatibilities".to_string(),
            Value::list(
                self.requires_compatibilities
                    .into_iter()
                    .map(Value::String),
            ),
        );
        properties.insert("execution_role_arn".to_string(), self.execution_role_arn);
        properties.insert(
            "container_definitions".to_string(),
            self.container_definitions,
        );
        properties
    }
}

/// Network configuration of a service
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfiguration {
    pub assign_public_ip: bool,
    pub subnets: Value,
    pub security_groups: Vec<Value>,
}

impl NetworkConfiguration {
    fn into_value(self) -> Value {
        Value::map([
            ("assign_public_ip", Value::Bool(self.assign_public_ip)),
            ("subnets", self.subnets),
            ("security_groups", Value::list(self.security_groups)),
        ])
    }
}

/// Binding of a service container to a load balancer target group
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerBinding {
    pub target_group_arn: Value,
    pub container_name: String,
    pub container_port: i64,
}

impl LoadBalancerBinding {
    fn into_value(self) -> Value {
        Value::map([
            ("target_group_arn", self.target_group_arn),
            ("container_name", Value::String(self.container_name)),
            ("container_port", Value::Int(self.container_port)),
        ])
    }
}

/// Arguments for a service declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArgs {
    pub cluster: Value,
    pub desired_count: i64,
    pub launch_type: String,
    pub task_definition: Value,
    pub network_configuration: NetworkConfiguration,
    pub load_balancers: Vec<LoadBalancerBinding>,
}

impl ServiceArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("cluster".to_string(), self.cluster);
        properties.insert("desired_count".to_string(), Value::Int(self.desired_count));
        properties.insert("launch_type".to_string(), Value::String(self.launch_type));
        properties.insert("task_definition".to_string(), self.task_definition);
        properties.insert(
            "network_configuration".to_string(),
            self.network_configuration.into_value(),
        );
        properties.insert(
            "load_balancers".to_string(),
            Value::list(
                self.load_balancers
                    .into_iter()
                    .map(LoadBalancerBinding::into_value),
            ),
        );
        properties
    }
}
