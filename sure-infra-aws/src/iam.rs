//! IAM role and policy attachment arguments

use std::collections::HashMap;

use serde_json::json;
use sure_infra_core::resource::Value;

pub const ROLE: &str = "iam.role";
pub const ROLE_POLICY_ATTACHMENT: &str = "iam.role_policy_attachment";

/// Managed policy granting task execution permissions (image pull, log write)
pub const ECS_TASK_EXECUTION_ROLE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

/// Trust policy allowing only the ECS task principal to assume the role
pub fn ecs_tasks_assume_role_policy() -> String {
    json!({
        "Version": "2008-10-17",
        "Statement": [{
            "Sid": "",
            "Effect": "Allow",
            "Principal": {
                "Service": "ecs-tasks.amazonaws.com"
            },
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Arguments for a role declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RoleArgs {
    pub assume_role_policy: String,
}

impl RoleArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert(
            "assume_role_policy".to_string(),
            Value::String(self.assume_role_policy),
        );
        properties
    }
}

/// Arguments for attaching a managed policy to a role
#[derive(Debug, Clone, PartialEq)]
pub struct RolePolicyAttachmentArgs {
    pub role: Value,
    pub policy_arn: String,
}

impl RolePolicyAttachmentArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("role".to_string(), self.role);
        properties.insert("policy_arn".to_string(), Value::String(self.policy_arn));
        properties
    }
}
