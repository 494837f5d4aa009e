//! Load balancer, target group and listener arguments

use std::collections::HashMap;

use sure_infra_core::resource::Value;

pub const LOAD_BALANCER: &str = "lb.load_balancer";
pub const TARGET_GROUP: &str = "lb.target_group";
pub const LISTENER: &str = "lb.listener";

/// TLS policy applied to HTTPS listeners
pub const DEFAULT_SSL_POLICY: &str = "ELBSecurityPolicy-2016-08";

/// Arguments for a load balancer declaration
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerArgs {
    pub subnets: Value,
    pub security_groups: Vec<Value>,
}

impl LoadBalancerArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("subnets".to_string(), self.subnets);
        properties.insert(
            "security_groups".to_string(),
            Value::list(self.security_groups),
        );
        properties
    }
}

/// Arguments for a target group declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGroupArgs {
    pub port: i64,
    pub protocol: String,
    pub target_type: String,
    pub vpc_id: Value,
}

impl TargetGroupArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("port".to_string(), Value::Int(self.port));
        properties.insert("protocol".to_string(), Value::String(self.protocol));
        properties.insert("target_type".to_string(), Value::String(self.target_type));
        properties.insert("vpc_id".to_string(), self.vpc_id);
        properties
    }
}

/// Default action of a listener
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerAction {
    /// Redirect to another protocol/port with a fixed status code
    Redirect {
        protocol: String,
        port: String,
        status_code: String,
    },
    /// Forward to a target group
    Forward { target_group_arn: Value },
}

impl ListenerAction {
    /// Permanent redirect to HTTPS on port 443
    pub fn https_redirect() -> Self {
        Self::Redirect {
            protocol: "HTTPS".to_string(),
            port: "443".to_string(),
            status_code: "HTTP_301".to_string(),
        }
    }

    pub fn forward(target_group_arn: Value) -> Self {
        Self::Forward { target_group_arn }
    }

    fn into_value(self) -> Value {
        match self {
            ListenerAction::Redirect {
                protocol,
                port,
                status_code,
            } => Value::map([
                ("type", Value::from("redirect")),
                (
                    "redirect",
                    Value::map([
                        ("protocol", Value::String(protocol)),
                        ("port", Value::String(port)),
                        ("status_code", Value::String(status_code)),
                    ]),
                ),
            ]),
            ListenerAction::Forward { target_group_arn } => Value::map([
                ("type", Value::from("forward")),
                ("target_group_arn", target_group_arn),
            ]),
        }
    }
}

/// Arguments for a listener declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerArgs {
    pub load_balancer_arn: Value,
    pub port: i64,
    pub protocol: Option<String>,
    pub ssl_policy: Option<String>,
    pub certificate_arn: Option<Value>,
    pub default_actions: Vec<ListenerAction>,
}

impl ListenerArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("load_balancer_arn".to_string(), self.load_balancer_arn);
        properties.insert("port".to_string(), Value::Int(self.port));
        if let Some(protocol) = self.protocol {
            properties.insert("protocol".to_string(), Value::String(protocol));
        }
        if let Some(ssl_policy) = self.ssl_policy {
            properties.insert("ssl_policy".to_string(), Value::String(ssl_policy));
        }
        if let Some(certificate_arn) = self.certificate_arn {
            properties.insert("certificate_arn".to_string(), certificate_arn);
        }
        properties.insert(
            "default_actions".to_string(),
            Value::list(
                self.default_actions
                    .into_iter()
                    .map(ListenerAction::into_value),
            ),
        );
        properties
    }
}
