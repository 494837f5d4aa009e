//! EC2 lookups and security group arguments

use std::collections::HashMap;

use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::Value;

pub const VPC: &str = "ec2.vpc";
pub const SUBNETS: &str = "ec2.subnets";
pub const SECURITY_GROUP: &str = "ec2.security_group";

/// Properties for looking up the account's default VPC
pub fn default_vpc_properties() -> HashMap<String, Value> {
    let mut properties = HashMap::new();
    properties.insert("default".to_string(), Value::Bool(true));
    properties
}

/// Properties for listing the subnets of a VPC, filtered by vpc-id
pub fn subnets_in_vpc(vpc_id: OutputRef) -> HashMap<String, Value> {
    let filter = Value::map([
        ("name", Value::from("vpc-id")),
        ("values", Value::list([Value::Ref(vpc_id)])),
    ]);
    let mut properties = HashMap::new();
    properties.insert("filters".to_string(), Value::list([filter]));
    properties
}

/// One ingress or egress rule of a security group
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub from_port: i64,
    pub to_port: i64,
    pub cidr_blocks: Vec<String>,
}

impl SecurityGroupRule {
    /// All protocols, all ports, any destination
    pub fn all_traffic() -> Self {
        Self {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: 0,
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }

    /// TCP on a single port, any source
    pub fn tcp_from_anywhere(port: i64) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }

    fn into_value(self) -> Value {
        Value::map([
            ("protocol", Value::String(self.protocol)),
            ("from_port", Value::Int(self.from_port)),
            ("to_port", Value::Int(self.to_port)),
            (
                "cidr_blocks",
                Value::list(self.cidr_blocks.into_iter().map(Value::String)),
            ),
        ])
    }
}

/// Arguments for a security group declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroupArgs {
    pub vpc_id: Value,
    pub ingress: Vec<SecurityGroupRule>,
    pub egress: Vec<SecurityGroupRule>,
}

impl SecurityGroupArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("vpc_id".to_string(), self.vpc_id);
        properties.insert(
            "ingress".to_string(),
            Value::list(self.ingress.into_iter().map(SecurityGroupRule::into_value)),
        );
        properties.insert(
            "egress".to_string(),
            Value::list(self.egress.into_iter().map(SecurityGroupRule::into_value)),
        );
        properties
    }
}
