//! Certificate request arguments

use std::collections::HashMap;

use sure_infra_core::resource::Value;

pub const CERTIFICATE: &str = "acm.certificate";

/// Arguments for a certificate request
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateArgs {
    pub domain_name: String,
    pub validation_method: String,
}

impl CertificateArgs {
    /// Request a DNS-validated certificate for a domain
    pub fn dns_validated(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            validation_method: "DNS".to_string(),
        }
    }

    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("domain_name".to_string(), Value::String(self.domain_name));
        properties.insert(
            "validation_method".to_string(),
            Value::String(self.validation_method),
        );
        properties
    }
}
