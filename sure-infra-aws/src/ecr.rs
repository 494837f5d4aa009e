//! Container registry arguments and credential decoding
//!
//! The registry service issues a base64 authorization token that decodes
//! to `username:password`. Decoding is the one nontrivial local
//! computation of the whole declaration program.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::Value;
use thiserror::Error;

pub const REPOSITORY: &str = "ecr.repository";
pub const CREDENTIALS: &str = "ecr.credentials";

/// Errors decoding a registry authorization token
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token is not valid base64
    #[error("Invalid authorization token: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The decoded token is not valid UTF-8
    #[error("Authorization token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The decoded token does not split into exactly username and password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A field is missing from the credential record
    #[error("Missing credential field: {0}")]
    MissingField(&'static str),
}

/// Properties for the credentials data source of a registry
pub fn credentials_for(registry_id: OutputRef) -> HashMap<String, Value> {
    let mut properties = HashMap::new();
    properties.insert("registry_id".to_string(), Value::Ref(registry_id));
    properties
}

/// Decode a base64 authorization token into (username, password)
///
/// The decoded payload must split by `:` into exactly two parts; any
/// other count is rejected, including extra separators in the password.
pub fn decode_authorization_token(token: &str) -> Result<(String, String), CredentialError> {
    let decoded = String::from_utf8(STANDARD.decode(token)?)?;
    let parts: Vec<&str> = decoded.split(':').collect();
    if parts.len() != 2 {
        return Err(CredentialError::InvalidCredentials);
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Credentials for authenticating an image push to a registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryCredentials {
    pub server: String,
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    /// Build the credential record from a proxy endpoint and a base64
    /// authorization token
    pub fn from_token(
        server: impl Into<String>,
        token: &str,
    ) -> Result<Self, CredentialError> {
        let (username, password) = decode_authorization_token(token)?;
        Ok(Self {
            server: server.into(),
            username,
            password,
        })
    }

    pub fn into_value(self) -> Value {
        Value::map([
            ("server", Value::String(self.server)),
            ("username", Value::String(self.username)),
            ("password", Value::String(self.password)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(payload: &str) -> String {
        STANDARD.encode(payload)
    }

    #[test]
    fn decodes_username_and_password() {
        let (username, password) = decode_authorization_token(&encode("AWS:secretpass")).unwrap();
        assert_eq!(username, "AWS");
        assert_eq!(password, "secretpass");
    }

    #[test]
    fn payload_without_separator_is_invalid() {
        let err = decode_authorization_token(&encode("onlyoneword")).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn payload_with_extra_separators_is_invalid() {
        let err = decode_authorization_token(&encode("user:pass:extra")).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[test]
    fn empty_parts_still_count_as_two() {
        // ":" splits into two empty parts; the split-count rule accepts it.
        let (username, password) = decode_authorization_token(&encode(":")).unwrap();
        assert_eq!(username, "");
        assert_eq!(password, "");
    }

    #[test]
    fn garbage_base64_is_rejected() {
        let err = decode_authorization_token("%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, CredentialError::Decode(_)));
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let token = STANDARD.encode([0xff, 0xfe, b':', 0xfd]);
        let err = decode_authorization_token(&token).unwrap_err();
        assert!(matches!(err, CredentialError::Utf8(_)));
    }

    #[test]
    fn credential_record_keeps_proxy_endpoint_as_server() {
        let creds = RegistryCredentials::from_token(
            "https://123456789.dkr.ecr.us-east-1.amazonaws.com",
            &encode("AWS:secretpass"),
        )
        .unwrap();
        assert_eq!(creds.server, "https://123456789.dkr.ecr.us-east-1.amazonaws.com");
        assert_eq!(creds.username, "AWS");
        assert_eq!(creds.password, "secretpass");
    }
}
