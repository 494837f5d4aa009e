//! Image build-and-push arguments

use std::collections::HashMap;

use sure_infra_core::resource::Value;

pub const IMAGE: &str = "docker.image";

/// Build context and build file for an image
#[derive(Debug, Clone, PartialEq)]
pub struct DockerBuild {
    pub context: String,
    pub dockerfile: String,
}

impl DockerBuild {
    fn into_value(self) -> Value {
        Value::map([
            ("context", Value::String(self.context)),
            ("dockerfile", Value::String(self.dockerfile)),
        ])
    }
}

/// Arguments for building an image and pushing it to a registry
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArgs {
    pub build: DockerBuild,
    /// Target name, usually the repository URL (deferred)
    pub image_name: Value,
    /// Credential record {server, username, password} (deferred)
    pub registry: Value,
}

impl ImageArgs {
    pub fn into_properties(self) -> HashMap<String, Value> {
        let mut properties = HashMap::new();
        properties.insert("build".to_string(), self.build.into_value());
        properties.insert("image_name".to_string(), self.image_name);
        properties.insert("registry".to_string(), self.registry);
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_properties_nest_the_build_block() {
        let properties = ImageArgs {
            build: DockerBuild {
                context: "../".to_string(),
                dockerfile: "../dockerfile.oracle".to_string(),
            },
            image_name: Value::from("repo-url"),
            registry: Value::from("credentials"),
        }
        .into_properties();

        match properties.get("build") {
            Some(Value::Map(build)) => {
                assert_eq!(build.get("context"), Some(&Value::from("../")));
                assert_eq!(
                    build.get("dockerfile"),
                    Some(&Value::from("../dockerfile.oracle"))
                );
            }
            other => panic!("unexpected build: {:?}", other),
        }
    }
}
