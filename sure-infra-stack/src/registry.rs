//! Image pipeline: repository, registry credentials and the image build

use sure_infra_aws::docker::{self, DockerBuild, ImageArgs};
use sure_infra_aws::ecr::{self, CredentialError, RegistryCredentials, credentials_for};
use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;
use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::Value;

use crate::config::StackConfig;

/// The built image, as the workload layer consumes it
#[derive(Debug, Clone, Copy)]
pub struct ImagePipeline {
    /// Fully qualified pushed image name (repository URL plus tag)
    pub image_name: OutputRef,
}

fn field_str(fields: &std::collections::HashMap<String, Value>, name: &'static str)
-> Result<String, CredentialError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CredentialError::MissingField(name))
}

/// Declare the repository, read its credentials, decode them and declare
/// the image build that pushes to it
pub fn declare_image_pipeline(
    ctx: &mut StackContext,
    config: &StackConfig,
) -> StackResult<ImagePipeline> {
    let repository = ctx.declare(
        ecr::REPOSITORY,
        &config.container_name,
        std::collections::HashMap::new(),
    )?;
    let registry_id = ctx.output(&repository, "registry_id");
    let repository_url = ctx.output(&repository, "repository_url");

    let credentials = ctx.lookup(
        ecr::CREDENTIALS,
        &config.container_name,
        credentials_for(registry_id),
    )?;
    let proxy_endpoint = ctx.output(&credentials, "proxy_endpoint");
    let authorization_token = ctx.output(&credentials, "authorization_token");

    let decoded = ctx.apply(
        "registry-credentials",
        Value::map([
            ("server", Value::Ref(proxy_endpoint)),
            ("authorization_token", Value::Ref(authorization_token)),
        ]),
        |input| {
            let fields = match input {
                Value::Map(fields) => fields,
                other => {
                    return Err(format!("credential input is not a map: {:?}", other).into());
                }
            };
            let server = field_str(&fields, "server")?;
            let token = field_str(&fields, "authorization_token")?;
            let credentials = RegistryCredentials::from_token(server, &token)?;
            Ok(credentials.into_value())
        },
    )?;

    let image = ctx.declare(
        docker::IMAGE,
        &config.container_name,
        ImageArgs {
            build: DockerBuild {
                context: config.build_context.clone(),
                dockerfile: config.dockerfile.clone(),
            },
            image_name: Value::Ref(repository_url),
            registry: Value::Ref(decoded),
        }
        .into_properties(),
    )?;
    let base_image_name = ctx.output(&image, "base_image_name");
    let image_name = ctx.output(&image, "image_name");

    ctx.export("baseImageName", base_image_name)?;
    ctx.export("fullImageName", image_name)?;

    Ok(ImagePipeline { image_name })
}
