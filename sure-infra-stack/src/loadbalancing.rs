//! Load balancing: balancer, target groups, certificate and listeners

use sure_infra_aws::acm::{self, CertificateArgs};
use sure_infra_aws::lb::{
    self, ListenerAction, ListenerArgs, LoadBalancerArgs, TargetGroupArgs,
};
use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;
use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::{ResourceId, Value};

use crate::access::AccessControl;
use crate::config::StackConfig;
use crate::network::Network;

/// Handles the workload declaration needs from the load-balancing layer
#[derive(Debug, Clone)]
pub struct LoadBalancing {
    pub dns_name: OutputRef,
    pub http_target_group_arn: OutputRef,
    /// The secure listener's id, for the service's explicit ordering
    /// dependency
    pub https_listener: ResourceId,
}

/// Declare the load balancer, both target groups, the certificate and
/// both listeners
pub fn declare_load_balancing(
    ctx: &mut StackContext,
    config: &StackConfig,
    network: &Network,
    access: &AccessControl,
) -> StackResult<LoadBalancing> {
    let balancer = ctx.declare(
        lb::LOAD_BALANCER,
        "sure-lb",
        LoadBalancerArgs {
            subnets: Value::Ref(network.subnet_ids),
            security_groups: vec![Value::Ref(access.security_group_id)],
        }
        .into_properties(),
    )?;
    let balancer_arn = ctx.output(&balancer, "arn");
    let dns_name = ctx.output(&balancer, "dns_name");

    let http_tg = ctx.declare(
        lb::TARGET_GROUP,
        "web-tg",
        TargetGroupArgs {
            port: 80,
            protocol: "HTTP".to_string(),
            target_type: "ip".to_string(),
            vpc_id: Value::Ref(network.vpc_id),
        }
        .into_properties(),
    )?;
    let http_target_group_arn = ctx.output(&http_tg, "arn");

    // Declared with protocol HTTP on port 443 and never wired to a
    // listener; kept to reproduce the deployed topology exactly.
    ctx.declare(
        lb::TARGET_GROUP,
        "web-tg-https",
        TargetGroupArgs {
            port: 443,
            protocol: "HTTP".to_string(),
            target_type: "ip".to_string(),
            vpc_id: Value::Ref(network.vpc_id),
        }
        .into_properties(),
    )?;

    // DNS validation is requested; no validation record or completion
    // wait follows, so the secure listener may reference an unvalidated
    // certificate.
    let certificate = ctx.declare(
        acm::CERTIFICATE,
        "oracle-cert",
        CertificateArgs::dns_validated(config.domain.clone()).into_properties(),
    )?;
    let certificate_arn = ctx.output(&certificate, "arn");

    ctx.declare(
        lb::LISTENER,
        "http-listener",
        ListenerArgs {
            load_balancer_arn: Value::Ref(balancer_arn),
            port: 80,
            protocol: None,
            ssl_policy: None,
            certificate_arn: None,
            default_actions: vec![ListenerAction::https_redirect()],
        }
        .into_properties(),
    )?;

    let https_listener = ctx.declare(
        lb::LISTENER,
        "https-listener",
        ListenerArgs {
            load_balancer_arn: Value::Ref(balancer_arn),
            port: 443,
            protocol: Some("HTTPS".to_string()),
            ssl_policy: Some(lb::DEFAULT_SSL_POLICY.to_string()),
            certificate_arn: Some(Value::Ref(certificate_arn)),
            default_actions: vec![ListenerAction::forward(Value::Ref(http_target_group_arn))],
        }
        .into_properties(),
    )?;

    Ok(LoadBalancing {
        dns_name,
        http_target_group_arn,
        https_listener: https_listener.id().clone(),
    })
}
