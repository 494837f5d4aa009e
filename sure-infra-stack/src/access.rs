//! Access control: the shared web security group

use sure_infra_aws::ec2::{self, SecurityGroupArgs, SecurityGroupRule};
use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;
use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::Value;

use crate::network::Network;

/// Handle to the access-control policy
#[derive(Debug, Clone, Copy)]
pub struct AccessControl {
    pub security_group_id: OutputRef,
}

/// Declare the security group shared by the load balancer and the service
///
/// Egress is fully open; ingress is limited to TCP 80 and 443 from any
/// source.
pub fn declare_access_control(
    ctx: &mut StackContext,
    network: &Network,
) -> StackResult<AccessControl> {
    let args = SecurityGroupArgs {
        vpc_id: Value::Ref(network.vpc_id),
        ingress: vec![
            SecurityGroupRule::tcp_from_anywhere(80),
            SecurityGroupRule::tcp_from_anywhere(443),
        ],
        egress: vec![SecurityGroupRule::all_traffic()],
    };
    let sg = ctx.declare(ec2::SECURITY_GROUP, "web-sg", args.into_properties())?;
    let security_group_id = ctx.output(&sg, "id");

    Ok(AccessControl { security_group_id })
}
