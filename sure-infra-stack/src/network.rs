//! Network lookup: default VPC and its subnets

use sure_infra_aws::ec2;
use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;
use sure_infra_core::output::OutputRef;

/// Handles to the resolved network
#[derive(Debug, Clone, Copy)]
pub struct Network {
    pub vpc_id: OutputRef,
    pub subnet_ids: OutputRef,
}

/// Look up the account's default VPC and list its subnets
///
/// Both are data sources; a failed lookup aborts the whole pass.
pub fn lookup_network(ctx: &mut StackContext) -> StackResult<Network> {
    let vpc = ctx.lookup(ec2::VPC, "default", ec2::default_vpc_properties())?;
    let vpc_id = ctx.output(&vpc, "id");

    let subnets = ctx.lookup(ec2::SUBNETS, "default", ec2::subnets_in_vpc(vpc_id))?;
    let subnet_ids = ctx.output(&subnets, "ids");

    Ok(Network { vpc_id, subnet_ids })
}
