//! sure-infra stack
//!
//! The sure-oracle topology: a fixed sequence of resource declarations
//! with explicit dependency wiring. Control flow is strictly linear; the
//! engine derives the actual creation order from the reference graph the
//! sequence builds up.

pub mod access;
pub mod config;
pub mod identity;
pub mod loadbalancing;
pub mod network;
pub mod registry;
pub mod workload;

use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;

use crate::config::StackConfig;

/// Declare the whole topology into a fresh context
pub fn declare_stack(ctx: &mut StackContext, config: &StackConfig) -> StackResult<()> {
    let network = network::lookup_network(ctx)?;
    let access = access::declare_access_control(ctx, &network)?;
    let lb = loadbalancing::declare_load_balancing(ctx, config, &network, &access)?;
    let identity = identity::declare_execution_role(ctx)?;
    let pipeline = registry::declare_image_pipeline(ctx, config)?;
    workload::declare_workload(ctx, config, &network, &access, &lb, &identity, &pipeline)?;
    Ok(())
}
