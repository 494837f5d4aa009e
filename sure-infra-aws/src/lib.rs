//! sure-infra AWS arguments
//!
//! Typed argument builders for the AWS resources the sure-oracle topology
//! declares. Each builder renders into the property map a declaration
//! carries; engine-assigned attributes stay deferred output references.

pub mod acm;
pub mod docker;
pub mod ec2;
pub mod ecr;
pub mod ecs;
pub mod iam;
pub mod lb;
