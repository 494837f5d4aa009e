//! Workload: cluster, task definition and the running service

use sure_infra_aws::ecs::{
    self, LoadBalancerBinding, NetworkConfiguration, ServiceArgs, TaskDefinitionArgs,
    container_definitions,
};
use sure_infra_core::context::{DeclareOptions, StackContext};
use sure_infra_core::error::StackResult;
use sure_infra_core::resource::Value;

use crate::access::AccessControl;
use crate::config::StackConfig;
use crate::identity::Identity;
use crate::loadbalancing::LoadBalancing;
use crate::network::Network;
use crate::registry::ImagePipeline;

/// Declare the cluster, task definition and service, and register the
/// cluster and endpoint exports
pub fn declare_workload(
    ctx: &mut StackContext,
    config: &StackConfig,
    network: &Network,
    access: &AccessControl,
    lb: &LoadBalancing,
    identity: &Identity,
    pipeline: &ImagePipeline,
) -> StackResult<()> {
    let cluster = ctx.declare(
        ecs::CLUSTER,
        "sure-cluster",
        std::collections::HashMap::new(),
    )?;
    let cluster_id = ctx.output(&cluster, "id");
    let cluster_arn = ctx.output(&cluster, "arn");
    ctx.export("sure-ecs", cluster_id)?;

    let container_name = config.container_name.clone();
    let container_port = config.container_port;
    let container_spec = ctx.apply(
        "container-definitions",
        Value::Ref(pipeline.image_name),
        move |image| {
            let image = image
                .as_str()
                .ok_or_else(|| format!("resolved image name is not a string: {:?}", image))?;
            let spec = container_definitions(&container_name, image, container_port)?;
            Ok(Value::String(spec))
        },
    )?;

    let task = ctx.declare(
        ecs::TASK_DEFINITION,
        "sure-task",
        TaskDefinitionArgs {
            family: config.task_family.clone(),
            cpu: config.cpu.clone(),
            memory: config.memory.clone(),
            network_mode: "awsvpc".to_string(),
            requires_compatibilities: vec!["FARGATE".to_string()],
            execution_role_arn: Value::Ref(identity.role_arn),
            container_definitions: Value::Ref(container_spec),
        }
        .into_properties(),
    )?;
    let task_arn = ctx.output(&task, "arn");
    ctx.export("cluster", cluster_arn)?;

    ctx.declare_with(
        ecs::SERVICE,
        "sure-svc",
        ServiceArgs {
            cluster: Value::Ref(cluster_id),
            desired_count: config.desired_count,
            launch_type: "FARGATE".to_string(),
            task_definition: Value::Ref(task_arn),
            network_configuration: NetworkConfiguration {
                assign_public_ip: true,
                subnets: Value::Ref(network.subnet_ids),
                security_groups: vec![Value::Ref(access.security_group_id)],
            },
            load_balancers: vec![LoadBalancerBinding {
                target_group_arn: Value::Ref(lb.http_target_group_arn),
                container_name: config.container_name.clone(),
                container_port: i64::from(config.container_port),
            }],
        }
        .into_properties(),
        DeclareOptions::new()
            .depends_on(cluster.id().clone())
            .depends_on(lb.https_listener.clone()),
    )?;

    ctx.export("url", lb.dns_name)?;
    Ok(())
}
