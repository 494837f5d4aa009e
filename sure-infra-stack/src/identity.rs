//! Task execution identity: role and managed policy attachment

use sure_infra_aws::iam::{
    self, RoleArgs, RolePolicyAttachmentArgs, ecs_tasks_assume_role_policy,
};
use sure_infra_core::context::StackContext;
use sure_infra_core::error::StackResult;
use sure_infra_core::output::OutputRef;
use sure_infra_core::resource::Value;

/// The execution role handed to the task definition
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub role_arn: OutputRef,
}

/// Declare the execution role and attach the managed execution policy
pub fn declare_execution_role(ctx: &mut StackContext) -> StackResult<Identity> {
    let role = ctx.declare(
        iam::ROLE,
        "task-exec-role",
        RoleArgs {
            assume_role_policy: ecs_tasks_assume_role_policy(),
        }
        .into_properties(),
    )?;
    let role_arn = ctx.output(&role, "arn");
    let role_name = ctx.output(&role, "name");

    // The attachment binds by role name, not ARN.
    ctx.declare(
        iam::ROLE_POLICY_ATTACHMENT,
        "task-exec-policy",
        RolePolicyAttachmentArgs {
            role: Value::Ref(role_name),
            policy_arn: iam::ECS_TASK_EXECUTION_ROLE_POLICY.to_string(),
        }
        .into_properties(),
    )?;

    Ok(Identity { role_arn })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sure_infra_core::graph::DependencyGraph;
    use sure_infra_core::resource::ResourceId;

    #[test]
    fn attachment_depends_on_the_role() {
        let mut ctx = StackContext::new();
        declare_execution_role(&mut ctx).unwrap();

        let graph = DependencyGraph::from_context(&ctx);
        assert!(graph.depends_on(
            &ResourceId::new(iam::ROLE_POLICY_ATTACHMENT, "task-exec-policy"),
            &ResourceId::new(iam::ROLE, "task-exec-role"),
        ));
    }

    #[test]
    fn role_carries_the_ecs_trust_policy() {
        let mut ctx = StackContext::new();
        declare_execution_role(&mut ctx).unwrap();

        let role = ctx
            .get(&ResourceId::new(iam::ROLE, "task-exec-role"))
            .unwrap();
        let policy = match role.properties.get("assume_role_policy") {
            Some(Value::String(policy)) => policy,
            other => panic!("unexpected policy: {:?}", other),
        };
        assert!(policy.contains("ecs-tasks.amazonaws.com"));
        assert!(policy.contains("2008-10-17"));
    }
}
