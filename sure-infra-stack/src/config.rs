//! Fixed configuration constants of the topology

/// Configuration of the sure-oracle stack
///
/// Defaults match the deployed topology; overriding them changes names
/// and counts, not the shape of the declaration graph.
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// Domain the TLS certificate is requested for
    pub domain: String,
    /// Container name shared by the task definition and the service's
    /// load-balancer binding; the two must match exactly
    pub container_name: String,
    /// Port the container listens on
    pub container_port: u16,
    /// Task definition family
    pub task_family: String,
    /// Task CPU units, as the string form the task definition expects
    pub cpu: String,
    /// Task memory (MiB), string form
    pub memory: String,
    /// Number of service replicas
    pub desired_count: i64,
    /// Image build context directory
    pub build_context: String,
    /// Build file path
    pub dockerfile: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            domain: "sure.claims".to_string(),
            container_name: "sure-oracle".to_string(),
            container_port: 80,
            task_family: "fargate-task-definition".to_string(),
            cpu: "256".to_string(),
            memory: "512".to_string(),
            desired_count: 5,
            build_context: "../".to_string(),
            dockerfile: "../dockerfile.oracle".to_string(),
        }
    }
}
