//! Desired-state types embedded in the RayCluster and RayService CRDs
//!
//! The CRDs themselves are owned by the operator; these are the fragments the
//! comparison and translation logic reads. Serve configuration blobs
//! (`userConfig`, `autoscalingConfig`, `runtimeEnv`, `resources`) stay as raw
//! serialized text here and are decoded when the request to the dashboard is
//! built.

use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Node Type
// =============================================================================

/// Role of a Ray node within a cluster
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RayNodeType {
    /// The single head node running GCS and the dashboard
    Head,
    /// A worker node belonging to a worker group
    #[default]
    Worker,
}

impl std::fmt::Display for RayNodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

// =============================================================================
// Worker Groups
// =============================================================================

/// A group of worker pods sharing a template and a replica policy
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerGroupSpec {
    /// Name of the group, used in pod names and labels
    #[serde(default)]
    pub group_name: String,

    /// Desired number of pods in this group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Lower bound the autoscaler may scale this group to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,

    /// Upper bound the autoscaler may scale this group to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,

    /// Pod template for the group's workers
    #[serde(default)]
    pub template: PodTemplateSpec,
}

// =============================================================================
// Serve Deployment Graph
// =============================================================================

/// Desired Ray Serve deployment graph of a RayService
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServeDeploymentGraphSpec {
    /// Python import path of the application entrypoint
    pub import_path: String,

    /// Application runtime environment, as YAML or JSON text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime_env: String,

    /// Deployments making up the graph, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serve_configs: Vec<ServeConfigSpec>,
}

/// Desired state of a single Serve deployment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServeConfigSpec {
    /// Deployment name
    pub name: String,

    /// Number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_replicas: Option<i32>,

    /// HTTP route prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_prefix: Option<String>,

    /// Maximum number of in-flight queries per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_queries: Option<i32>,

    /// User config passed to the deployment's `reconfigure`, as YAML or JSON text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_config: String,

    /// Serve autoscaling config, as YAML or JSON text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub autoscaling_config: String,

    /// Seconds between checks while waiting for queries to drain on shutdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graceful_shutdown_wait_loop_s: Option<i32>,

    /// Seconds before a shutting-down replica is force-killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graceful_shutdown_timeout_s: Option<i32>,

    /// Seconds between replica health checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_period_s: Option<i32>,

    /// Seconds before a health check is considered failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_timeout_s: Option<i32>,

    /// Options for the actors backing each replica
    #[serde(default)]
    pub ray_actor_options: RayActorOptionSpec,
}

/// Desired actor options of a Serve deployment's replicas
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RayActorOptionSpec {
    /// Actor runtime environment, as YAML or JSON text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime_env: String,

    /// CPUs reserved per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<f64>,

    /// GPUs reserved per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_gpus: Option<f64>,

    /// Heap memory in bytes reserved per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,

    /// Object store memory in bytes reserved per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store_memory: Option<i64>,

    /// Custom resources, as YAML or JSON text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resources: String,

    /// Required accelerator type (e.g. "V100")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_type: Option<String>,
}

// =============================================================================
// Serve Status
// =============================================================================

/// Application is running and all deployments are healthy
pub const APP_STATUS_RUNNING: &str = "RUNNING";
/// Application is being deployed
pub const APP_STATUS_DEPLOYING: &str = "DEPLOYING";
/// Application failed to deploy
pub const APP_STATUS_DEPLOY_FAILED: &str = "DEPLOY_FAILED";
/// No application has been deployed yet
pub const APP_STATUS_NOT_STARTED: &str = "NOT_STARTED";
/// Application is being deleted
pub const APP_STATUS_DELETING: &str = "DELETING";

/// Deployment replicas are all healthy
pub const DEPLOYMENT_STATUS_HEALTHY: &str = "HEALTHY";
/// Deployment is rolling out a new version
pub const DEPLOYMENT_STATUS_UPDATING: &str = "UPDATING";
/// Deployment has failing replicas
pub const DEPLOYMENT_STATUS_UNHEALTHY: &str = "UNHEALTHY";

/// Application-level status reported by the Serve dashboard
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    /// Status string (e.g. "RUNNING")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Human readable detail, usually set on failure
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// When the operator last changed this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<Time>,

    /// When the operator last saw this status as healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_last_update_time: Option<Time>,
}

impl AppStatus {
    /// Returns true if the application is running
    pub fn is_running(&self) -> bool {
        self.status == APP_STATUS_RUNNING
    }
}

/// Status of a single Serve deployment reported by the dashboard
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServeDeploymentStatus {
    /// Deployment name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Status string (e.g. "HEALTHY")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Human readable detail, usually set on failure
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// When the operator last changed this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<Time>,

    /// When the operator last saw this status as healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_last_update_time: Option<Time>,
}

impl ServeDeploymentStatus {
    /// Returns true if the deployment reports healthy
    pub fn is_healthy(&self) -> bool {
        self.status == DEPLOYMENT_STATUS_HEALTHY
    }
}
