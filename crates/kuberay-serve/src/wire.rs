//! Request and response bodies of the Ray dashboard Serve API
//!
//! Field names are the dashboard's snake_case names. Unset options and empty
//! maps are omitted from request bodies rather than sent as `null`.

use std::collections::BTreeMap;

use kuberay_common::crd::{AppStatus, ServeDeploymentStatus};
use serde::{Deserialize, Deserializer, Serialize};

/// Decoded configuration mapping (user config, autoscaling, runtime env, resources)
pub type ConfigMapping = BTreeMap<String, serde_json::Value>;

/// Body of `PUT /api/serve/deployments/`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ServingClusterDeployments {
    /// Python import path of the application entrypoint
    pub import_path: String,

    /// Application runtime environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime_env: ConfigMapping,

    /// Deployments, in the order declared
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<ServeConfig>,
}

/// A single deployment as the dashboard expects it
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ServeConfig {
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

    /// User config
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_config: ConfigMapping,

    /// Autoscaling config
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub autoscaling_config: ConfigMapping,

    /// Seconds between drain checks on shutdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graceful_shutdown_wait_loop_s: Option<i32>,

    /// Seconds before a shutting-down replica is force-killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graceful_shutdown_timeout_s: Option<i32>,

    /// Seconds between health checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_period_s: Option<i32>,

    /// Seconds before a health check fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_timeout_s: Option<i32>,

    /// Replica actor options; always sent, possibly as `{}`
    #[serde(default)]
    pub ray_actor_options: RayActorOptions,
}

/// Replica actor options as the dashboard expects them
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RayActorOptions {
    /// Actor runtime environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime_env: ConfigMapping,

    /// CPUs per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<f64>,

    /// GPUs per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_gpus: Option<f64>,

    /// Heap memory in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,

    /// Object store memory in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store_memory: Option<i64>,

    /// Custom resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: ConfigMapping,

    /// Required accelerator type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_type: Option<String>,
}

/// Body of `GET /api/serve/deployments/status`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ServeDeploymentStatuses {
    /// Application-level status
    #[serde(default, deserialize_with = "null_as_default")]
    pub app_status: AppStatus,

    /// Per-deployment statuses
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deployment_statuses: Vec<ServeDeploymentStatus>,
}

/// The dashboard sends `null` for an empty list or an unset status
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ServeDeploymentStatuses {
    /// Look up the status of a deployment by name
    pub fn deployment(&self, name: &str) -> Option<&ServeDeploymentStatus> {
        self.deployment_statuses.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let config = ServeConfig {
            name: "MangoStand".to_string(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"name": "MangoStand", "ray_actor_options": {}})
        );
    }

    #[test]
    fn statuses_decode_dashboard_response() {
        let body = json!({
            "app_status": {"status": "RUNNING", "message": "", "deployment_timestamp": 1655430221.1},
            "deployment_statuses": [
                {"name": "shallow", "status": "HEALTHY", "message": ""},
                {"name": "deep", "status": "UPDATING", "message": "starting replicas"}
            ]
        });
        let statuses: ServeDeploymentStatuses = serde_json::from_value(body).unwrap();

        assert!(statuses.app_status.is_running());
        assert_eq!(statuses.deployment_statuses.len(), 2);
        assert!(statuses.deployment("shallow").unwrap().is_healthy());
        assert_eq!(statuses.deployment("deep").unwrap().message, "starting replicas");
        assert!(statuses.deployment("missing").is_none());
    }

    #[test]
    fn null_deployment_statuses_decode_as_empty() {
        let statuses: ServeDeploymentStatuses = serde_json::from_str(
            r#"{"app_status": {"status": "RUNNING"}, "deployment_statuses": null}"#,
        )
        .unwrap();
        assert!(statuses.app_status.is_running());
        assert!(statuses.deployment_statuses.is_empty());
    }

    #[test]
    fn null_app_status_decodes_as_default() {
        let statuses: ServeDeploymentStatuses = serde_json::from_str(
            r#"{"app_status": null, "deployment_statuses": [{"name": "shallow", "status": "HEALTHY"}]}"#,
        )
        .unwrap();
        assert_eq!(statuses.app_status, AppStatus::default());
        assert!(statuses.deployment("shallow").unwrap().is_healthy());
    }

    #[test]
    fn empty_status_body_decodes_to_defaults() {
        let statuses: ServeDeploymentStatuses = serde_json::from_str("{}").unwrap();
        assert_eq!(statuses, ServeDeploymentStatuses::default());
    }
}
