//! Pod and container helpers shared by the Ray controllers

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec};
use kube::ResourceExt;
use tracing::warn;

use crate::{Error, Result, DEFAULT_NAMESPACE};

/// Pod phase: accepted by the cluster, containers not all started yet
pub const POD_PHASE_PENDING: &str = "Pending";
/// Pod phase: bound to a node with all containers created
pub const POD_PHASE_RUNNING: &str = "Running";
/// Pod phase: all containers exited successfully
pub const POD_PHASE_SUCCEEDED: &str = "Succeeded";
/// Pod phase: all containers exited, at least one in failure
pub const POD_PHASE_FAILED: &str = "Failed";

/// The pod's phase, if the API server has reported one
pub fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .filter(|p| !p.is_empty())
}

/// Returns true if the pod has been created and is maintained by the API server
pub fn is_created(pod: &Pod) -> bool {
    pod_phase(pod).is_some()
}

/// Returns true if the pod is in the `Running` phase
pub fn is_running(pod: &Pod) -> bool {
    pod_phase(pod) == Some(POD_PHASE_RUNNING)
}

/// Returns true if the pod is marked for deletion
pub fn is_terminating(pod: &Pod) -> bool {
    pod.metadata.deletion_timestamp.is_some()
}

/// Returns true if every pod in the list is running (vacuously true when empty)
pub fn all_pods_running(pods: &[Pod]) -> bool {
    pods.iter().all(is_running)
}

/// Find a container by name
pub fn find_container_by_name<'a>(containers: &'a [Container], name: &str) -> Result<&'a Container> {
    containers
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| Error::container_not_found(name))
}

/// Index of the Ray container in a pod spec.
///
/// Prefers the container named `preferred`; otherwise falls back to the first
/// container, warning when sidecars make that choice ambiguous.
pub fn ray_container_index(spec: &PodSpec, preferred: Option<&str>) -> usize {
    if let Some(name) = preferred {
        if let Some(idx) = spec.containers.iter().position(|c| c.name == name) {
            return idx;
        }
    }
    if spec.containers.len() > 1 {
        warn!(
            containers = spec.containers.len(),
            "pod has multiple containers, using index 0 as the Ray container"
        );
    }
    0
}

/// Namespace of an object, `default` when unset
pub fn namespace_or_default<K: ResourceExt>(obj: &K) -> String {
    obj.namespace()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

/// Service account for the head pod: the template's, or the cluster name
pub fn head_service_account_name(head_template: &PodTemplateSpec, cluster_name: &str) -> String {
    head_template
        .spec
        .as_ref()
        .and_then(|s| s.service_account_name.as_deref())
        .filter(|sa| !sa.is_empty())
        .unwrap_or(cluster_name)
        .to_string()
}

/// Membership test over an unsorted list of names
pub fn contains_name<S: AsRef<str>>(names: &[S], term: &str) -> bool {
    names.iter().any(|n| n.as_ref() == term)
}
