//! Cluster-level replica aggregation over worker groups

use k8s_openapi::api::core::v1::Pod;

use crate::crd::WorkerGroupSpec;
use crate::pod::{pod_phase, POD_PHASE_PENDING, POD_PHASE_RUNNING};

/// Sum of desired worker replicas across all groups
pub fn desired_replicas(groups: &[WorkerGroupSpec]) -> i32 {
    sum_by(groups, |g| g.replicas)
}

/// Sum of minimum worker replicas across all groups
pub fn min_replicas(groups: &[WorkerGroupSpec]) -> i32 {
    sum_by(groups, |g| g.min_replicas)
}

/// Sum of maximum worker replicas across all groups
pub fn max_replicas(groups: &[WorkerGroupSpec]) -> i32 {
    sum_by(groups, |g| g.max_replicas)
}

/// Number of pods that are pending or running
pub fn available_replicas(pods: &[Pod]) -> i32 {
    let count = pods
        .iter()
        .filter(|p| matches!(pod_phase(p), Some(POD_PHASE_PENDING | POD_PHASE_RUNNING)))
        .count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Unset counts contribute zero; negative counts are treated as zero.
fn sum_by(groups: &[WorkerGroupSpec], field: impl Fn(&WorkerGroupSpec) -> Option<i32>) -> i32 {
    groups
        .iter()
        .map(|g| field(g).unwrap_or(0).max(0))
        .fold(0i32, i32::saturating_add)
}
