//! Pod drift detection
//!
//! A running pod has drifted when its containers no longer match the pod
//! template it was created from: containers added or removed, an image
//! changed, or resource requests/limits changed in value. The reconciler
//! deletes drifted pods so they are recreated from the current template.
//!
//! Pods that are not `Running`, or that are already being deleted, are never
//! judged: their spec may still be settling.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use tracing::debug;

use crate::pod::{is_running, is_terminating};
use crate::quantity::quantities_equal;

/// Which resource list of a container a drift was found in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// `resources.requests`
    Requests,
    /// `resources.limits`
    Limits,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requests => write!(f, "requests"),
            Self::Limits => write!(f, "limits"),
        }
    }
}

/// Why a pod no longer matches its template
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Drift {
    /// The pod has a different number of containers than the template
    ContainerCount {
        /// Containers in the template
        desired: usize,
        /// Containers in the pod
        observed: usize,
    },
    /// A template container is missing from the pod
    MissingContainer {
        /// Name of the missing container
        container: String,
    },
    /// A container runs a different image
    Image {
        /// Container name
        container: String,
        /// Image in the template
        desired: Option<String>,
        /// Image in the pod
        observed: Option<String>,
    },
    /// A container has a different number of request or limit entries
    ResourceEntryCount {
        /// Container name
        container: String,
        /// Requests or limits
        kind: ResourceKind,
        /// Entries in the template
        desired: usize,
        /// Entries in the pod
        observed: usize,
    },
    /// A resource is missing or has a different amount
    Quantity {
        /// Container name
        container: String,
        /// Requests or limits
        kind: ResourceKind,
        /// Resource name (e.g. "cpu")
        resource: String,
        /// Amount in the template
        desired: String,
        /// Amount in the pod, `None` if the resource is absent
        observed: Option<String>,
    },
    /// The pod has a container the template does not declare
    UnexpectedContainer {
        /// Name of the extra container
        container: String,
    },
}

impl std::fmt::Display for Drift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContainerCount { desired, observed } => {
                write!(f, "container count {} != {}", observed, desired)
            }
            Self::MissingContainer { container } => {
                write!(f, "container {} not found in pod", container)
            }
            Self::Image {
                container,
                desired,
                observed,
            } => write!(
                f,
                "container {} image {} != {}",
                container,
                observed.as_deref().unwrap_or("<none>"),
                desired.as_deref().unwrap_or("<none>")
            ),
            Self::ResourceEntryCount {
                container,
                kind,
                desired,
                observed,
            } => write!(
                f,
                "container {} has {} {} entries, template has {}",
                container, observed, kind, desired
            ),
            Self::Quantity {
                container,
                kind,
                resource,
                desired,
                observed,
            } => write!(
                f,
                "container {} {}.{} {} != {}",
                container,
                kind,
                resource,
                observed.as_deref().unwrap_or("<none>"),
                desired
            ),
            Self::UnexpectedContainer { container } => {
                write!(f, "container {} not in template", container)
            }
        }
    }
}

/// Returns true if a running pod no longer matches the template
pub fn has_drifted(pod: &Pod, template: &PodTemplateSpec) -> bool {
    match detect_drift(pod, template) {
        Some(drift) => {
            debug!(pod = %pod.name_any(), reason = %drift, "pod does not match template");
            true
        }
        None => false,
    }
}

/// Find the first difference between a running pod and its template.
///
/// Returns `None` when the pod matches, or when it is not `Running` or is
/// being deleted.
pub fn detect_drift(pod: &Pod, template: &PodTemplateSpec) -> Option<Drift> {
    if !is_running(pod) || is_terminating(pod) {
        return None;
    }

    let desired = template
        .spec
        .as_ref()
        .map(|s| s.containers.as_slice())
        .unwrap_or_default();
    let observed = pod
        .spec
        .as_ref()
        .map(|s| s.containers.as_slice())
        .unwrap_or_default();

    if desired.len() != observed.len() {
        return Some(Drift::ContainerCount {
            desired: desired.len(),
            observed: observed.len(),
        });
    }

    let mut by_name: BTreeMap<&str, &Container> =
        observed.iter().map(|c| (c.name.as_str(), c)).collect();

    for want in desired {
        let Some(have) = by_name.remove(want.name.as_str()) else {
            return Some(Drift::MissingContainer {
                container: want.name.clone(),
            });
        };
        if let Some(drift) = compare_containers(want, have) {
            return Some(drift);
        }
    }

    // Unreachable after the count check: equal counts and one removal per
    // desired name leave no keys, and a repeated name fails above first.
    by_name
        .into_keys()
        .next()
        .map(|name| Drift::UnexpectedContainer {
            container: name.to_string(),
        })
}

fn compare_containers(want: &Container, have: &Container) -> Option<Drift> {
    if want.image != have.image {
        return Some(Drift::Image {
            container: want.name.clone(),
            desired: want.image.clone(),
            observed: have.image.clone(),
        });
    }

    let want_lists = resource_lists(want);
    let have_lists = resource_lists(have);

    for ((kind, want_list), (_, have_list)) in want_lists.iter().zip(have_lists.iter()) {
        if want_list.len() != have_list.len() {
            return Some(Drift::ResourceEntryCount {
                container: want.name.clone(),
                kind: *kind,
                desired: want_list.len(),
                observed: have_list.len(),
            });
        }
    }

    for ((kind, want_list), (_, have_list)) in want_lists.iter().zip(have_lists.iter()) {
        for (resource, want_qty) in want_list.iter() {
            match have_list.get(resource) {
                Some(have_qty) if quantities_equal(want_qty, have_qty) => {}
                other => {
                    return Some(Drift::Quantity {
                        container: want.name.clone(),
                        kind: *kind,
                        resource: resource.clone(),
                        desired: want_qty.0.clone(),
                        observed: other.map(|q| q.0.clone()),
                    });
                }
            }
        }
    }

    None
}

type ResourceList = BTreeMap<String, Quantity>;

fn resource_lists(container: &Container) -> [(ResourceKind, ResourceList); 2] {
    let resources = container.resources.as_ref();
    let requests = resources.and_then(|r| r.requests.clone()).unwrap_or_default();
    let limits = resources.and_then(|r| r.limits.clone()).unwrap_or_default();
    [
        (ResourceKind::Requests, requests),
        (ResourceKind::Limits, limits),
    ]
}
