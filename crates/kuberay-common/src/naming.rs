//! Resource naming for Ray clusters
//!
//! Generated pod, service and ingress names are derived from user-supplied
//! cluster names, which can be arbitrarily long or start with characters
//! Kubernetes rejects. The sanitizers here bring them into range; the
//! generators build the conventional names for the objects a Ray cluster owns.

use rand::Rng;
use tracing::debug;

use crate::crd::RayNodeType;

/// Maximum length of a sanitized resource name.
///
/// 63 minus room for the `-head-`/`-worker-` role suffix and the 5 character
/// disambiguator appended when pods are created.
pub const MAX_RESOURCE_NAME_LENGTH: usize = 50;

/// Maximum length of a Kubernetes label value
pub const MAX_LABEL_VALUE_LENGTH: usize = 63;

/// Infix between a RayService name and the random suffix of its RayCluster
pub const RAY_CLUSTER_SUFFIX: &str = "-raycluster-";

/// Name component used for the dashboard service and agent label
pub const DASHBOARD_NAME: &str = "dashboard";

/// Alphabet used for generated suffixes (no vowels, no ambiguous characters)
const SUFFIX_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Length of the random suffix appended to generated RayCluster names
const SUFFIX_LENGTH: usize = 5;

/// Character substituted for an invalid leading character
const LEADING_REPLACEMENT: char = 'r';

/// Sanitize a name used as the base of generated resource names.
///
/// Keeps the trailing 50 characters and replaces a leading digit or ASCII
/// punctuation character (symbols such as `$` and `~` included) with `r`.
/// Non-ASCII leading characters are kept. Empty input is returned unchanged.
pub fn sanitize_resource_name(name: &str) -> String {
    let truncated = keep_trailing(name, MAX_RESOURCE_NAME_LENGTH, "resource name");
    replace_leading(truncated, |c| {
        c.is_ascii_digit() || c.is_ascii_punctuation()
    })
}

/// Sanitize a label value.
///
/// Keeps the trailing 63 characters and replaces a leading punctuation
/// character with `r`. Label values may start with a digit.
pub fn sanitize_label_value(value: &str) -> String {
    let truncated = keep_trailing(value, MAX_LABEL_VALUE_LENGTH, "label value");
    replace_leading(truncated, |c| c.is_ascii_punctuation())
}

/// Drop characters from the front until at most `max` remain
fn keep_trailing<'a>(s: &'a str, max: usize, what: &str) -> &'a str {
    let len = s.chars().count();
    if len <= max {
        return s;
    }
    let offset = len - max;
    debug!(len, offset, kind = what, "name too long, shortening from the front");
    match s.char_indices().nth(offset) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Substitution leaves `r` in front, which passes both checks, so one pass is enough.
fn replace_leading(s: &str, invalid: impl Fn(char) -> bool) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if invalid(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(LEADING_REPLACEMENT);
            out.push_str(chars.as_str());
            out
        }
        _ => s.to_string(),
    }
}

/// Name of the head service of a cluster, e.g. `mycluster-head-svc`
pub fn head_service_name(cluster_name: &str) -> String {
    format!("{}-{}-svc", cluster_name, RayNodeType::Head)
}

/// Name of the dashboard service of a cluster, e.g. `mycluster-dashboard-svc`
pub fn dashboard_service_name(cluster_name: &str) -> String {
    format!("{}-{}-svc", cluster_name, DASHBOARD_NAME)
}

/// Label value selecting the dashboard agent of a cluster
pub fn dashboard_agent_label(cluster_name: &str) -> String {
    format!("{}-{}", cluster_name, DASHBOARD_NAME)
}

/// Name of the head ingress of a cluster, e.g. `mycluster-head-ingress`
pub fn head_ingress_name(cluster_name: &str) -> String {
    format!("{}-{}-ingress", cluster_name, RayNodeType::Head)
}

/// Identifier shared by all pods of one node type in a cluster
pub fn group_identifier(cluster_name: &str, node_type: RayNodeType) -> String {
    format!("{}-{}", cluster_name, node_type)
}

/// Generate the name of a RayCluster owned by a RayService.
///
/// Each call yields a fresh random suffix so a new cluster can be brought up
/// next to the one it replaces.
pub fn ray_cluster_name(service_name: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}{}{}", service_name, RAY_CLUSTER_SUFFIX, suffix)
}
