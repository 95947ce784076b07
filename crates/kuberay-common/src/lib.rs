//! Common types for KubeRay: desired-state types, pod drift detection,
//! replica aggregation, resource naming and quantity comparison

#![deny(missing_docs)]

pub mod crd;
pub mod drift;
pub mod equality;
pub mod error;
pub mod naming;
pub mod pod;
pub mod quantity;
pub mod replicas;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace used when an object does not carry one
pub const DEFAULT_NAMESPACE: &str = "default";
