//! Ray Serve integration for KubeRay
//!
//! Translates the RayService's desired deployment graph into the Ray
//! dashboard's Serve API format, pushes it, and reads deployment status back.
//! Retries and requeueing are left to the calling reconciler.

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod sync;
pub mod translate;
pub mod wire;

pub use client::{DashboardClient, DashboardClientProvider, HttpDashboardClient, HttpDashboardClientProvider};
pub use config::DashboardClientConfig;
pub use error::Error;

/// Result type alias using the Serve error type
pub type Result<T> = std::result::Result<T, Error>;
