//! Dashboard client configuration

use std::time::Duration;

/// Timeout for every dashboard request.
///
/// Requests run inline in a reconcile, so this stays short.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Scheme prepended to dashboard addresses given as `host:port`
pub const DEFAULT_SCHEME: &str = "http";

/// Configuration for [`crate::HttpDashboardClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardClientConfig {
    /// Per-request timeout, covering connect through reading the body
    pub timeout: Duration,

    /// Scheme used when the dashboard address has none
    pub default_scheme: String,
}

impl Default for DashboardClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl DashboardClientConfig {
    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default scheme
    pub fn with_default_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_scheme = scheme.into();
        self
    }
}
