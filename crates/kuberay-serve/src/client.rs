//! Ray dashboard Serve API client
//!
//! The reconciler never constructs a client directly: it receives a
//! [`DashboardClientProvider`] and asks it for a client bound to the
//! dashboard of the cluster being reconciled. Tests substitute mocks at
//! either trait.

use async_trait::async_trait;
use kuberay_common::crd::ServeDeploymentGraphSpec;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use crate::config::DashboardClientConfig;
use crate::translate::build_request;
use crate::wire::ServeDeploymentStatuses;
use crate::{Error, Result};

/// Serve deployments endpoint (GET current, PUT desired)
pub const DEPLOY_PATH: &str = "/api/serve/deployments/";

/// Serve deployment status endpoint
pub const STATUS_PATH: &str = "/api/serve/deployments/status";

/// Operations against a Ray dashboard's Serve API
///
/// Implementations must be initialized with [`DashboardClient::init_client`]
/// before any request is made.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DashboardClient: Send + Sync {
    /// Bind the client to a dashboard address (`host:port` or a full URL)
    fn init_client(&mut self, url: &str);

    /// Fetch the current Serve deployments as the raw response body
    async fn get_deployments(&self) -> Result<String>;

    /// Push the desired deployment graph.
    ///
    /// Succeeds once the request round-trip completes; the HTTP status is
    /// not inspected, callers poll [`DashboardClient::get_deployments_status`].
    async fn update_deployments(&self, graph: &ServeDeploymentGraphSpec) -> Result<()>;

    /// Fetch the application and per-deployment Serve status
    async fn get_deployments_status(&self) -> Result<ServeDeploymentStatuses>;
}

/// Hands out dashboard clients bound to a dashboard address
#[cfg_attr(test, automock)]
pub trait DashboardClientProvider: Send + Sync {
    /// Create a client initialized for `dashboard_url`
    fn client_for(&self, dashboard_url: &str) -> Result<Box<dyn DashboardClient>>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// [`DashboardClient`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    client: reqwest::Client,
    config: DashboardClientConfig,
    dashboard_url: Option<String>,
}

impl HttpDashboardClient {
    /// Create an uninitialized client with the configured timeout
    pub fn new(config: DashboardClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            dashboard_url: None,
        })
    }

    /// The bound dashboard base URL, if initialized
    pub fn dashboard_url(&self) -> Option<&str> {
        self.dashboard_url.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        let base = self.dashboard_url.as_deref().ok_or(Error::NotInitialized)?;
        Ok(format!("{}{}", base, path))
    }

    async fn get_text(&self, path: &str) -> Result<(String, String)> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;
        debug!(url = %url, status = %response.status(), "dashboard responded");
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(&url, e))?;
        Ok((url, body))
    }
}

#[async_trait]
impl DashboardClient for HttpDashboardClient {
    fn init_client(&mut self, url: &str) {
        let url = url.trim().trim_end_matches('/');
        let base = if url.contains("://") {
            url.to_string()
        } else {
            format!("{}://{}", self.config.default_scheme, url)
        };
        debug!(dashboard = %base, "dashboard client initialized");
        self.dashboard_url = Some(base);
    }

    #[instrument(skip(self), fields(dashboard = ?self.dashboard_url))]
    async fn get_deployments(&self) -> Result<String> {
        let (_, body) = self.get_text(DEPLOY_PATH).await?;
        Ok(body)
    }

    #[instrument(skip(self, graph), fields(dashboard = ?self.dashboard_url, deployments = graph.serve_configs.len()))]
    async fn update_deployments(&self, graph: &ServeDeploymentGraphSpec) -> Result<()> {
        let url = self.endpoint(DEPLOY_PATH)?;
        let body = serde_json::to_vec(&build_request(graph))?;

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;

        debug!(url = %url, status = %response.status(), "serve deployments pushed");
        Ok(())
    }

    #[instrument(skip(self), fields(dashboard = ?self.dashboard_url))]
    async fn get_deployments_status(&self) -> Result<ServeDeploymentStatuses> {
        let (url, body) = self.get_text(STATUS_PATH).await?;
        serde_json::from_str(&body).map_err(|e| Error::decoding(url, e))
    }
}

/// [`DashboardClientProvider`] producing [`HttpDashboardClient`]s
#[derive(Debug, Clone, Default)]
pub struct HttpDashboardClientProvider {
    config: DashboardClientConfig,
}

impl HttpDashboardClientProvider {
    /// Create a provider whose clients use `config`
    pub fn new(config: DashboardClientConfig) -> Self {
        Self { config }
    }
}

impl DashboardClientProvider for HttpDashboardClientProvider {
    fn client_for(&self, dashboard_url: &str) -> Result<Box<dyn DashboardClient>> {
        let mut client = HttpDashboardClient::new(self.config.clone())?;
        client.init_client(dashboard_url);
        Ok(Box::new(client))
    }
}
