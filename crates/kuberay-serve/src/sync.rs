//! One push-then-observe step against a cluster's dashboard
//!
//! The RayService reconciler calls [`ServeSyncer::sync`] once per reconcile:
//! the desired graph is pushed and the resulting status read back, and the
//! outcome says whether the graph is fully serving. Deciding when to call it
//! again is the reconciler's business.

use std::sync::Arc;

use kuberay_common::crd::ServeDeploymentGraphSpec;
use tracing::{info, warn};

use crate::client::DashboardClientProvider;
use crate::wire::ServeDeploymentStatuses;
use crate::Result;

/// Result of one sync step
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOutcome {
    /// Status as reported by the dashboard after the push
    pub statuses: ServeDeploymentStatuses,

    /// Desired deployments that are missing or not healthy
    pub unhealthy: Vec<String>,
}

impl SyncOutcome {
    /// The application is running and every desired deployment is healthy
    pub fn is_serving(&self) -> bool {
        self.statuses.app_status.is_running() && self.unhealthy.is_empty()
    }
}

/// Pushes deployment graphs through an injected client provider
#[derive(Clone)]
pub struct ServeSyncer {
    provider: Arc<dyn DashboardClientProvider>,
}

impl ServeSyncer {
    /// Create a syncer using `provider` to reach dashboards
    pub fn new(provider: Arc<dyn DashboardClientProvider>) -> Self {
        Self { provider }
    }

    /// Push `graph` to the dashboard at `dashboard_url` and read back its status
    pub async fn sync(
        &self,
        dashboard_url: &str,
        graph: &ServeDeploymentGraphSpec,
    ) -> Result<SyncOutcome> {
        let client = self.provider.client_for(dashboard_url)?;

        client.update_deployments(graph).await?;
        let statuses = client.get_deployments_status().await?;

        let unhealthy: Vec<String> = graph
            .serve_configs
            .iter()
            .filter(|spec| {
                !statuses
                    .deployment(&spec.name)
                    .is_some_and(|d| d.is_healthy())
            })
            .map(|spec| spec.name.clone())
            .collect();

        let outcome = SyncOutcome {
            statuses,
            unhealthy,
        };
        if outcome.is_serving() {
            info!(dashboard = %dashboard_url, "serve deployments healthy");
        } else {
            warn!(
                dashboard = %dashboard_url,
                app_status = %outcome.statuses.app_status.status,
                unhealthy = ?outcome.unhealthy,
                "serve deployments not yet healthy"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use kuberay_common::crd::{
        AppStatus, ServeConfigSpec, ServeDeploymentStatus, APP_STATUS_DEPLOYING,
        APP_STATUS_RUNNING, DEPLOYMENT_STATUS_HEALTHY, DEPLOYMENT_STATUS_UNHEALTHY,
    };

    use super::*;
    use crate::client::{DashboardClient, MockDashboardClient, MockDashboardClientProvider};
    use crate::Error;

    fn graph(names: &[&str]) -> ServeDeploymentGraphSpec {
        ServeDeploymentGraphSpec {
            import_path: "fruit.deployment_graph".to_string(),
            runtime_env: String::new(),
            serve_configs: names
                .iter()
                .map(|n| ServeConfigSpec {
                    name: n.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn statuses(app: &str, deployments: &[(&str, &str)]) -> ServeDeploymentStatuses {
        ServeDeploymentStatuses {
            app_status: AppStatus {
                status: app.to_string(),
                ..Default::default()
            },
            deployment_statuses: deployments
                .iter()
                .map(|(name, status)| ServeDeploymentStatus {
                    name: name.to_string(),
                    status: status.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn provider_with(client: MockDashboardClient) -> Arc<dyn DashboardClientProvider> {
        let mut provider = MockDashboardClientProvider::new();
        let mut client = Some(client);
        provider
            .expect_client_for()
            .withf(|url| url.to_string() == "head-svc:8265")
            .times(1)
            .returning(move |_| {
                let c = client.take().expect("client requested once");
                Ok(Box::new(c) as Box<dyn DashboardClient>)
            });
        Arc::new(provider)
    }

    /// Story: a healthy graph reports serving
    #[tokio::test]
    async fn story_healthy_graph_is_serving() {
        let mut client = MockDashboardClient::new();
        client.expect_update_deployments().times(1).returning(|_| Ok(()));
        client.expect_get_deployments_status().times(1).returning(|| {
            Ok(statuses(
                APP_STATUS_RUNNING,
                &[
                    ("MangoStand", DEPLOYMENT_STATUS_HEALTHY),
                    ("OrangeStand", DEPLOYMENT_STATUS_HEALTHY),
                ],
            ))
        });

        let syncer = ServeSyncer::new(provider_with(client));
        let outcome = syncer
            .sync("head-svc:8265", &graph(&["MangoStand", "OrangeStand"]))
            .await
            .unwrap();

        assert!(outcome.is_serving());
        assert!(outcome.unhealthy.is_empty());
    }

    #[tokio::test]
    async fn unhealthy_and_missing_deployments_are_reported() {
        let mut client = MockDashboardClient::new();
        client.expect_update_deployments().returning(|_| Ok(()));
        client.expect_get_deployments_status().returning(|| {
            Ok(statuses(
                APP_STATUS_DEPLOYING,
                &[("MangoStand", DEPLOYMENT_STATUS_UNHEALTHY)],
            ))
        });

        let syncer = ServeSyncer::new(provider_with(client));
        let outcome = syncer
            .sync("head-svc:8265", &graph(&["MangoStand", "OrangeStand"]))
            .await
            .unwrap();

        assert!(!outcome.is_serving());
        assert_eq!(outcome.unhealthy, vec!["MangoStand", "OrangeStand"]);
    }

    #[tokio::test]
    async fn push_failure_skips_status_read() {
        let mut client = MockDashboardClient::new();
        client
            .expect_update_deployments()
            .returning(|_| Err(Error::NotInitialized));
        client.expect_get_deployments_status().never();

        let syncer = ServeSyncer::new(provider_with(client));
        let result = syncer.sync("head-svc:8265", &graph(&["MangoStand"])).await;

        assert!(matches!(result, Err(Error::NotInitialized)));
    }
}
