//! serve-ctl - inspect and drive a Ray dashboard's Serve API by hand
//!
//! Uses the same translation and client code as the operator, so a graph
//! that misbehaves in a RayService can be replayed against a dashboard
//! directly.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use kuberay_common::crd::ServeDeploymentGraphSpec;
use kuberay_common::telemetry::{init_telemetry, TelemetryConfig};
use kuberay_serve::translate::build_request;
use kuberay_serve::{
    DashboardClientConfig, DashboardClientProvider, Error, HttpDashboardClientProvider, Result,
};

/// Inspect and drive a Ray dashboard's Serve API
#[derive(Parser, Debug)]
#[command(name = "serve-ctl", version, about, long_about = None)]
struct Cli {
    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the request body a graph file translates to
    Translate(GraphArgs),

    /// Push a graph file to a dashboard
    Push {
        #[command(flatten)]
        dashboard: DashboardArgs,
        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Print the dashboard's current Serve deployments
    Deployments(DashboardArgs),

    /// Print the dashboard's Serve deployment status
    Status(DashboardArgs),
}

/// Dashboard connection arguments
#[derive(Args, Debug)]
struct DashboardArgs {
    /// Dashboard address, `host:port` or a full URL
    #[arg(long, env = "RAY_DASHBOARD_ADDRESS")]
    dashboard: String,

    /// Request timeout in seconds
    #[arg(long, env = "SERVE_CTL_TIMEOUT_SECS", default_value_t = 2)]
    timeout_secs: u64,
}

/// Deployment graph file arguments
#[derive(Args, Debug)]
struct GraphArgs {
    /// Path to a ServeDeploymentGraphSpec in YAML or JSON
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
}

impl DashboardArgs {
    fn provider(&self) -> HttpDashboardClientProvider {
        HttpDashboardClientProvider::new(
            DashboardClientConfig::default().with_timeout(Duration::from_secs(self.timeout_secs)),
        )
    }
}

impl GraphArgs {
    fn load(&self) -> Result<ServeDeploymentGraphSpec> {
        let path = self.file.display().to_string();
        let raw = std::fs::read_to_string(&self.file)
            .map_err(|e| Error::graph_file(&path, e.to_string()))?;
        serde_yaml::from_str(&raw).map_err(|e| Error::graph_file(&path, e.to_string()))
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Translate(graph) => {
            let request = build_request(&graph.load()?);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::Push { dashboard, graph } => {
            let graph = graph.load()?;
            let client = dashboard.provider().client_for(&dashboard.dashboard)?;
            client.update_deployments(&graph).await?;
            println!(
                "pushed {} deployment(s) to {}",
                graph.serve_configs.len(),
                dashboard.dashboard
            );
        }
        Commands::Deployments(dashboard) => {
            let client = dashboard.provider().client_for(&dashboard.dashboard)?;
            println!("{}", client.get_deployments().await?);
        }
        Commands::Status(dashboard) => {
            let client = dashboard.provider().client_for(&dashboard.dashboard)?;
            let statuses = client.get_deployments_status().await?;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        service_name: "serve-ctl".to_string(),
        json: cli.json_logs,
    })?;

    run(cli.command).await?;
    Ok(())
}
