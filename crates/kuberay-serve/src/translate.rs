//! Translation of the RayService deployment graph into dashboard requests
//!
//! Configuration blobs are stored in the CRD as YAML or JSON text. They are
//! decoded here; a blob that fails to decode is logged and sent as an empty
//! mapping so one bad field does not block the whole push.

use kuberay_common::crd::{ServeConfigSpec, ServeDeploymentGraphSpec};
use tracing::warn;

use crate::wire::{ConfigMapping, RayActorOptions, ServeConfig, ServingClusterDeployments};

/// Decode a configuration blob into a mapping.
///
/// Blank text decodes to an empty mapping.
pub fn decode_blob(raw: &str) -> Result<ConfigMapping, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(ConfigMapping::new());
    }
    serde_yaml::from_str(raw)
}

/// What a blob belongs to, for the warning logged when it does not decode
#[derive(Clone, Copy)]
enum BlobOwner<'a> {
    Deployment(&'a str),
    Graph(&'a str),
}

fn decode_or_empty(owner: BlobOwner<'_>, field: &str, raw: &str) -> ConfigMapping {
    decode_blob(raw).unwrap_or_else(|e| {
        match owner {
            BlobOwner::Deployment(name) => {
                warn!(deployment = %name, field, error = %e, "ignoring undecodable serve config blob")
            }
            BlobOwner::Graph(import_path) => {
                warn!(import_path = %import_path, field, error = %e, "ignoring undecodable serve config blob")
            }
        }
        ConfigMapping::new()
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Translate one deployment spec
pub fn translate_one(spec: &ServeConfigSpec) -> ServeConfig {
    let owner = BlobOwner::Deployment(&spec.name);
    let actor = &spec.ray_actor_options;

    ServeConfig {
        name: spec.name.clone(),
        num_replicas: spec.num_replicas,
        route_prefix: non_empty(&spec.route_prefix),
        max_concurrent_queries: spec.max_concurrent_queries,
        user_config: decode_or_empty(owner, "userConfig", &spec.user_config),
        autoscaling_config: decode_or_empty(owner, "autoscalingConfig", &spec.autoscaling_config),
        graceful_shutdown_wait_loop_s: spec.graceful_shutdown_wait_loop_s,
        graceful_shutdown_timeout_s: spec.graceful_shutdown_timeout_s,
        health_check_period_s: spec.health_check_period_s,
        health_check_timeout_s: spec.health_check_timeout_s,
        ray_actor_options: RayActorOptions {
            runtime_env: decode_or_empty(owner, "rayActorOptions.runtimeEnv", &actor.runtime_env),
            num_cpus: actor.num_cpus,
            num_gpus: actor.num_gpus,
            memory: actor.memory,
            object_store_memory: actor.object_store_memory,
            resources: decode_or_empty(owner, "rayActorOptions.resources", &actor.resources),
            accelerator_type: non_empty(&actor.accelerator_type),
        },
    }
}

/// Translate deployment specs, preserving order
pub fn translate(specs: &[ServeConfigSpec]) -> Vec<ServeConfig> {
    specs.iter().map(translate_one).collect()
}

/// Build the full `PUT /api/serve/deployments/` body for a graph
pub fn build_request(graph: &ServeDeploymentGraphSpec) -> ServingClusterDeployments {
    ServingClusterDeployments {
        import_path: graph.import_path.clone(),
        runtime_env: decode_or_empty(BlobOwner::Graph(&graph.import_path), "runtimeEnv", &graph.runtime_env),
        deployments: translate(&graph.serve_configs),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use kuberay_common::crd::RayActorOptionSpec;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    fn mango_stand() -> ServeConfigSpec {
        ServeConfigSpec {
            name: "MangoStand".to_string(),
            num_replicas: Some(2),
            route_prefix: Some("/mango".to_string()),
            max_concurrent_queries: Some(100),
            user_config: "price: 3".to_string(),
            autoscaling_config: r#"{"min_replicas": 1, "max_replicas": 4}"#.to_string(),
            graceful_shutdown_wait_loop_s: Some(2),
            graceful_shutdown_timeout_s: Some(20),
            health_check_period_s: Some(10),
            health_check_timeout_s: Some(30),
            ray_actor_options: RayActorOptionSpec {
                runtime_env: "pip:\n  - requests".to_string(),
                num_cpus: Some(0.1),
                num_gpus: Some(1.0),
                memory: Some(1_073_741_824),
                object_store_memory: Some(536_870_912),
                resources: r#"{"TPU": 1}"#.to_string(),
                accelerator_type: Some("V100".to_string()),
            },
        }
    }

    #[test]
    fn every_field_is_carried_over() {
        let translated = translate_one(&mango_stand());

        assert_eq!(translated.name, "MangoStand");
        assert_eq!(translated.num_replicas, Some(2));
        assert_eq!(translated.route_prefix.as_deref(), Some("/mango"));
        assert_eq!(translated.max_concurrent_queries, Some(100));
        assert_eq!(translated.user_config.get("price"), Some(&json!(3)));
        assert_eq!(translated.autoscaling_config.get("max_replicas"), Some(&json!(4)));
        assert_eq!(translated.graceful_shutdown_wait_loop_s, Some(2));
        assert_eq!(translated.graceful_shutdown_timeout_s, Some(20));
        assert_eq!(translated.health_check_period_s, Some(10));
        assert_eq!(translated.health_check_timeout_s, Some(30));

        let actor = &translated.ray_actor_options;
        assert_eq!(actor.runtime_env.get("pip"), Some(&json!(["requests"])));
        assert_eq!(actor.num_cpus, Some(0.1));
        assert_eq!(actor.num_gpus, Some(1.0));
        assert_eq!(actor.memory, Some(1_073_741_824));
        assert_eq!(actor.object_store_memory, Some(536_870_912));
        assert_eq!(actor.resources.get("TPU"), Some(&json!(1)));
        assert_eq!(actor.accelerator_type.as_deref(), Some("V100"));
    }

    /// Story: one malformed blob does not block the push
    ///
    /// A typo in `userConfig` degrades that field to `{}`; everything else in
    /// the deployment is still sent.
    #[test]
    fn story_unparsable_user_config_degrades_to_empty() {
        let mut spec = mango_stand();
        spec.user_config = "price: [3".to_string();

        let translated = translate_one(&spec);
        assert!(translated.user_config.is_empty());

        let mut expected = translate_one(&mango_stand());
        expected.user_config.clear();
        assert_eq!(translated, expected);
    }

    #[test]
    fn non_mapping_blob_degrades_to_empty() {
        let mut spec = mango_stand();
        spec.ray_actor_options.resources = "- just\n- a list".to_string();
        spec.autoscaling_config = "42".to_string();

        let translated = translate_one(&spec);
        assert!(translated.ray_actor_options.resources.is_empty());
        assert!(translated.autoscaling_config.is_empty());
        assert_eq!(translated.user_config.get("price"), Some(&json!(3)));
    }

    #[test]
    fn health_check_timeout_comes_from_its_own_field() {
        let mut spec = mango_stand();
        spec.graceful_shutdown_timeout_s = Some(5);
        spec.health_check_timeout_s = Some(60);

        let translated = translate_one(&spec);
        assert_eq!(translated.graceful_shutdown_timeout_s, Some(5));
        assert_eq!(translated.health_check_timeout_s, Some(60));
    }

    #[test]
    fn minimal_spec_serializes_without_nulls() {
        let spec = ServeConfigSpec {
            name: "shallow".to_string(),
            route_prefix: Some(String::new()),
            ..Default::default()
        };
        let body = serde_json::to_value(translate_one(&spec)).unwrap();
        assert_eq!(body, json!({"name": "shallow", "ray_actor_options": {}}));
    }

    #[test]
    fn translate_preserves_order() {
        let names = ["deep", "shallow", "one"];
        let specs: Vec<ServeConfigSpec> = names
            .iter()
            .map(|n| ServeConfigSpec {
                name: n.to_string(),
                ..Default::default()
            })
            .collect();

        let translated: Vec<String> = translate(&specs).into_iter().map(|c| c.name).collect();
        assert_eq!(translated, names);
    }

    #[test]
    fn build_request_decodes_graph_runtime_env() {
        let graph = ServeDeploymentGraphSpec {
            import_path: "fruit.deployment_graph".to_string(),
            runtime_env: "working_dir: \"https://github.com/ray-project/test_dag/archive/main.zip\"\n".to_string(),
            serve_configs: vec![mango_stand()],
        };

        let request = build_request(&graph);
        assert_eq!(request.import_path, "fruit.deployment_graph");
        assert_eq!(
            request.runtime_env.get("working_dir"),
            Some(&json!("https://github.com/ray-project/test_dag/archive/main.zip"))
        );
        assert_eq!(request.deployments.len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn undecodable_graph_runtime_env_is_logged_against_import_path() {
        let graph = ServeDeploymentGraphSpec {
            import_path: "fruit.deployment_graph".to_string(),
            runtime_env: "working_dir: [".to_string(),
            serve_configs: vec![mango_stand()],
        };

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let request = tracing::subscriber::with_default(subscriber, || build_request(&graph));

        assert!(request.runtime_env.is_empty());
        assert_eq!(request.deployments.len(), 1);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("import_path=fruit.deployment_graph"), "{output}");
        assert!(!output.contains("deployment="), "{output}");
    }

    #[test]
    fn blank_blobs_are_empty() {
        assert!(decode_blob("").unwrap().is_empty());
        assert!(decode_blob("  \n").unwrap().is_empty());
        assert!(decode_blob("{").is_err());
    }
}
