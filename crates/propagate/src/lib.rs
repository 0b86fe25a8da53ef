//! Orchestrates the contract propagation pipeline end to end: diff a
//! contract change, classify it, map its blast radius, bundle remediation
//! work per consumer, plan dependency-ordered waves, and (unless dry-run)
//! dispatch and supervise every wave to a terminal outcome.

pub mod conventions;
pub mod errors;
pub mod pipeline;

pub use conventions::{load_repo_conventions, ConventionsError};
pub use errors::{InputError, PropagateError};
pub use pipeline::{check_status, run_pipeline, ContractChangeRequest, RunSummary};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use propagate_agent_client::{FakeAgentClient, FakeCiStatusClient, FakeGitProviderClient};
    use propagate_audit::AuditLog;
    use propagate_config::PipelineConfig;
    use propagate_store::JobStore;
    use propagate_supervisor::{Clients, SilentReporter};
    use propagate_types::PipelineOptions;
    use std::io::Write;

    fn write_json(dir: &std::path::Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            options: PipelineOptions {
                dry_run: false,
                ..PipelineOptions::default()
            },
            service_map_path: dir.join("service_map.json"),
            telemetry_path: dir.join("telemetry.json"),
            repo_conventions_path: dir.join("conventions.json"),
            store_dir: dir.join("store"),
            audit_log_path: dir.join("audit.jsonl"),
            agent_platform_base_url: "https://agents.internal".to_string(),
        }
    }

    #[tokio::test]
    async fn non_breaking_change_short_circuits_with_no_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "service_map.json", r#"{"edges":[]}"#);
        write_json(dir.path(), "telemetry.json", r#"{"samples":[]}"#);
        write_json(dir.path(), "conventions.json", "[]");
        let from = write_json(
            dir.path(),
            "from.json",
            r#"{"openapi":"3.0.3","paths":{"/sessions":{"get":{}}}}"#,
        );
        let to = write_json(
            dir.path(),
            "to.json",
            r#"{"openapi":"3.0.3","paths":{"/sessions":{"get":{}}}}"#,
        );

        let config = config(dir.path());
        let store = Arc::new(JobStore::new(config.store_dir.clone()).unwrap());
        let audit = Arc::new(AuditLog::open(config.audit_log_path.clone()));
        let clients = Arc::new(Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(FakeCiStatusClient::default()),
            git: Arc::new(FakeGitProviderClient::default()),
        });
        let reporter = Arc::new(SilentReporter);

        let request = ContractChangeRequest {
            producer_service: "billing".to_string(),
            from_version: "v1".to_string(),
            to_version: "v2".to_string(),
            from_document_path: from,
            to_document_path: to,
        };

        let summary = run_pipeline(&config, request, clients, store, audit, reporter).await.unwrap();
        assert!(matches!(summary, RunSummary::NoBreakingChanges));
        assert_eq!(summary.exit_code(), 0);
    }

    #[tokio::test]
    async fn dry_run_plans_waves_without_dispatching() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            dir.path(),
            "service_map.json",
            r#"{"edges":[{"consumer_service":"checkout","producer_service":"billing","path":"/sessions","method":"POST"}]}"#,
        );
        write_json(dir.path(), "telemetry.json", r#"{"samples":[]}"#);
        write_json(
            dir.path(),
            "conventions.json",
            r#"[{"consumer_service":"checkout","repo":"org/checkout","client_globs":["src/clients/billing/**"],"schema_mirror_globs":[],"fixture_globs":[],"test_globs":[],"protected_globs":["src/clients/billing/generated/**"]}]"#,
        );
        let from = write_json(
            dir.path(),
            "from.json",
            r#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{"requestBody":{"required":true,"content":{"application/json":{"schema":{"type":"object","properties":{"id":{"type":"string"}},"required":["id"]}}}}}}}}"#,
        );
        let to = write_json(
            dir.path(),
            "to.json",
            r#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{"requestBody":{"required":true,"content":{"application/json":{"schema":{"type":"object","properties":{"id":{"type":"string"},"budget":{"type":"number"}},"required":["id","budget"]}}}}}}}}"#,
        );

        let mut config = config(dir.path());
        config.options.dry_run = true;
        let store = Arc::new(JobStore::new(config.store_dir.clone()).unwrap());
        let audit = Arc::new(AuditLog::open(config.audit_log_path.clone()));
        let clients = Arc::new(Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(FakeCiStatusClient::default()),
            git: Arc::new(FakeGitProviderClient::default()),
        });
        let reporter = Arc::new(SilentReporter);

        let request = ContractChangeRequest {
            producer_service: "billing".to_string(),
            from_version: "v1".to_string(),
            to_version: "v2".to_string(),
            from_document_path: from,
            to_document_path: to,
        };

        let summary = run_pipeline(&config, request, clients, store, audit, reporter).await.unwrap();
        match summary {
            RunSummary::DryRun { waves } => {
                assert_eq!(waves.iter().map(|w| w.len()).sum::<usize>(), 1);
            }
            other => panic!("expected DryRun, got {other:?}"),
        }
    }
}
