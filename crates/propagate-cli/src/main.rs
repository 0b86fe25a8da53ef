mod reporter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use propagate::{run_pipeline, check_status, ContractChangeRequest, PropagateError, RunSummary};
use propagate_agent_client::{HttpAgentClient, HttpCiStatusClient, HttpGitProviderClient};
use propagate_audit::AuditLog;
use propagate_config::PipelineConfig;
use propagate_store::JobStore;
use propagate_supervisor::Clients;

use reporter::ConsoleReporter;

#[derive(Parser)]
#[command(name = "propagate", about = "Contract propagation engine")]
struct Cli {
    /// Path to the `.propagate.toml` configuration file.
    #[arg(long, default_value = ".propagate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one contract change.
    Run {
        #[arg(long)]
        producer_service: String,
        #[arg(long)]
        from_version: String,
        #[arg(long)]
        to_version: String,
        #[arg(long)]
        from_document: PathBuf,
        #[arg(long)]
        to_document: PathBuf,
        /// Plan waves without dispatching any agent sessions.
        #[arg(long)]
        dry_run: bool,
    },
    /// Drive one supervisor pass over already-dispatched jobs without
    /// dispatching anything new.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match propagate_config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(10);
        }
    };

    if let Commands::Run { dry_run: true, .. } = cli.command {
        config.options.dry_run = true;
    }

    let store = match JobStore::new(config.store_dir.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("failed to open job store: {e}");
            return ExitCode::from(10);
        }
    };
    let audit = Arc::new(AuditLog::open(config.audit_log_path.clone()));
    let clients = Arc::new(Clients {
        agent: Arc::new(HttpAgentClient::new(config.agent_platform_base_url.clone())),
        ci: Arc::new(HttpCiStatusClient::default()),
        git: Arc::new(HttpGitProviderClient::default()),
    });
    let reporter = Arc::new(ConsoleReporter);

    let result = match cli.command {
        Commands::Run {
            producer_service,
            from_version,
            to_version,
            from_document,
            to_document,
            ..
        } => {
            let request = ContractChangeRequest {
                producer_service,
                from_version,
                to_version,
                from_document_path: from_document.display().to_string(),
                to_document_path: to_document.display().to_string(),
            };
            run_pipeline(&config, request, clients, store, audit, reporter).await
        }
        Commands::Status => check_status(&config, clients, store, audit, reporter).await,
    };

    match result {
        Ok(summary) => report_summary(&summary),
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    }
}

fn report_summary(summary: &RunSummary) -> ExitCode {
    match summary {
        RunSummary::NoBreakingChanges => println!("no breaking changes; nothing to propagate"),
        RunSummary::DryRun { waves } => {
            println!("dry run: {} wave(s) planned", waves.len());
            for (i, wave) in waves.iter().enumerate() {
                println!("  wave {i}: {} bundle(s)", wave.len());
            }
        }
        RunSummary::Completed { jobs } => {
            println!("{} job(s) tracked", jobs.len());
        }
    }
    ExitCode::from(summary.exit_code() as u8)
}

fn exit_code_for_error(error: &PropagateError) -> ExitCode {
    match error {
        PropagateError::Config(_) => ExitCode::from(10),
        _ => ExitCode::FAILURE,
    }
}
