use analysis_progress::adapters::{HttpJobLauncher, InMemoryTaskRegistry, ReqwestHttpClient};
use analysis_progress::cli::{follow, parse_args, run_cli_command, CliCommand};
use analysis_progress::config::ClientConfig;
use analysis_progress::controller::StreamController;
use analysis_progress::traits::{HttpClient, JobTarget};

use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Start the analysis and print a line per state change until it ends.
///
/// Returns the process exit code.
async fn watch(target: JobTarget, config: ClientConfig) -> Result<i32> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let launcher = Arc::new(HttpJobLauncher::new(http.clone(), config.clone()));
    let registry = Arc::new(InMemoryTaskRegistry::new());
    let controller = StreamController::new(http, launcher, config).with_sink(registry.clone());

    let task_id = uuid::Uuid::new_v4().to_string();
    info!(task_id = %task_id, repository = %target.repository, "Starting analysis");

    controller.start(target, task_id.clone());

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, cancelling analysis");
        } else {
            std::future::pending::<()>().await;
        }
    };
    let outcome = follow(&controller, interrupt, |line| println!("{}", line)).await;

    if let Some(task) = registry.get(&task_id) {
        debug!(task_id = %task.id, status = %task.status, progress = task.progress, "Final task entry");
    }

    Ok(outcome.exit_code())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = parse_args(std::env::args());
    if let Some(result) = run_cli_command(&command) {
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
        return Ok(());
    }

    let CliCommand::Watch(args) = command else {
        return Ok(());
    };

    init_tracing(args.verbosity);
    let config = ClientConfig::from_env()?;
    let code = watch(args.target, config).await?;
    std::process::exit(code)
}
