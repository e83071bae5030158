mod cli;
mod config;
mod error;
mod model;
mod providers;
mod sync;
mod util;

use std::process::ExitCode;

use error::{SyncError, TransportError};
use providers::github::GitHubProvider;
use providers::http::HttpPolicy;
use providers::jira::JiraProvider;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match cli::parse_args(&args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &cli::CliArgs) -> Result<(), SyncError> {
    // Validated in full before any request goes out.
    let config = config::SyncConfig::load(args.config.as_deref())?;
    let policy = HttpPolicy::from(&config.sync);

    let source = JiraProvider::new(&config.jira, policy.clone())?;
    let mirror = GitHubProvider::new(&config.github, policy)?;
    let opts = sync::RunOptions {
        jira_base_url: config.jira.base_url.clone(),
        concurrency: config.sync.concurrency,
        dry_run: args.dry_run,
    };

    let report = sync::run(&source, &mirror, &opts).await?;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::warn!(error = %err, "failed to serialize run report"),
        }
    } else {
        for line in report.lines() {
            println!("{line}");
        }
        println!("{}", report.summary());
    }
    Ok(())
}

fn report_failure(err: &SyncError) {
    tracing::error!(error = %err, "sync failed");
    match err {
        SyncError::Transport(TransportError::Status { status, body, .. }) => {
            eprintln!("Sync failed: {err}");
            eprintln!("Status: {status}");
            let pretty = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or_else(|| body.clone());
            eprintln!("Response body: {pretty}");
        }
        SyncError::Transport(e) if e.is_timeout() => {
            eprintln!("Sync failed: request timed out: {err}");
        }
        _ => eprintln!("Sync failed: {err}"),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
