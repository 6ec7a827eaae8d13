use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use apply_flow::SubmissionMachine;
use clap::Args;
use dialog_driver::BrowserSession;
use tracing::info;

use super::output::OutputFormat;
use super::runtime::build_oracle;
use crate::app_settings::Config;
use crate::batch::{collect_jobs, BatchReport, BatchRunner};

#[derive(Args, Clone)]
pub struct ApplyArgs {
    /// Job URLs to apply to
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// File with one job URL per line (`#` starts a comment)
    #[arg(long, value_name = "FILE")]
    pub jobs: Option<PathBuf>,

    /// Write the JSON batch report here
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Attach to a running browser instead of launching one
    #[arg(long, value_name = "WS_URL")]
    pub connect: Option<String>,

    /// Upper bound of the pause between jobs, in milliseconds
    #[arg(long)]
    pub jitter_ms: Option<u64>,
}

pub async fn cmd_apply(args: ApplyArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let jobs = collect_jobs(args.jobs.as_deref(), &args.urls).await?;
    if jobs.is_empty() {
        bail!("No job URLs given; pass URLs or --jobs <FILE>");
    }

    let oracle = Arc::new(build_oracle(config).await?);

    let mut browser = config.browser.clone();
    if args.headless {
        browser.headless = true;
    }
    if args.connect.is_some() {
        browser.connect_url = args.connect.clone();
    }

    let mut session = BrowserSession::launch(&browser)
        .await
        .context("Failed to start browser session")?;
    let driver = match session.open_driver(config.selectors.clone()).await {
        Ok(driver) => Arc::new(driver),
        Err(err) => {
            session.close().await;
            return Err(err).context("Failed to open browser tab");
        }
    };

    let jitter = args
        .jitter_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.batch.jitter());
    let machine = SubmissionMachine::new(driver, oracle, config.flow.clone());
    let mut runner = BatchRunner::new(machine, jitter);

    info!(jobs = jobs.len(), "starting batch");
    let report = runner.run(&jobs).await;
    session.close().await;

    print_report(&report, output)?;

    if let Some(path) = args.report.as_ref().or(config.batch.report_path.as_ref()) {
        report.write_json(path).await?;
        info!(path = %path.display(), "batch report written");
    }
    Ok(())
}

fn print_report(report: &BatchReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Human => {
            for job in &report.jobs {
                println!(
                    "{:<20} {} ({} steps, {} fill passes, {} ms)",
                    job.outcome.to_string(),
                    job.url,
                    job.steps,
                    job.fill_passes,
                    job.elapsed_ms
                );
            }
            let summary = &report.summary;
            println!();
            println!(
                "Jobs: {}  submitted: {}  abandoned: {}  no dialog: {}  navigation failed: {}",
                summary.total,
                summary.submitted,
                summary.abandoned,
                summary.no_dialog,
                summary.navigation_failed
            );
        }
    }
    Ok(())
}
