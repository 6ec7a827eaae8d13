use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use apply_flow::{ApplyOutcome, JobReport, SubmissionMachine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Job URLs from a list file: one per line, blank lines and `#` comments ignored.
pub fn parse_job_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Jobs from the optional list file followed by the extra URLs, duplicates dropped.
pub async fn collect_jobs(file: Option<&Path>, extra: &[String]) -> Result<Vec<String>> {
    let mut jobs = Vec::new();
    if let Some(path) = file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job list {}", path.display()))?;
        jobs.extend(parse_job_list(&contents));
    }
    jobs.extend(
        extra
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty()),
    );

    let mut seen = std::collections::HashSet::new();
    jobs.retain(|url| seen.insert(url.clone()));
    Ok(jobs)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub submitted: usize,
    pub abandoned: usize,
    pub no_dialog: usize,
    pub navigation_failed: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[JobReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.outcome {
                ApplyOutcome::Submitted => summary.submitted += 1,
                ApplyOutcome::Abandoned(_) => summary.abandoned += 1,
                ApplyOutcome::NoDialog => summary.no_dialog += 1,
                ApplyOutcome::NavigationFailed(_) => summary.navigation_failed += 1,
            }
        }
        summary
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }
}

/// Runs jobs strictly one after another through a single submission machine.
pub struct BatchRunner {
    machine: SubmissionMachine,
    jitter: Duration,
}

impl BatchRunner {
    pub fn new(machine: SubmissionMachine, jitter: Duration) -> Self {
        Self { machine, jitter }
    }

    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn run(&mut self, jobs: &[String]) -> BatchReport {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(jobs.len());

        for (index, url) in jobs.iter().enumerate() {
            if index > 0 {
                let pause = self.pause();
                if !pause.is_zero() {
                    sleep(pause).await;
                }
            }
            info!(job = %url, position = index + 1, total = jobs.len(), "starting job");
            reports.push(self.machine.apply_to_job(url).await);
        }

        let summary = BatchSummary::from_reports(&reports);
        info!(
            submitted = summary.submitted,
            abandoned = summary.abandoned,
            no_dialog = summary.no_dialog,
            navigation_failed = summary.navigation_failed,
            "batch finished"
        );
        BatchReport {
            started_at,
            finished_at: Utc::now(),
            summary,
            jobs: reports,
        }
    }

    fn pause(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(max / 2..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_list_skips_comments_and_blanks() {
        let contents = "# saved searches\nhttps://a.example/1\n\n   https://a.example/2  \n#https://a.example/3\n";
        assert_eq!(
            parse_job_list(contents),
            vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()]
        );
    }

    #[tokio::test]
    async fn file_jobs_come_first_and_duplicates_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.txt");
        tokio::fs::write(&path, "https://a.example/1\nhttps://a.example/2\n")
            .await
            .unwrap();
        let jobs = collect_jobs(
            Some(&path),
            &["https://a.example/2".to_string(), "https://a.example/3".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(
            jobs,
            vec![
                "https://a.example/1".to_string(),
                "https://a.example/2".to_string(),
                "https://a.example/3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_job_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_jobs(Some(&dir.path().join("absent.txt")), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read job list"));
    }
}
