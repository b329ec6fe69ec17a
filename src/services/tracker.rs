use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{ApplicationRecord, ApplicationStatus, JobPosting, StatusUpdate};

pub const TRACKING_FILE: &str = "applications_tracking.json";
pub const SUMMARY_FILE: &str = "applications_summary.txt";

/// Errors that can occur while reading or writing the tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Rows written by one `record_jobs` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub added: usize,
    /// Postings already tracked under the same company, position and URL
    pub skipped: usize,
}

/// Destination for tracked applications
#[async_trait]
pub trait TrackerSink: Send + Sync {
    /// Append one row per posting, skipping jobs that are already tracked
    async fn record_jobs(&self, jobs: &[JobPosting]) -> Result<RecordOutcome, TrackerError>;

    /// Change the status of every row matching company and position
    /// (case-insensitive) and append the note. Returns false when no row
    /// matched.
    async fn apply_status_update(&self, update: &StatusUpdate) -> Result<bool, TrackerError>;

    async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<ApplicationRecord>, TrackerError>;

    async fn set_status(&self, company: &str, position: &str, status: ApplicationStatus) -> Result<bool, TrackerError> {
        self.apply_status_update(&StatusUpdate {
            company: company.to_string(),
            position: position.to_string(),
            status,
            notes: String::new(),
        })
        .await
    }

    /// Short identifier for logs
    fn name(&self) -> &'static str;
}

/// Tracker kept as a JSON array plus a plain-text summary
pub struct FileTracker {
    path: PathBuf,
    summary_path: PathBuf,
    lock: Mutex<()>,
}

impl FileTracker {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            path: data_dir.join(TRACKING_FILE),
            summary_path: data_dir.join(SUMMARY_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    async fn load(&self) -> Result<Vec<ApplicationRecord>, TrackerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, records: &[ApplicationRecord]) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tokio::fs::write(&self.summary_path, render_summary(records, Utc::now())).await?;
        Ok(())
    }
}

#[async_trait]
impl TrackerSink for FileTracker {
    async fn record_jobs(&self, jobs: &[JobPosting]) -> Result<RecordOutcome, TrackerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let now = Utc::now();
        let mut outcome = RecordOutcome::default();

        for job in jobs {
            let record = ApplicationRecord::from_posting(job, now);
            if records.iter().any(|r| r.same_job(&record)) {
                outcome.skipped += 1;
                continue;
            }
            records.push(record);
            outcome.added += 1;
        }

        self.save(&records).await?;
        tracing::info!(
            "Saved {} applications to {} ({} already tracked)",
            outcome.added,
            self.path.display(),
            outcome.skipped
        );
        Ok(outcome)
    }

    async fn apply_status_update(&self, update: &StatusUpdate) -> Result<bool, TrackerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let now = Utc::now();
        let mut matched = false;

        for record in records.iter_mut().filter(|r| r.matches(&update.company, &update.position)) {
            record.status = update.status;
            record.last_updated = now;
            record.append_note(&update.notes);
            matched = true;
        }

        if matched {
            self.save(&records).await?;
            tracing::info!("Updated {} - {}: {}", update.company, update.position, update.status);
        } else {
            tracing::warn!("No matching job found for {} - {}", update.company, update.position);
        }
        Ok(matched)
    }

    async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<ApplicationRecord>, TrackerError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        Ok(match status {
            Some(status) => records.into_iter().filter(|r| r.status == status).collect(),
            None => records,
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Plain-text listing of every tracked application
pub fn render_summary(records: &[ApplicationRecord], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    match write_summary(&mut out, records, generated_at) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

fn write_summary(out: &mut String, records: &[ApplicationRecord], generated_at: DateTime<Utc>) -> fmt::Result {
    writeln!(out, "Job Applications Summary")?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M"))?;
    writeln!(out, "{}\n", "=".repeat(80))?;

    for (i, app) in records.iter().enumerate() {
        writeln!(out, "{}. {} - {}", i + 1, app.company, app.position)?;
        writeln!(out, "   Location: {}", app.location)?;
        writeln!(out, "   Match Score: {}", app.match_percent())?;
        writeln!(out, "   Status: {}", app.status)?;
        writeln!(out, "   Job URL: {}", app.job_url)?;
        if !app.career_page.is_empty() {
            writeln!(out, "   Career Page: {}", app.career_page)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
