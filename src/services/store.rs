use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::JobPosting;

pub const RAW_JOBS_FILE: &str = "raw_jobs.json";
pub const RANKED_JOBS_FILE: &str = "ranked_jobs.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Run artifacts on disk: fetched postings and the ranked result
pub struct RunStore {
    data_dir: PathBuf,
}

impl RunStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn save_raw(&self, jobs: &[JobPosting]) -> Result<PathBuf, StoreError> {
        self.write(RAW_JOBS_FILE, jobs).await
    }

    pub async fn save_ranked(&self, jobs: &[JobPosting]) -> Result<PathBuf, StoreError> {
        self.write(RANKED_JOBS_FILE, jobs).await
    }

    /// Ranked postings of the last run; empty before the first run
    pub async fn latest_ranked(&self) -> Result<Vec<JobPosting>, StoreError> {
        self.read(RANKED_JOBS_FILE).await
    }

    pub async fn latest_raw(&self) -> Result<Vec<JobPosting>, StoreError> {
        self.read(RAW_JOBS_FILE).await
    }

    async fn write(&self, name: &str, jobs: &[JobPosting]) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.data_dir.join(name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(jobs)?).await?;
        tracing::debug!("Saved {} postings to {}", jobs.len(), path.display());
        Ok(path)
    }

    async fn read(&self, name: &str) -> Result<Vec<JobPosting>, StoreError> {
        match tokio::fs::read(self.data_dir.join(name)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_before_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().join("data"));
        assert!(store.latest_ranked().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_postings_keep_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        let posting: JobPosting = serde_json::from_str(
            r#"{"title": "Data Analyst", "company": "SAP", "url": "https://a", "salary": "60k"}"#,
        )
        .unwrap();
        store.save_ranked(&[posting]).await.unwrap();

        let latest = store.latest_ranked().await.unwrap();
        assert_eq!(latest[0].link, "https://a");
        assert_eq!(latest[0].extra["salary"], "60k");
    }
}
