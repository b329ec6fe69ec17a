use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::TrackerSettings;
use crate::models::{ApplicationRecord, ApplicationStatus, JobPosting, StatusUpdate};
use crate::services::tracker::{RecordOutcome, TrackerError, TrackerSink};

/// Application tracker stored in PostgreSQL
///
/// Rows are unique on lower-cased company and position plus the job URL, so
/// re-recording a posting is a no-op.
pub struct PostgresTracker {
    pool: PgPool,
}

impl PostgresTracker {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &TrackerSettings) -> Result<Self, TrackerError> {
        tracing::info!("Connecting application tracker to PostgreSQL");

        Self::new(
            &settings.database_url,
            settings.max_connections.unwrap_or(5),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, TrackerError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn record_from_row(row: &PgRow) -> ApplicationRecord {
    let status: String = row.get("status");
    let status = ApplicationStatus::parse(&status).unwrap_or_else(|| {
        tracing::warn!("Unknown status '{}' in applications table", status);
        ApplicationStatus::New
    });

    ApplicationRecord {
        company: row.get("company"),
        position: row.get("position"),
        location: row.get("location"),
        description: row.get("description"),
        application_date: row.get("application_date"),
        status,
        match_score: row.get("match_score"),
        job_url: row.get("job_url"),
        career_page: row.get("career_page"),
        last_updated: row.get("last_updated"),
        notes: row.get("notes"),
    }
}

#[async_trait]
impl TrackerSink for PostgresTracker {
    async fn record_jobs(&self, jobs: &[JobPosting]) -> Result<RecordOutcome, TrackerError> {
        let query = r#"
            INSERT INTO applications (
                company, position, location, description, application_date, status,
                match_score, job_url, career_page, last_updated, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (lower(company), lower(position), job_url) DO NOTHING
        "#;

        let now = Utc::now();
        let mut outcome = RecordOutcome::default();
        let mut tx = self.pool.begin().await?;

        for job in jobs {
            let record = ApplicationRecord::from_posting(job, now);
            let result = sqlx::query(query)
                .bind(&record.company)
                .bind(&record.position)
                .bind(&record.location)
                .bind(&record.description)
                .bind(record.application_date)
                .bind(record.status.as_str())
                .bind(record.match_score)
                .bind(&record.job_url)
                .bind(&record.career_page)
                .bind(record.last_updated)
                .bind(&record.notes)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() > 0 {
                outcome.added += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        tx.commit().await?;
        tracing::info!("Recorded {} applications ({} already tracked)", outcome.added, outcome.skipped);
        Ok(outcome)
    }

    async fn apply_status_update(&self, update: &StatusUpdate) -> Result<bool, TrackerError> {
        let query = r#"
            UPDATE applications
            SET status = $3,
                last_updated = NOW(),
                notes = CASE
                    WHEN $4 = '' THEN notes
                    WHEN notes = '' THEN $4
                    ELSE notes || E'\n' || $4
                END
            WHERE lower(company) = lower($1) AND lower(position) = lower($2)
        "#;

        let result = sqlx::query(query)
            .bind(&update.company)
            .bind(&update.position)
            .bind(update.status.as_str())
            .bind(&update.notes)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected() > 0;
        if matched {
            tracing::info!("Updated {} - {}: {}", update.company, update.position, update.status);
        } else {
            tracing::warn!("No matching job found for {} - {}", update.company, update.position);
        }
        Ok(matched)
    }

    async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<ApplicationRecord>, TrackerError> {
        let query = r#"
            SELECT company, position, location, description, application_date, status,
                   match_score, job_url, career_page, last_updated, notes
            FROM applications
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY id
        "#;

        let rows = sqlx::query(query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
