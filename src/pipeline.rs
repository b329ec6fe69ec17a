use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{CriteriaSettings, Settings, StrategyKind, TrackerBackend};
use crate::core::{
    classify_email, extract_company_position, ConfigurationError, EmailKeywords, MatchCriteria, Ranker,
};
use crate::models::{
    ApplicationStatus, JobSource, PollSummary, ProcessSummary, RunPipelineRequest, RunSummary, StatusUpdate,
};
use crate::services::{
    ApifyClient, CareerPageScraper, DocumentError, DocumentGenerator, FetchError, FetchQuery, FileTracker,
    JobFetcher, LanguageModel, LlmError, MailError, Mailbox, ModelStrategy, OpenAiClient, PostgresTracker,
    RunStore, ScoreCache, StoreError, TrackerError, TrackerSink,
};

/// Errors that abort a pipeline operation
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Document generation failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Mailbox error: {0}")]
    Mail(#[from] MailError),

    #[error("Run store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Per-run overrides
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: JobSource,
    pub location: Option<String>,
    pub min_match_score: Option<f64>,
    /// Cap on ranked postings kept for this run; `criteria.max_jobs_per_run` when unset
    pub max_jobs: Option<usize>,
    pub generate_documents: bool,
    pub update_tracker: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            source: JobSource::JobBoards,
            location: None,
            min_match_score: None,
            max_jobs: None,
            generate_documents: true,
            update_tracker: true,
        }
    }
}

impl From<RunPipelineRequest> for RunOptions {
    fn from(req: RunPipelineRequest) -> Self {
        Self {
            source: req.source,
            location: req.location,
            min_match_score: req.min_match_score,
            max_jobs: req.max_jobs.map(|n| n as usize),
            generate_documents: req.generate_documents,
            update_tracker: req.update_tracker,
        }
    }
}

/// Fetch, rank, generate documents, record in the tracker
pub struct Pipeline {
    search: CriteriaSettings,
    criteria: MatchCriteria,
    ranker: Ranker,
    fetchers: Vec<Arc<dyn JobFetcher>>,
    documents: Option<Arc<DocumentGenerator>>,
    tracker: Arc<dyn TrackerSink>,
    store: RunStore,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        search: CriteriaSettings,
        tracker: Arc<dyn TrackerSink>,
        store: RunStore,
    ) -> Result<Self, PipelineError> {
        let criteria = search.to_criteria()?;

        Ok(Self {
            search,
            criteria,
            ranker: Ranker::keyword(),
            fetchers: Vec::new(),
            documents: None,
            tracker,
            store,
            run_lock: Mutex::new(()),
        })
    }

    /// Rank with `ranker`, optionally replacing the configured threshold
    pub fn with_ranker(mut self, ranker: Ranker, min_match_score: Option<f64>) -> Result<Self, PipelineError> {
        if let Some(threshold) = min_match_score {
            self.criteria = self.criteria.with_min_match_score(threshold)?;
        }
        self.ranker = ranker;
        Ok(self)
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn JobFetcher>) -> Self {
        self.fetchers.retain(|f| f.source() != fetcher.source());
        self.fetchers.push(fetcher);
        self
    }

    pub fn with_documents(mut self, documents: Arc<DocumentGenerator>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Wire every collaborator from configuration
    pub async fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        let tracker: Arc<dyn TrackerSink> = match settings.tracker.backend {
            TrackerBackend::File => Arc::new(FileTracker::new(&settings.tracker.data_dir)),
            TrackerBackend::Postgres => Arc::new(PostgresTracker::from_settings(&settings.tracker).await?),
        };
        let store = RunStore::new(&settings.tracker.data_dir);

        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(&settings.llm)?);

        let (ranker, threshold) = match settings.scoring.strategy {
            StrategyKind::Keyword => (Ranker::keyword(), None),
            StrategyKind::Model => {
                let cache = ScoreCache::new(settings.cache.max_capacity, settings.cache.ttl_secs);
                let strategy = ModelStrategy::new(llm.clone()).with_cache(cache);
                (Ranker::new(Arc::new(strategy)), Some(settings.scoring.model_min_match_score))
            }
        };

        let mut pipeline = Self::new(settings.criteria.clone(), tracker, store)?
            .with_ranker(ranker, threshold)?
            .with_fetcher(Arc::new(ApifyClient::new(&settings.sources.apify)?))
            .with_fetcher(Arc::new(CareerPageScraper::new(&settings.sources.careers)?));

        match DocumentGenerator::from_settings(llm, &settings.documents).await {
            Ok(generator) => pipeline = pipeline.with_documents(Arc::new(generator)),
            Err(e) => tracing::warn!("Document generation disabled: {}", e),
        }

        tracing::info!(
            "Pipeline ready: {} strategy, {} tracker",
            pipeline.ranker.strategy_name(),
            pipeline.tracker.name()
        );
        Ok(pipeline)
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    pub fn tracker(&self) -> Arc<dyn TrackerSink> {
        self.tracker.clone()
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    fn fetcher(&self, source: JobSource) -> Result<&Arc<dyn JobFetcher>, PipelineError> {
        self.fetchers
            .iter()
            .find(|f| f.source() == source)
            .ok_or_else(|| PipelineError::Unavailable(format!("no fetcher for {:?}", source)))
    }

    /// Run the whole pipeline once. Runs are serialized.
    pub async fn run(&self, options: RunOptions) -> Result<RunSummary, PipelineError> {
        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let criteria = match options.min_match_score {
            Some(threshold) => self.criteria.with_min_match_score(threshold)?,
            None => self.criteria.clone(),
        };

        tracing::info!(%run_id, source = ?options.source, "Pipeline run started");

        let fetcher = self.fetcher(options.source)?;
        let query = FetchQuery::from_criteria(&self.search, options.location.clone(), None);
        let jobs = fetcher.fetch(&query).await?;
        let jobs_found = jobs.len();
        self.store.save_raw(&jobs).await?;
        tracing::info!(%run_id, "Found {} jobs", jobs_found);

        let max_jobs = options.max_jobs.unwrap_or(self.search.max_jobs_per_run);
        let outcome = self.ranker.rank(jobs, &criteria, Some(max_jobs)).await;
        let mut ranked = outcome.jobs;
        tracing::info!(
            %run_id,
            "{} jobs passed filters at {:.0}% ({} could not be scored)",
            ranked.len(),
            criteria.min_match_score() * 100.0,
            outcome.failed
        );

        let mut documents_generated = 0;
        if options.generate_documents && !ranked.is_empty() {
            match &self.documents {
                Some(generator) => documents_generated = generator.generate_all(&mut ranked).await,
                None => tracing::warn!(%run_id, "Skipping document generation: no resume configured"),
            }
        }

        self.store.save_ranked(&ranked).await?;

        let mut tracker_rows_added = 0;
        if options.update_tracker && !ranked.is_empty() {
            tracker_rows_added = self.tracker.record_jobs(&ranked).await?.added;
        }

        let summary = RunSummary {
            run_id,
            source: options.source,
            strategy: self.ranker.strategy_name().to_string(),
            jobs_found,
            qualified: ranked.len(),
            match_rate: RunSummary::match_rate(jobs_found, ranked.len()),
            documents_generated,
            tracker_rows_added,
            started_at,
            finished_at: Utc::now(),
            jobs: ranked,
        };

        tracing::info!(
            %run_id,
            "Pipeline completed: {} found, {} qualified ({:.1}%)",
            summary.jobs_found,
            summary.qualified,
            summary.match_rate
        );
        Ok(summary)
    }

    /// Generate documents for tracked rows still marked `New`
    pub async fn process_pending(&self) -> Result<ProcessSummary, PipelineError> {
        let generator = self
            .documents
            .as_ref()
            .ok_or_else(|| PipelineError::Unavailable("no resume configured".into()))?;

        let pending = self.tracker.list(Some(ApplicationStatus::New)).await?;
        let mut summary = ProcessSummary {
            pending: pending.len(),
            ..ProcessSummary::default()
        };
        tracing::info!("Found {} new job listings", pending.len());

        for (i, record) in pending.iter().enumerate() {
            tracing::info!("Processing job {}/{}: {} at {}", i + 1, pending.len(), record.position, record.company);

            let status = match generator.generate(&record.to_posting(), i + 1).await {
                Ok(_) => {
                    summary.processed += 1;
                    ApplicationStatus::Processed
                }
                Err(e) => {
                    tracing::error!("Error processing {} - {}: {}", record.company, record.position, e);
                    summary.failed += 1;
                    ApplicationStatus::Error
                }
            };
            self.tracker.set_status(&record.company, &record.position, status).await?;
        }

        Ok(summary)
    }
}

/// Turns recruiter emails into tracker status updates
pub struct EmailMonitor {
    mailbox: Arc<dyn Mailbox>,
    tracker: Arc<dyn TrackerSink>,
    keywords: EmailKeywords,
}

impl EmailMonitor {
    pub fn new(mailbox: Arc<dyn Mailbox>, tracker: Arc<dyn TrackerSink>, keywords: EmailKeywords) -> Self {
        Self {
            mailbox,
            tracker,
            keywords,
        }
    }

    /// One pass over unread mail.
    ///
    /// Messages are marked read only once a company and position could be
    /// extracted; all updates are applied after the inbox pass.
    pub async fn poll(&self) -> Result<PollSummary, PipelineError> {
        let messages = self.mailbox.unread().await?;
        let mut summary = PollSummary {
            messages: messages.len(),
            ..PollSummary::default()
        };

        if messages.is_empty() {
            tracing::info!("No new job-related emails found");
            return Ok(summary);
        }

        let mut updates = Vec::new();
        for message in &messages {
            let Some(status) = classify_email(&message.subject, &message.body, &self.keywords) else {
                continue;
            };
            summary.classified += 1;
            tracing::info!("{}: {} (from {})", status, message.subject, message.sender);

            let Some(info) = extract_company_position(&message.subject, &message.body) else {
                tracing::warn!("Could not extract company/position from '{}'", message.subject);
                summary.unmatched += 1;
                continue;
            };

            updates.push(StatusUpdate {
                company: info.company,
                position: info.position,
                status,
                notes: format!(
                    "Email received: {}\nSubject: {}",
                    Utc::now().format("%Y-%m-%d"),
                    message.subject
                ),
            });
            self.mailbox.mark_read(&message.id).await?;
        }

        summary.updates = updates.len();
        for update in &updates {
            if self.tracker.apply_status_update(update).await? {
                summary.applied += 1;
            }
        }

        tracing::info!(
            "Email monitoring complete: {} classified, {} applied",
            summary.classified,
            summary.applied
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailMessage, JobPosting};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct StaticFetcher(Vec<JobPosting>);

    #[async_trait]
    impl JobFetcher for StaticFetcher {
        async fn fetch(&self, _: &FetchQuery) -> Result<Vec<JobPosting>, FetchError> {
            Ok(self.0.clone())
        }

        fn source(&self) -> JobSource {
            JobSource::JobBoards
        }
    }

    struct FakeMailbox {
        messages: Vec<EmailMessage>,
        read: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailbox for FakeMailbox {
        async fn unread(&self) -> Result<Vec<EmailMessage>, MailError> {
            Ok(self.messages.clone())
        }

        async fn mark_read(&self, id: &str) -> Result<(), MailError> {
            self.read.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    fn search() -> CriteriaSettings {
        CriteriaSettings {
            keywords: vec!["python".into(), "sql".into()],
            exclude_keywords: vec!["senior".into()],
            min_match_score: 0.5,
            ..CriteriaSettings::default()
        }
    }

    fn postings() -> Vec<JobPosting> {
        vec![
            JobPosting::new("Data Analyst", "SAP", "https://a").with_description("python and sql"),
            JobPosting::new("Senior Analyst", "SAP", "https://b").with_description("python and sql"),
            JobPosting::new("Office Manager", "BMW", "https://c").with_description("excel"),
        ]
    }

    #[tokio::test]
    async fn test_run_ranks_stores_and_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(FileTracker::new(dir.path()));
        let pipeline = Pipeline::new(search(), tracker.clone(), RunStore::new(dir.path()))
            .unwrap()
            .with_fetcher(Arc::new(StaticFetcher(postings())));

        let summary = pipeline.run(RunOptions::default()).await.unwrap();

        assert_eq!(summary.jobs_found, 3);
        assert_eq!(summary.qualified, 1);
        assert!((summary.match_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.documents_generated, 0);
        assert_eq!(summary.tracker_rows_added, 1);
        assert_eq!(summary.strategy, "keyword");
        assert_eq!(summary.jobs[0].match_score, Some(1.0));

        assert_eq!(pipeline.store().latest_raw().await.unwrap().len(), 3);
        assert_eq!(pipeline.store().latest_ranked().await.unwrap().len(), 1);
        assert_eq!(tracker.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_caps_ranked_at_max_jobs_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let search = CriteriaSettings {
            max_jobs_per_run: 2,
            ..search()
        };
        let many: Vec<JobPosting> = (0..5)
            .map(|i| JobPosting::new(format!("Analyst {}", i), "SAP", format!("https://a/{}", i)).with_description("python sql"))
            .collect();
        let pipeline = Pipeline::new(search, Arc::new(FileTracker::new(dir.path())), RunStore::new(dir.path()))
            .unwrap()
            .with_fetcher(Arc::new(StaticFetcher(many)));

        let summary = pipeline.run(RunOptions::default()).await.unwrap();
        assert_eq!(summary.jobs_found, 5);
        assert_eq!(summary.qualified, 2);
        assert_eq!(summary.jobs[0].title, "Analyst 0");

        let options = RunOptions {
            max_jobs: Some(4),
            ..RunOptions::default()
        };
        assert_eq!(pipeline.run(options).await.unwrap().qualified, 4);
    }

    #[tokio::test]
    async fn test_run_rejects_bad_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(search(), Arc::new(FileTracker::new(dir.path())), RunStore::new(dir.path()))
            .unwrap()
            .with_fetcher(Arc::new(StaticFetcher(postings())));

        let options = RunOptions {
            min_match_score: Some(1.2),
            ..RunOptions::default()
        };
        assert!(matches!(
            pipeline.run(options).await,
            Err(PipelineError::Configuration(ConfigurationError::ThresholdOutOfRange(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(search(), Arc::new(FileTracker::new(dir.path())), RunStore::new(dir.path())).unwrap();

        let options = RunOptions {
            source: JobSource::CompanyCareers,
            ..RunOptions::default()
        };
        assert!(matches!(pipeline.run(options).await, Err(PipelineError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_process_pending_requires_generator() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(search(), Arc::new(FileTracker::new(dir.path())), RunStore::new(dir.path())).unwrap();
        assert!(matches!(pipeline.process_pending().await, Err(PipelineError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_email_monitor_poll() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(FileTracker::new(dir.path()));
        tracker
            .record_jobs(&[JobPosting::new("Data Analyst", "Celonis", "https://a")])
            .await
            .unwrap();

        let mailbox = Arc::new(FakeMailbox {
            messages: vec![
                EmailMessage {
                    id: "1".into(),
                    subject: "Interview: your application for Data Analyst at Celonis".into(),
                    sender: "recruiting@celonis.com".into(),
                    body: String::new(),
                },
                EmailMessage {
                    id: "2".into(),
                    subject: "Unfortunately".into(),
                    sender: "hr@example.com".into(),
                    body: "We went with other candidates".into(),
                },
                EmailMessage {
                    id: "3".into(),
                    subject: "Newsletter".into(),
                    sender: "news@example.com".into(),
                    body: "Weekly digest".into(),
                },
            ],
            read: StdMutex::new(Vec::new()),
        });

        let monitor = EmailMonitor::new(mailbox.clone(), tracker.clone(), EmailKeywords::default());
        let summary = monitor.poll().await.unwrap();

        assert_eq!(summary.messages, 3);
        assert_eq!(summary.classified, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.updates, 1);
        assert_eq!(summary.applied, 1);
        assert_eq!(*mailbox.read.lock().unwrap(), vec!["1".to_string()]);

        let record = &tracker.list(None).await.unwrap()[0];
        assert_eq!(record.status, ApplicationStatus::InterviewScheduled);
        assert!(record.notes.starts_with("Email received: "));
        assert!(record.notes.ends_with("Subject: Interview: your application for Data Analyst at Celonis"));
    }
}
