// Service exports
pub mod apify;
pub mod cache;
pub mod careers;
pub mod documents;
pub mod fetcher;
pub mod gmail;
pub mod model_strategy;
pub mod openai;
pub mod postgres;
pub mod store;
pub mod tracker;

pub use apify::ApifyClient;
pub use cache::{CacheKey, CacheStats, ScoreCache};
pub use careers::{CareerPage, CareerPageScraper};
pub use documents::{DocumentError, DocumentGenerator, GeneratedDocuments};
pub use fetcher::{FetchError, FetchQuery, JobFetcher};
pub use gmail::{GmailClient, MailError, Mailbox};
pub use model_strategy::ModelStrategy;
pub use openai::{CompletionRequest, LanguageModel, LlmError, OpenAiClient};
pub use postgres::PostgresTracker;
pub use store::{RunStore, StoreError};
pub use tracker::{FileTracker, RecordOutcome, TrackerError, TrackerSink};
