use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::{ConfigurationError, EmailKeywords, MatchCriteria};
use crate::models::CompanyCareer;

/// Application configuration
///
/// Every section has defaults, so an empty configuration still boots.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub criteria: CriteriaSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub sources: SourcesSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub documents: DocumentSettings,
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }

/// Search criteria for the candidate
#[derive(Debug, Clone, Deserialize)]
pub struct CriteriaSettings {
    #[serde(default = "default_job_titles")]
    pub job_titles: Vec<String>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "default_min_match_score")]
    pub min_match_score: f64,
    #[serde(default = "default_max_jobs_per_run")]
    pub max_jobs_per_run: usize,
}

impl Default for CriteriaSettings {
    fn default() -> Self {
        Self {
            job_titles: default_job_titles(),
            keywords: default_keywords(),
            exclude_keywords: default_exclude_keywords(),
            locations: default_locations(),
            min_match_score: default_min_match_score(),
            max_jobs_per_run: default_max_jobs_per_run(),
        }
    }
}

impl CriteriaSettings {
    /// Validated criteria for the keyword strategy
    pub fn to_criteria(&self) -> Result<MatchCriteria, ConfigurationError> {
        MatchCriteria::new(&self.keywords, &self.exclude_keywords, self.min_match_score)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_job_titles() -> Vec<String> {
    strings(&[
        "Junior IT Project Manager",
        "IT Project Manager",
        "Junior Project Manager",
        "Data Analyst",
        "Junior Data Analyst",
        "Business Analyst",
        "Project Coordinator",
    ])
}

fn default_keywords() -> Vec<String> {
    strings(&[
        "python",
        "sql",
        "data analysis",
        "etl",
        "project management",
        "agile",
        "scrum",
        "stakeholder",
        "waterfall",
        "confluence",
        "jira",
        "powerbi",
        "tableau",
        "excel",
    ])
}

fn default_exclude_keywords() -> Vec<String> {
    strings(&["senior", "lead", "principal", "director", "head of"])
}

fn default_locations() -> Vec<String> {
    strings(&["Munich", "München", "Bavaria", "Bayern", "Germany", "Remote"])
}

fn default_min_match_score() -> f64 { 0.75 }
fn default_max_jobs_per_run() -> usize { 20 }

/// Which scoring strategy the pipeline ranks with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Keyword,
    Model,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Threshold used instead of `criteria.min_match_score` with the model strategy
    #[serde(default = "default_model_min_match_score")]
    pub model_min_match_score: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            model_min_match_score: default_model_min_match_score(),
        }
    }
}

fn default_model_min_match_score() -> f64 { 0.80 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesSettings {
    #[serde(default)]
    pub apify: ApifySettings,
    #[serde(default)]
    pub careers: CareerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApifySettings {
    #[serde(default = "default_apify_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_apify_actor")]
    pub actor_id: String,
    #[serde(default = "default_apify_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,
}

impl Default for ApifySettings {
    fn default() -> Self {
        Self {
            base_url: default_apify_base_url(),
            api_key: String::new(),
            actor_id: default_apify_actor(),
            timeout_secs: default_apify_timeout_secs(),
            description_limit: default_description_limit(),
        }
    }
}

fn default_apify_base_url() -> String { "https://api.apify.com".to_string() }
fn default_apify_actor() -> String { "misceres~linkedin-jobs-scraper".to_string() }
fn default_apify_timeout_secs() -> u64 { 300 }
fn default_description_limit() -> usize { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct CareerSettings {
    #[serde(default)]
    pub companies: Vec<CompanyCareer>,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_scrape_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fallback_location")]
    pub default_location: String,
}

impl Default for CareerSettings {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_scrape_timeout_secs(),
            max_cards: default_max_cards(),
            user_agent: default_user_agent(),
            default_location: default_fallback_location(),
        }
    }
}

fn default_request_delay_ms() -> u64 { 2000 }
fn default_scrape_timeout_secs() -> u64 { 15 }
fn default_max_cards() -> usize { 50 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}
fn default_fallback_location() -> String { "Munich".to_string() }

/// Chat completion backend
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-4".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 2000 }
fn default_llm_timeout_secs() -> u64 { 120 }

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSettings {
    /// Plain-text resume; takes precedence over `profile_text`
    pub resume_path: Option<PathBuf>,
    pub profile_text: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
    #[serde(default = "default_min_resume_chars")]
    pub min_resume_chars: usize,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            resume_path: None,
            profile_text: None,
            output_dir: default_output_dir(),
            max_documents: default_max_documents(),
            min_resume_chars: default_min_resume_chars(),
        }
    }
}

fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_max_documents() -> usize { 20 }
fn default_min_resume_chars() -> usize { 100 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerBackend {
    #[default]
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSettings {
    #[serde(default)]
    pub backend: TrackerBackend,
    /// Directory for run artifacts and the file tracker
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub database_url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            backend: TrackerBackend::default(),
            data_dir: default_data_dir(),
            database_url: String::new(),
            max_connections: None,
            min_connections: None,
            acquire_timeout_secs: None,
        }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }

/// Gmail inbox monitoring
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_gmail_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_gmail_user")]
    pub user_id: String,
    #[serde(default = "default_gmail_query")]
    pub query: String,
    #[serde(default = "default_gmail_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub keywords: EmailKeywords,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            base_url: default_gmail_base_url(),
            access_token: String::new(),
            user_id: default_gmail_user(),
            query: default_gmail_query(),
            timeout_secs: default_gmail_timeout_secs(),
            keywords: EmailKeywords::default(),
        }
    }
}

fn default_gmail_base_url() -> String { "https://gmail.googleapis.com/gmail/v1".to_string() }
fn default_gmail_user() -> String { "me".to_string() }
fn default_gmail_query() -> String {
    "is:unread newer_than:7d (from:noreply OR from:recruiting OR from:hr OR subject:application OR subject:interview OR subject:opportunity)"
        .to_string()
}
fn default_gmail_timeout_secs() -> u64 { 30 }

/// Cache for model scores
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> u64 { 10_000 }
fn default_cache_ttl_secs() -> u64 { 86_400 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Serde defaults on each section
    /// 2. `config/default.toml`, then `config/local.toml`
    /// 3. Environment variables prefixed with `JOBMATCH`,
    ///    e.g. `JOBMATCH__SERVER__PORT` -> `server.port`
    /// 4. Well-known secret variables such as `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("JOBMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Secrets conventionally provided under their own names
const SECRET_VARS: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "llm.api_key"),
    ("APIFY_API_KEY", "sources.apify.api_key"),
    ("DATABASE_URL", "tracker.database_url"),
    ("GMAIL_ACCESS_TOKEN", "email.access_token"),
];

/// Override config keys from well-known secret variables when they are set
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in SECRET_VARS {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                builder = builder.set_override(*key, value)?;
            }
        }
    }

    builder.build()
}
