use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Where a posting was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSource {
    #[default]
    #[serde(alias = "linkedin", alias = "indeed", alias = "stepstone")]
    JobBoards,
    CompanyCareers,
}

impl JobSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::JobBoards => "job_boards",
            JobSource::CompanyCareers => "company_careers",
        }
    }

    /// Board names such as `linkedin` read as [`JobSource::JobBoards`]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "job_boards" | "linkedin" | "indeed" | "stepstone" => Some(JobSource::JobBoards),
            "company_careers" => Some(JobSource::CompanyCareers),
            _ => None,
        }
    }
}

/// Tracking status of a posting / application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "To Apply")]
    ToApply,
    #[serde(rename = "Application Received")]
    ApplicationReceived,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    #[serde(rename = "Offer Received")]
    OfferReceived,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Processed")]
    Processed,
    #[serde(rename = "Error")]
    Error,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "New",
            ApplicationStatus::ToApply => "To Apply",
            ApplicationStatus::ApplicationReceived => "Application Received",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::OfferReceived => "Offer Received",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Processed => "Processed",
            ApplicationStatus::Error => "Error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let status = match value.trim().to_lowercase().as_str() {
            "new" => ApplicationStatus::New,
            "to apply" => ApplicationStatus::ToApply,
            "application received" => ApplicationStatus::ApplicationReceived,
            "interview scheduled" => ApplicationStatus::InterviewScheduled,
            "offer received" => ApplicationStatus::OfferReceived,
            "rejected" => ApplicationStatus::Rejected,
            "processed" => ApplicationStatus::Processed,
            "error" => ApplicationStatus::Error,
            _ => return None,
        };
        Some(status)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single job listing flowing through the pipeline.
///
/// Deserialization goes through [`RawJobPosting`] so that every defaulting
/// rule lives in one place. Serialization writes the wire values back the way
/// they arrived: the link under `url` or `link`, the original source label,
/// and the posting date verbatim under its original key. Fields the pipeline
/// does not know about are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawJobPosting", into = "Map<String, Value>")]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub link: String,
    pub source: JobSource,
    pub match_score: Option<f64>,
    pub documents_generated: Option<bool>,
    pub status: Option<ApplicationStatus>,
    pub last_updated: Option<DateTime<Utc>>,
    pub extra: Map<String, Value>,
    link_key: LinkKey,
    /// Source label as received, with the source it was read as
    source_label: Option<(JobSource, String)>,
    posted: Option<PostedDate>,
}

/// Key the link arrived under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LinkKey {
    #[default]
    Link,
    Url,
}

impl LinkKey {
    fn as_str(&self) -> &'static str {
        match self {
            LinkKey::Link => "link",
            LinkKey::Url => "url",
        }
    }
}

/// Posting date exactly as received
#[derive(Debug, Clone, PartialEq)]
struct PostedDate {
    key: &'static str,
    raw: Value,
}

impl JobPosting {
    pub fn new(title: impl Into<String>, company: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: None,
            description: None,
            link: link.into(),
            source: JobSource::JobBoards,
            match_score: None,
            documents_generated: None,
            status: None,
            last_updated: None,
            extra: Map::new(),
            link_key: LinkKey::Link,
            source_label: None,
            posted: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_source(mut self, source: JobSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_posted_date(mut self, posted: DateTime<Utc>) -> Self {
        self.posted = Some(PostedDate {
            key: "posted_date",
            raw: Value::String(posted.to_rfc3339_opts(SecondsFormat::Secs, true)),
        });
        self
    }

    /// Description text, empty when absent
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Location text, empty when absent
    pub fn location_text(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }

    /// Posting date, when the received value is RFC 3339 or `YYYY-MM-DD`
    pub fn posted_date(&self) -> Option<DateTime<Utc>> {
        self.posted.as_ref().and_then(|p| parse_timestamp(&p.raw))
    }

    /// Received posting date, parseable or not
    pub fn posted_date_raw(&self) -> Option<&Value> {
        self.posted.as_ref().map(|p| &p.raw)
    }

    /// Source as written on output: the received label unless `source` changed since
    pub fn source_label(&self) -> &str {
        match &self.source_label {
            Some((read_as, label)) if *read_as == self.source => label,
            _ => self.source.as_str(),
        }
    }

    /// Stable identity used for caching and de-duplication
    pub fn fingerprint(&self) -> String {
        if self.link.is_empty() {
            format!("{}|{}", self.company.to_lowercase(), self.title.to_lowercase())
        } else {
            self.link.clone()
        }
    }
}

/// Wire shape of a posting as produced by fetchers or earlier runs
#[derive(Debug, Default, Deserialize)]
struct RawJobPosting {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default, deserialize_with = "present")]
    posted_date: Option<Value>,
    #[serde(default, rename = "postedDate", deserialize_with = "present")]
    posted_date_camel: Option<Value>,
    #[serde(default)]
    match_score: Option<f64>,
    #[serde(default)]
    documents_generated: Option<bool>,
    #[serde(default)]
    status: Option<ApplicationStatus>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// `Some` for any present value, `null` included
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<RawJobPosting> for JobPosting {
    fn from(raw: RawJobPosting) -> Self {
        let mut extra = raw.extra;

        // a non-empty `link` wins; the other key is kept as received
        let (link, link_key) = match (raw.link, raw.url) {
            (Some(link), url) if !link.is_empty() => {
                if let Some(url) = url {
                    extra.insert("url".into(), Value::String(url));
                }
                (link, LinkKey::Link)
            }
            (link, Some(url)) => {
                if let Some(link) = link {
                    extra.insert("link".into(), Value::String(link));
                }
                (url, LinkKey::Url)
            }
            (link, None) => (link.unwrap_or_default(), LinkKey::Link),
        };

        let posted = match (raw.posted_date, raw.posted_date_camel) {
            (Some(raw), camel) => {
                if let Some(camel) = camel {
                    extra.insert("postedDate".into(), camel);
                }
                Some(PostedDate { key: "posted_date", raw })
            }
            (None, Some(raw)) => Some(PostedDate { key: "postedDate", raw }),
            (None, None) => None,
        };

        let source = raw.source.as_deref().and_then(JobSource::parse).unwrap_or_default();

        JobPosting {
            title: raw.title.unwrap_or_default(),
            company: raw.company.unwrap_or_default(),
            location: raw.location,
            description: raw.description,
            link,
            source,
            match_score: raw.match_score,
            documents_generated: raw.documents_generated,
            status: raw.status,
            last_updated: raw.last_updated,
            extra,
            link_key,
            source_label: raw.source.map(|label| (source, label)),
            posted,
        }
    }
}

impl From<JobPosting> for Map<String, Value> {
    fn from(posting: JobPosting) -> Self {
        let source = posting.source_label().to_string();
        let mut map = posting.extra;

        map.insert("title".into(), Value::String(posting.title));
        map.insert("company".into(), Value::String(posting.company));
        if let Some(location) = posting.location {
            map.insert("location".into(), Value::String(location));
        }
        if let Some(description) = posting.description {
            map.insert("description".into(), Value::String(description));
        }
        map.insert(posting.link_key.as_str().into(), Value::String(posting.link));
        map.insert("source".into(), Value::String(source));
        if let Some(posted) = posting.posted {
            map.insert(posted.key.into(), posted.raw);
        }
        if let Some(score) = posting.match_score {
            map.insert("match_score".into(), Value::from(score));
        }
        if let Some(generated) = posting.documents_generated {
            map.insert("documents_generated".into(), Value::Bool(generated));
        }
        if let Some(status) = posting.status {
            map.insert("status".into(), Value::String(status.as_str().into()));
        }
        if let Some(updated) = posting.last_updated {
            map.insert(
                "last_updated".into(),
                Value::String(updated.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            );
        }
        map
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// A row in the application tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub application_date: NaiveDate,
    pub status: ApplicationStatus,
    /// Canonical 0-1 score; percentages are a rendering concern
    #[serde(default)]
    pub match_score: f64,
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub career_page: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl ApplicationRecord {
    /// Build a tracker row for a ranked posting
    pub fn from_posting(posting: &JobPosting, now: DateTime<Utc>) -> Self {
        let status = posting.status.unwrap_or(if posting.documents_generated == Some(true) {
            ApplicationStatus::ToApply
        } else {
            ApplicationStatus::New
        });

        let career_page = posting
            .extra
            .get("career_page")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let notes = posting
            .extra
            .get("notes")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            company: posting.company.clone(),
            position: posting.title.clone(),
            location: posting.location_text().to_string(),
            description: posting.description_text().to_string(),
            application_date: now.date_naive(),
            status,
            match_score: posting.match_score.unwrap_or(0.0),
            job_url: posting.link.clone(),
            career_page,
            last_updated: now,
            notes,
        }
    }

    /// Whether this row tracks the same job as `other`
    pub fn same_job(&self, other: &ApplicationRecord) -> bool {
        self.company.eq_ignore_ascii_case(&other.company)
            && self.position.eq_ignore_ascii_case(&other.position)
            && self.job_url == other.job_url
    }

    /// Match on company and position, ignoring case
    pub fn matches(&self, company: &str, position: &str) -> bool {
        self.company.to_lowercase() == company.to_lowercase()
            && self.position.to_lowercase() == position.to_lowercase()
    }

    /// Score rendered as a whole percentage
    pub fn match_percent(&self) -> String {
        format!("{:.0}%", self.match_score * 100.0)
    }

    /// Rebuild a posting so tracked rows can be fed to the document generator
    pub fn to_posting(&self) -> JobPosting {
        let mut posting = JobPosting::new(&self.position, &self.company, &self.job_url);
        if !self.location.is_empty() {
            posting.location = Some(self.location.clone());
        }
        if !self.description.is_empty() {
            posting.description = Some(self.description.clone());
        }
        posting.match_score = Some(self.match_score);
        posting.status = Some(self.status);
        posting
    }

    /// Append a note on a new line
    pub fn append_note(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        if self.notes.is_empty() {
            self.notes = note.to_string();
        } else {
            self.notes = format!("{}\n{}", self.notes, note);
        }
    }
}

/// Status change derived from an inbound email or entered manually
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
}

/// Inbound message as seen by the email monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub body: String,
}

/// Company whose career page is scraped directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCareer {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}
