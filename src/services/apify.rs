use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ApifySettings;
use crate::models::{JobPosting, JobSource};
use crate::services::fetcher::{FetchError, FetchQuery, JobFetcher};

/// Job-board fetcher backed by an Apify LinkedIn jobs actor
///
/// Runs the actor synchronously and reads the dataset items from the same
/// response.
pub struct ApifyClient {
    base_url: String,
    api_key: String,
    actor_id: String,
    description_limit: usize,
    client: Client,
}

impl ApifyClient {
    pub fn new(settings: &ApifySettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            actor_id: settings.actor_id.clone(),
            description_limit: settings.description_limit,
            client,
        })
    }

    /// Actor input: the first three titles OR-ed together, the requested
    /// location or the first two configured ones, and the item cap.
    pub fn run_input(query: &FetchQuery) -> Value {
        let keywords = query
            .job_titles
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" OR ");

        let locations: Vec<String> = match &query.location {
            Some(location) => vec![location.clone()],
            None => query.locations.iter().take(2).cloned().collect(),
        };

        json!({
            "keywords": keywords,
            "locations": locations,
            "maxItems": query.max_items,
        })
    }

    /// Convert one dataset item into a posting
    pub fn to_posting(&self, item: &Value) -> Option<JobPosting> {
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| item.get(*n).and_then(Value::as_str))
                .map(str::to_string)
        };

        let description = field(&["description", "descriptionText"])
            .map(|d| d.chars().take(self.description_limit).collect::<String>())
            .unwrap_or_default();

        let raw = json!({
            "title": field(&["title"]),
            "company": field(&["company", "companyName"]),
            "location": field(&["location"]),
            "description": description,
            "link": field(&["url", "link", "jobUrl"]),
            "source": JobSource::JobBoards,
            "posted_date": field(&["postedDate", "postedAt", "publishedAt"]),
        });

        match serde_json::from_value::<JobPosting>(raw) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::warn!("Skipping malformed Apify item: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl JobFetcher for ApifyClient {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<JobPosting>, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::NotConfigured("APIFY_API_KEY is not set".into()));
        }

        let url = format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items?token={}",
            self.base_url.trim_end_matches('/'),
            self.actor_id,
            urlencoding::encode(&self.api_key)
        );

        let input = Self::run_input(query);
        tracing::info!(
            "Searching job boards for {} in {}",
            input["keywords"],
            input["locations"]
        );

        let response = self.client.post(&url).json(&input).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(FetchError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                return Err(FetchError::ApiError(format!("Actor run failed: {} - {}", status, body)));
            }
            _ => {}
        }

        let json: Value = response.json().await?;
        let items = json
            .as_array()
            .ok_or_else(|| FetchError::InvalidResponse("Expected an array of dataset items".into()))?;

        let jobs: Vec<JobPosting> = items.iter().filter_map(|item| self.to_posting(item)).collect();

        tracing::debug!("Fetched {} postings from Apify ({} items)", jobs.len(), items.len());
        Ok(jobs)
    }

    fn source(&self) -> JobSource {
        JobSource::JobBoards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> FetchQuery {
        FetchQuery {
            job_titles: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            keywords: vec![],
            locations: vec!["Munich".into(), "München".into(), "Bavaria".into()],
            location: None,
            max_items: 20,
        }
    }

    #[test]
    fn test_run_input() {
        let input = ApifyClient::run_input(&query());
        assert_eq!(input["keywords"], "A OR B OR C");
        assert_eq!(input["locations"], json!(["Munich", "München"]));
        assert_eq!(input["maxItems"], 20);
    }

    #[test]
    fn test_run_input_location_override() {
        let mut query = query();
        query.location = Some("Berlin".into());
        assert_eq!(ApifyClient::run_input(&query)["locations"], json!(["Berlin"]));
    }

    #[test]
    fn test_item_mapping_truncates_description() {
        let client = ApifyClient::new(&ApifySettings::default()).unwrap();
        let item = json!({
            "title": "Data Analyst",
            "companyName": "Celonis",
            "location": "Munich, Bavaria, Germany",
            "description": "x".repeat(800),
            "url": "https://www.linkedin.com/jobs/view/1",
            "postedDate": "2024-05-01"
        });

        let posting = client.to_posting(&item).unwrap();
        assert_eq!(posting.company, "Celonis");
        assert_eq!(posting.link, "https://www.linkedin.com/jobs/view/1");
        assert_eq!(posting.description_text().len(), 500);
        assert_eq!(posting.source, JobSource::JobBoards);
        assert!(posting.posted_date().is_some());
    }
}
