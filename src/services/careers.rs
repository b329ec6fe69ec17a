use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::time::Duration;

use crate::config::CareerSettings;
use crate::core::{detect_location, matches_title_criteria};
use crate::models::{CompanyCareer, JobPosting, JobSource};
use crate::services::fetcher::{FetchError, FetchQuery, JobFetcher};

/// Listing selectors, tried in order until one matches
const CARD_SELECTORS: &[&str] = &[
    ".job-listing",
    ".position",
    "[class*=\"job\"]",
    "a[href*=\"/careers/\"]",
    "a[href*=\"/jobs/\"]",
];

const MAX_TITLE_CHARS: usize = 200;

/// Places recognised in a listing card
const CARD_LOCATIONS: &[&str] = &["Munich", "München", "Bavaria", "Bayern", "Germany"];

/// Scrapes configured company career pages
pub struct CareerPageScraper {
    companies: Vec<CompanyCareer>,
    request_delay: Duration,
    max_cards: usize,
    default_location: String,
    client: Client,
}

impl CareerPageScraper {
    pub fn new(settings: &CareerSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            companies: settings.companies.clone(),
            request_delay: Duration::from_millis(settings.request_delay_ms),
            max_cards: settings.max_cards,
            default_location: settings.default_location.clone(),
            client,
        })
    }

    async fn scrape_company(&self, company: &CompanyCareer, query: &FetchQuery) -> Result<Vec<JobPosting>, FetchError> {
        let response = self.client.get(&company.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::ApiError(format!(
                "{} returned {}",
                company.url,
                response.status()
            )));
        }

        let html = response.text().await?;
        let page = CareerPage {
            company,
            job_titles: &query.job_titles,
            keywords: &query.keywords,
            max_cards: self.max_cards,
            default_location: &self.default_location,
        };

        Ok(page.parse(&html))
    }
}

#[async_trait]
impl JobFetcher for CareerPageScraper {
    /// One company's failure is logged and skipped
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<JobPosting>, FetchError> {
        let mut jobs = Vec::new();

        for (i, company) in self.companies.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            tracing::info!("Scraping {}...", company.name);
            match self.scrape_company(company, query).await {
                Ok(found) => {
                    tracing::info!("Found {} jobs from {}", found.len(), company.name);
                    jobs.extend(found);
                }
                Err(e) => tracing::error!("Error scraping {}: {}", company.name, e),
            }
        }

        tracing::info!("Total jobs found from company pages: {}", jobs.len());
        Ok(jobs)
    }

    fn source(&self) -> JobSource {
        JobSource::CompanyCareers
    }
}

/// Parsing context for one company's page
pub struct CareerPage<'a> {
    pub company: &'a CompanyCareer,
    pub job_titles: &'a [String],
    pub keywords: &'a [String],
    pub max_cards: usize,
    pub default_location: &'a str,
}

impl CareerPage<'_> {
    /// Extract matching postings from the page HTML
    pub fn parse(&self, html: &str) -> Vec<JobPosting> {
        let document = Html::parse_document(html);
        let base = Url::parse(&self.company.url).ok();
        let known: Vec<String> = CARD_LOCATIONS.iter().map(|s| s.to_string()).collect();

        let cards = CARD_SELECTORS
            .iter()
            .filter_map(|sel| Selector::parse(sel).ok())
            .map(|selector| document.select(&selector).collect::<Vec<_>>())
            .find(|cards| !cards.is_empty())
            .unwrap_or_default();

        cards
            .into_iter()
            .take(self.max_cards)
            .filter_map(|card| {
                let title = extract_title(&card)?;
                let link = extract_link(&card, base.as_ref())?;

                if !matches_title_criteria(&title, self.job_titles, &self.company.keywords, self.keywords) {
                    return None;
                }

                let text = card.text().collect::<String>();
                let location = detect_location(&text, &known).unwrap_or(self.default_location);

                let mut posting = JobPosting::new(title, &self.company.name, link)
                    .with_location(location)
                    .with_description("")
                    .with_source(JobSource::CompanyCareers);
                posting
                    .extra
                    .insert("career_page".to_string(), Value::String(self.company.url.clone()));
                Some(posting)
            })
            .collect()
    }
}

/// Visible text, then `title`, then `aria-label`
fn extract_title(card: &ElementRef) -> Option<String> {
    let text = card.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let title = if !text.is_empty() {
        text
    } else {
        card.value()
            .attr("title")
            .or_else(|| card.value().attr("aria-label"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_CHARS).collect())
}

/// Own `href` or the first descendant anchor, resolved against the page URL
fn extract_link(card: &ElementRef, base: Option<&Url>) -> Option<String> {
    let href = card.value().attr("href").map(str::to_string).or_else(|| {
        let anchor = Selector::parse("a[href]").ok()?;
        card.select(&anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    })?;

    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http") {
        return Some(href.to_string());
    }

    base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
}
