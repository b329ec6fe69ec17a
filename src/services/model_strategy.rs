use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::core::{percent_to_unit, MatchCriteria, ScoringError, ScoringStrategy};
use crate::models::JobPosting;
use crate::services::cache::{CacheKey, ScoreCache};
use crate::services::openai::{CompletionRequest, LanguageModel};

const SYSTEM_PROMPT: &str =
    "You are a recruiter rating how well a job posting fits a candidate. Reply with a single number from 0 to 100.";

/// Scores postings by asking a language model for a 0-100 fit rating
pub struct ModelStrategy {
    model: Arc<dyn LanguageModel>,
    cache: Option<ScoreCache>,
}

impl ModelStrategy {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model, cache: None }
    }

    pub fn with_cache(mut self, cache: ScoreCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn prompt(posting: &JobPosting, criteria: &MatchCriteria) -> String {
        format!(
            "Candidate skills: {}\n\nJob Title: {}\nCompany: {}\nLocation: {}\nDescription: {}\n\n\
             Rate the fit from 0 to 100. Return only the number.",
            criteria.keywords().join(", "),
            posting.title,
            posting.company,
            posting.location_text(),
            posting.description_text()
        )
    }
}

/// First number in the reply, as a 0-1 score
pub fn parse_rating(reply: &str) -> Result<f64, ScoringError> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let number = NUMBER
        .get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").ok())
        .as_ref()
        .ok_or_else(|| ScoringError::Unparseable(reply.to_string()))?;

    let value: f64 = number
        .find(reply)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| ScoringError::Unparseable(reply.trim().to_string()))?;

    percent_to_unit(value)
}

#[async_trait]
impl ScoringStrategy for ModelStrategy {
    async fn score(&self, posting: &JobPosting, criteria: &MatchCriteria) -> Result<f64, ScoringError> {
        let key = CacheKey::model_score(self.model.model(), posting, criteria);

        if let Some(cache) = &self.cache {
            if let Some(score) = cache.get(&key).await {
                return Ok(score);
            }
        }

        let request = CompletionRequest::new(Self::prompt(posting, criteria))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(10);

        let reply = self
            .model
            .complete(&request)
            .await
            .map_err(|e| ScoringError::Backend(e.to_string()))?;

        let score = parse_rating(&reply)?;

        if let Some(cache) = &self.cache {
            cache.insert(key, score).await;
        }

        Ok(score)
    }

    fn name(&self) -> &'static str {
        "model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::openai::LlmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedModel {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(&self, _: &CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn canned(reply: &str) -> Arc<CannedModel> {
        Arc::new(CannedModel {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn criteria() -> MatchCriteria {
        MatchCriteria::new(["python"], Vec::<String>::new(), 0.8).unwrap()
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("85").unwrap(), 0.85);
        assert_eq!(parse_rating("Score: 72.5/100").unwrap(), 0.725);
        assert!(matches!(parse_rating("great fit"), Err(ScoringError::Unparseable(_))));
        assert!(matches!(parse_rating("150"), Err(ScoringError::OutOfRange(_))));
        assert!(matches!(parse_rating("-5"), Err(ScoringError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn test_model_strategy_caches() {
        let model = canned("90");
        let strategy = ModelStrategy::new(model.clone()).with_cache(ScoreCache::new(10, 60));
        let posting = JobPosting::new("Data Analyst", "SAP", "https://jobs.sap.com/1");

        assert_eq!(strategy.score(&posting, &criteria()).await.unwrap(), 0.9);
        assert_eq!(strategy.score(&posting, &criteria()).await.unwrap(), 0.9);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(strategy.name(), "model");
    }

    #[tokio::test]
    async fn test_model_strategy_rejects_bad_reply() {
        let strategy = ModelStrategy::new(canned("I cannot rate this"));
        let posting = JobPosting::new("Data Analyst", "SAP", "l");
        assert!(strategy.score(&posting, &criteria()).await.is_err());
    }
}
