use async_trait::async_trait;
use thiserror::Error;

use crate::core::{criteria::MatchCriteria, matcher::keyword_score};
use crate::models::JobPosting;

/// Errors a scoring strategy can report for a single posting
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring backend failed: {0}")]
    Backend(String),

    #[error("Score {0} is outside the accepted range")]
    OutOfRange(f64),

    #[error("Unparseable score: {0}")]
    Unparseable(String),
}

/// Source of match scores for the ranker.
///
/// Implementations return a value in `[0, 1]`. The ranker owns exclusion,
/// filtering, ordering and truncation, so a strategy only answers "how well
/// does this posting fit".
#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    async fn score(&self, posting: &JobPosting, criteria: &MatchCriteria) -> Result<f64, ScoringError>;

    /// Short identifier used in logs and run summaries
    fn name(&self) -> &'static str;
}

/// Keyword-coverage scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordStrategy;

#[async_trait]
impl ScoringStrategy for KeywordStrategy {
    async fn score(&self, posting: &JobPosting, criteria: &MatchCriteria) -> Result<f64, ScoringError> {
        Ok(keyword_score(posting, criteria))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Convert a 0-100 percentage into the canonical 0-1 unit
pub fn percent_to_unit(percent: f64) -> Result<f64, ScoringError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ScoringError::OutOfRange(percent));
    }
    Ok(percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_strategy_matches_pure_function() {
        let criteria = MatchCriteria::new(["python", "sql"], ["senior"], 0.5).unwrap();
        let posting = JobPosting::new("Data Analyst", "SAP", "l").with_description("python");

        let score = KeywordStrategy.score(&posting, &criteria).await.unwrap();
        assert_eq!(score, keyword_score(&posting, &criteria));
        assert_eq!(KeywordStrategy.name(), "keyword");
    }

    #[test]
    fn test_percent_to_unit() {
        assert_eq!(percent_to_unit(80.0).unwrap(), 0.8);
        assert_eq!(percent_to_unit(0.0).unwrap(), 0.0);
        assert!(matches!(percent_to_unit(120.0), Err(ScoringError::OutOfRange(_))));
        assert!(percent_to_unit(f64::NAN).is_err());
    }
}
