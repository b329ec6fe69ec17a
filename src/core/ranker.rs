use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{
    criteria::MatchCriteria,
    matcher::{haystack, keyword_score, round_score},
    scoring::{KeywordStrategy, ScoringError, ScoringStrategy},
};
use crate::models::JobPosting;

/// Result of ranking one batch
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub jobs: Vec<JobPosting>,
    pub total_input: usize,
    /// Postings dropped because the strategy could not score them
    pub failed: usize,
}

/// Filter, order and truncate scored postings.
///
/// Keeps postings scoring at least `min_match_score`, sorts them by score
/// descending with a stable sort (equal scores keep their input order),
/// takes the first `max_results`, and attaches the two-decimal
/// `match_score`. Comparisons use the full-precision scores.
pub fn select(
    scored: Vec<(JobPosting, f64)>,
    min_match_score: f64,
    max_results: Option<usize>,
) -> Vec<JobPosting> {
    let mut qualified: Vec<(JobPosting, f64)> = scored
        .into_iter()
        .filter(|(_, score)| *score >= min_match_score)
        .collect();

    qualified.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    if let Some(limit) = max_results {
        qualified.truncate(limit);
    }

    qualified
        .into_iter()
        .map(|(mut posting, score)| {
            posting.match_score = Some(round_score(score));
            posting
        })
        .collect()
}

/// Rank postings with keyword scoring
pub fn rank(
    postings: Vec<JobPosting>,
    criteria: &MatchCriteria,
    max_results: Option<usize>,
) -> Vec<JobPosting> {
    let scored = postings
        .into_iter()
        .map(|posting| {
            let score = keyword_score(&posting, criteria);
            (posting, score)
        })
        .collect();

    select(scored, criteria.min_match_score(), max_results)
}

/// Ranker over a swappable scoring strategy
#[derive(Clone)]
pub struct Ranker {
    strategy: Arc<dyn ScoringStrategy>,
}

impl Ranker {
    pub fn new(strategy: Arc<dyn ScoringStrategy>) -> Self {
        Self { strategy }
    }

    pub fn keyword() -> Self {
        Self::new(Arc::new(KeywordStrategy))
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Score every posting, then [`select`] the qualified ones.
    ///
    /// Postings containing an excluded term score `0.0` without consulting
    /// the strategy. A posting the strategy fails on is left out and counted
    /// in [`RankOutcome::failed`].
    pub async fn rank(
        &self,
        postings: Vec<JobPosting>,
        criteria: &MatchCriteria,
        max_results: Option<usize>,
    ) -> RankOutcome {
        let total_input = postings.len();
        let mut failed = 0;
        let mut scored = Vec::with_capacity(total_input);

        for posting in postings {
            if criteria.excludes(&haystack(&posting)) {
                scored.push((posting, 0.0));
                continue;
            }

            let result = self.strategy.score(&posting, criteria).await.and_then(|score| {
                if score.is_finite() {
                    Ok(score.clamp(0.0, 1.0))
                } else {
                    Err(ScoringError::OutOfRange(score))
                }
            });

            match result {
                Ok(score) => scored.push((posting, score)),
                Err(e) => {
                    tracing::warn!(
                        "Dropping '{}' at {}: {} scoring failed: {}",
                        posting.title,
                        posting.company,
                        self.strategy.name(),
                        e
                    );
                    failed += 1;
                }
            }
        }

        let jobs = select(scored, criteria.min_match_score(), max_results);

        tracing::debug!(
            "Ranked {} postings with {} strategy: {} qualified, {} failed",
            total_input,
            self.strategy.name(),
            jobs.len(),
            failed
        );

        RankOutcome {
            jobs,
            total_input,
            failed,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::keyword()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct FixedScores {
        scores: HashMap<String, f64>,
        calls: AtomicUsize,
    }

    impl FixedScores {
        fn new(pairs: &[(&str, f64)]) -> Self {
            Self {
                scores: pairs.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScoringStrategy for FixedScores {
        async fn score(&self, posting: &JobPosting, _: &MatchCriteria) -> Result<f64, ScoringError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.scores
                .get(&posting.title)
                .copied()
                .ok_or_else(|| ScoringError::Backend(format!("no score for {}", posting.title)))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn job(title: &str) -> JobPosting {
        JobPosting::new(title, "Company", format!("https://jobs.test/{}", title))
    }

    #[test]
    fn test_select_filters_sorts_truncates() {
        let scored = vec![(job("a"), 0.8), (job("b"), 0.5), (job("c"), 0.9)];
        let result = select(scored, 0.75, Some(2));

        let titles: Vec<_> = result.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
        assert_eq!(result[0].match_score, Some(0.9));
    }

    #[test]
    fn test_select_is_stable_on_ties() {
        let scored = vec![(job("first"), 0.5), (job("second"), 0.7), (job("third"), 0.5)];
        let result = select(scored, 0.0, None);

        let titles: Vec<_> = result.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_select_inclusive_threshold() {
        let scored = vec![(job("exact"), 0.75), (job("below"), 0.75 - 1e-9)];
        let result = select(scored, 0.75, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "exact");
    }

    #[test]
    fn test_select_no_padding() {
        let result = select(vec![(job("only"), 1.0)], 0.5, Some(10));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_rank_empty_input() {
        let criteria = MatchCriteria::new(["python"], Vec::<String>::new(), 0.5).unwrap();
        assert!(rank(vec![], &criteria, None).is_empty());
    }

    #[tokio::test]
    async fn test_ranker_uses_strategy_scores() {
        let strategy = Arc::new(FixedScores::new(&[("a", 0.8), ("b", 0.5), ("c", 0.9)]));
        let ranker = Ranker::new(strategy);
        let criteria = MatchCriteria::new(["x"], Vec::<String>::new(), 0.75).unwrap();

        let outcome = ranker.rank(vec![job("a"), job("b"), job("c")], &criteria, Some(2)).await;

        let titles: Vec<_> = outcome.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
        assert_eq!(outcome.total_input, 3);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_ranker_skips_strategy_for_excluded() {
        let strategy = Arc::new(FixedScores::new(&[("Senior Analyst", 1.0), ("Analyst", 1.0)]));
        let ranker = Ranker::new(strategy.clone());
        let criteria = MatchCriteria::new(["analyst"], ["senior"], 0.0).unwrap();

        let outcome = ranker
            .rank(vec![job("Senior Analyst"), job("Analyst")], &criteria, None)
            .await;

        assert_eq!(strategy.calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(outcome.jobs[0].title, "Analyst");
        assert_eq!(outcome.jobs[1].match_score, Some(0.0));
    }

    #[tokio::test]
    async fn test_ranker_counts_nan_score_as_failed() {
        let strategy = Arc::new(FixedScores::new(&[("nan", f64::NAN), ("ok", 0.6)]));
        let ranker = Ranker::new(strategy);
        let criteria = MatchCriteria::new(["x"], Vec::<String>::new(), 0.0).unwrap();

        let outcome = ranker.rank(vec![job("nan"), job("ok")], &criteria, None).await;

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.jobs.len(), 1);
        assert_eq!(outcome.jobs[0].title, "ok");
    }

    #[tokio::test]
    async fn test_ranker_drops_failed_postings() {
        let strategy = Arc::new(FixedScores::new(&[("known", 0.9)]));
        let ranker = Ranker::new(strategy);
        let criteria = MatchCriteria::new(["x"], Vec::<String>::new(), 0.0).unwrap();

        let outcome = ranker.rank(vec![job("known"), job("unknown")], &criteria, None).await;

        assert_eq!(outcome.jobs.len(), 1);
        assert_eq!(outcome.failed, 1);
    }
}
