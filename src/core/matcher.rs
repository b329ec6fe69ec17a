use crate::core::criteria::MatchCriteria;
use crate::models::JobPosting;

/// Lower-cased `description + " " + title`
#[inline]
pub fn haystack(posting: &JobPosting) -> String {
    format!("{} {}", posting.description_text(), posting.title).to_lowercase()
}

/// Score a posting (0-1) by keyword coverage
///
/// Any excluded term anywhere in the text short-circuits to `0.0` before
/// keywords are counted. Matching is plain substring search, so `"sql"`
/// also hits `"PostgreSQL"`. With no keywords configured every posting
/// scores `0.0`.
pub fn keyword_score(posting: &JobPosting, criteria: &MatchCriteria) -> f64 {
    let text = haystack(posting);

    if criteria.excludes(&text) {
        return 0.0;
    }

    let keywords = criteria.keywords();
    if keywords.is_empty() {
        return 0.0;
    }

    let matches = keywords
        .iter()
        .filter(|kw| text.contains(kw.as_str()))
        .count();

    matches as f64 / keywords.len() as f64
}

/// Round to two decimals for display
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Keyword matcher bound to one set of criteria
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    criteria: MatchCriteria,
}

impl KeywordMatcher {
    pub fn new(criteria: MatchCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    pub fn score(&self, posting: &JobPosting) -> f64 {
        keyword_score(posting, &self.criteria)
    }

    /// Keywords from the criteria that occur in the posting
    pub fn matched_keywords(&self, posting: &JobPosting) -> Vec<String> {
        let text = haystack(posting);
        self.criteria
            .keywords()
            .iter()
            .filter(|kw| text.contains(kw.as_str()))
            .cloned()
            .collect()
    }
}
