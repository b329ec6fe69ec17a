use thiserror::Error;

/// Rejected ranking configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("min_match_score must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("max_results must not be negative, got {0}")]
    NegativeMaxResults(i64),
}

/// Keyword, exclusion and threshold values used to score postings.
///
/// Terms are stored lower-cased and de-duplicated, so `"SQL"` and `"sql"`
/// count as one keyword. The threshold is validated on construction; a
/// `MatchCriteria` value is always usable as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCriteria {
    keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    min_match_score: f64,
}

impl MatchCriteria {
    pub fn new<K, E>(
        keywords: K,
        exclude_keywords: E,
        min_match_score: f64,
    ) -> Result<Self, ConfigurationError>
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        validate_threshold(min_match_score)?;

        Ok(Self {
            keywords: normalize_terms(keywords),
            exclude_keywords: normalize_terms(exclude_keywords),
            min_match_score,
        })
    }

    /// Same terms, different threshold
    pub fn with_min_match_score(&self, min_match_score: f64) -> Result<Self, ConfigurationError> {
        validate_threshold(min_match_score)?;
        Ok(Self {
            min_match_score,
            ..self.clone()
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn exclude_keywords(&self) -> &[String] {
        &self.exclude_keywords
    }

    pub fn min_match_score(&self) -> f64 {
        self.min_match_score
    }

    /// True when the lower-cased haystack contains any excluded term
    pub fn excludes(&self, haystack: &str) -> bool {
        self.exclude_keywords.iter().any(|term| haystack.contains(term.as_str()))
    }
}

fn validate_threshold(value: f64) -> Result<(), ConfigurationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::ThresholdOutOfRange(value));
    }
    Ok(())
}

fn normalize_terms<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for term in terms {
        let term = term.as_ref().trim().to_lowercase();
        if !term.is_empty() && !normalized.contains(&term) {
            normalized.push(term);
        }
    }
    normalized
}

/// Convert a caller-supplied result limit
pub fn max_results_from(value: Option<i64>) -> Result<Option<usize>, ConfigurationError> {
    match value {
        None => Ok(None),
        Some(n) => usize::try_from(n)
            .map(Some)
            .map_err(|_| ConfigurationError::NegativeMaxResults(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_normalized() {
        let criteria = MatchCriteria::new(["SQL", "sql ", "Python", ""], ["Senior"], 0.5).unwrap();
        assert_eq!(criteria.keywords(), ["sql", "python"]);
        assert_eq!(criteria.exclude_keywords(), ["senior"]);
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(MatchCriteria::new(["a"], Vec::<String>::new(), 0.0).is_ok());
        assert!(MatchCriteria::new(["a"], Vec::<String>::new(), 1.0).is_ok());
        assert_eq!(
            MatchCriteria::new(["a"], Vec::<String>::new(), 1.5),
            Err(ConfigurationError::ThresholdOutOfRange(1.5))
        );
        assert!(MatchCriteria::new(["a"], Vec::<String>::new(), -0.1).is_err());
        assert!(MatchCriteria::new(["a"], Vec::<String>::new(), f64::NAN).is_err());
    }

    #[test]
    fn test_with_min_match_score_keeps_terms() {
        let criteria = MatchCriteria::new(["python"], ["lead"], 0.75).unwrap();
        let relaxed = criteria.with_min_match_score(0.8).unwrap();
        assert_eq!(relaxed.keywords(), criteria.keywords());
        assert_eq!(relaxed.min_match_score(), 0.8);
        assert!(criteria.with_min_match_score(80.0).is_err());
    }

    #[test]
    fn test_max_results_from() {
        assert_eq!(max_results_from(None), Ok(None));
        assert_eq!(max_results_from(Some(3)), Ok(Some(3)));
        assert_eq!(
            max_results_from(Some(-1)),
            Err(ConfigurationError::NegativeMaxResults(-1))
        );
        assert_eq!(
            max_results_from(Some(i64::MIN)),
            Err(ConfigurationError::NegativeMaxResults(i64::MIN))
        );
        assert_eq!(max_results_from(Some(0)), Ok(Some(0)));
    }
}
