// Core algorithm exports
pub mod classifier;
pub mod criteria;
pub mod filters;
pub mod matcher;
pub mod ranker;
pub mod scoring;

pub use classifier::{classify_email, extract_company_position, EmailKeywords, PositionInfo};
pub use criteria::{max_results_from, ConfigurationError, MatchCriteria};
pub use filters::{country_code, detect_location, matches_title_criteria, CountryCode};
pub use matcher::{keyword_score, round_score, KeywordMatcher};
pub use ranker::{rank, select, RankOutcome, Ranker};
pub use scoring::{percent_to_unit, KeywordStrategy, ScoringError, ScoringStrategy};
