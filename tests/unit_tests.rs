// Unit tests for jobmatch scoring and ranking

use jobmatch::core::{
    classify_email, country_code, keyword_score, rank, select, CountryCode, EmailKeywords, KeywordMatcher,
    MatchCriteria, Ranker,
};
use jobmatch::models::{ApplicationStatus, JobPosting, JobSource};

fn criteria(keywords: &[&str], exclude: &[&str], min: f64) -> MatchCriteria {
    MatchCriteria::new(keywords.iter().copied(), exclude.iter().copied(), min).unwrap()
}

fn posting(title: &str, description: &str) -> JobPosting {
    JobPosting::new(title, "Company", format!("https://jobs.test/{}", title.replace(' ', "-")))
        .with_description(description)
}

fn sample_postings() -> Vec<JobPosting> {
    vec![
        posting("Junior Data Analyst", "Requires python and sql skills"),
        posting("Senior Python Developer", "python sql excel"),
        posting("Reporting Analyst", "uses excel only"),
        posting("BI Developer", "sql and excel dashboards"),
        posting("Office Manager", ""),
        posting("Data Engineer", "python, sql, excel, airflow"),
        posting("Intern", "SQL"),
    ]
}

#[test]
fn test_scenario_a_all_keywords() {
    let c = criteria(&["python", "sql"], &["senior"], 0.75);
    let p = posting("Junior Data Analyst", "Requires python and sql skills");
    assert_eq!(keyword_score(&p, &c), 1.0);
}

#[test]
fn test_scenario_b_exclusion_short_circuits() {
    let c = criteria(&["python", "sql"], &["senior"], 0.75);
    let p = posting("Senior Python Developer", "python and sql");
    assert_eq!(keyword_score(&p, &c), 0.0);
}

#[test]
fn test_scenario_c_partial_match() {
    let c = criteria(&["python", "sql", "excel"], &[], 0.0);
    let p = posting("", "uses excel only");
    assert!((keyword_score(&p, &c) - 1.0 / 3.0).abs() < 1e-12);

    let ranked = rank(vec![p], &c, None);
    assert_eq!(ranked[0].match_score, Some(0.33));
}

#[test]
fn test_scenario_e_empty_keywords() {
    let c = criteria(&[], &[], 0.1);
    for p in sample_postings() {
        assert_eq!(keyword_score(&p, &c), 0.0);
    }
    assert!(rank(sample_postings(), &c, None).is_empty());
}

#[test]
fn test_scenario_d_select() {
    let scored = vec![
        (posting("A", ""), 0.8),
        (posting("B", ""), 0.5),
        (posting("C", ""), 0.9),
    ];
    let result = select(scored, 0.75, Some(2));

    let titles: Vec<_> = result.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A"]);
}

#[test]
fn test_scores_within_unit_interval() {
    let c = criteria(&["python", "sql", "excel", "airflow"], &["senior"], 0.0);
    for p in sample_postings() {
        let score = keyword_score(&p, &c);
        assert!((0.0..=1.0).contains(&score), "{} scored {}", p.title, score);
    }
}

#[test]
fn test_exclusion_beats_full_match() {
    let c = criteria(&["python", "sql", "excel"], &["senior"], 0.0);
    for p in sample_postings() {
        if p.title.to_lowercase().contains("senior") {
            assert_eq!(keyword_score(&p, &c), 0.0);
        }
    }
}

#[test]
fn test_ranked_output_is_descending() {
    let c = criteria(&["python", "sql", "excel"], &["senior"], 0.0);
    let ranked = rank(sample_postings(), &c, None);

    for pair in ranked.windows(2) {
        assert!(pair[0].match_score >= pair[1].match_score);
    }
}

#[test]
fn test_ranked_output_is_subset_of_input() {
    let c = criteria(&["python", "sql", "excel"], &["senior"], 0.3);
    let input = sample_postings();
    let ranked = rank(input.clone(), &c, None);

    for out in &ranked {
        let original = input.iter().find(|p| p.link == out.link).unwrap();
        let mut stripped = out.clone();
        stripped.match_score = original.match_score;
        assert_eq!(&stripped, original);
    }
}

#[test]
fn test_ranked_json_keeps_received_fields() {
    let input = serde_json::json!([{
        "title": "Data Analyst",
        "company": "SAP",
        "url": "https://x/1",
        "source": "linkedin",
        "postedDate": "3 days ago",
        "description": "python sql",
        "salary": "60k"
    }]);
    let postings: Vec<JobPosting> = serde_json::from_value(input.clone()).unwrap();

    let ranked = rank(postings, &criteria(&["python", "sql"], &[], 0.5), None);
    let mut output = serde_json::to_value(&ranked).unwrap();

    assert_eq!(output[0]["match_score"], 1.0);
    output[0].as_object_mut().unwrap().remove("match_score");
    assert_eq!(output, input);
}

#[test]
fn test_rank_is_idempotent() {
    let c = criteria(&["python", "sql", "excel"], &["senior"], 0.3);
    let once = rank(sample_postings(), &c, None);
    let twice = rank(once.clone(), &c, None);

    let scores = |jobs: &[JobPosting]| jobs.iter().map(|j| j.match_score).collect::<Vec<_>>();
    assert_eq!(scores(&once), scores(&twice));
}

#[test]
fn test_threshold_boundary() {
    // 3 of 4 keywords matched scores exactly 0.75
    let c = criteria(&["python", "sql", "excel", "airflow"], &[], 0.75);
    let exact = posting("Exact", "python sql excel");
    assert_eq!(keyword_score(&exact, &c), 0.75);
    assert_eq!(rank(vec![exact], &c, None).len(), 1);

    let below = select(vec![(posting("Below", ""), 0.75 - f64::EPSILON)], 0.75, None);
    assert!(below.is_empty());
}

#[test]
fn test_keyword_ranker_agrees_with_rank() {
    let c = criteria(&["python", "sql", "excel"], &["senior"], 0.3);
    let outcome = tokio_test::block_on(Ranker::keyword().rank(sample_postings(), &c, Some(3)));

    assert_eq!(outcome.total_input, 7);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.jobs, rank(sample_postings(), &c, Some(3)));
}

#[test]
fn test_max_results_zero_and_larger_than_input() {
    let c = criteria(&["sql"], &[], 0.0);
    assert!(rank(sample_postings(), &c, Some(0)).is_empty());
    assert_eq!(rank(sample_postings(), &c, Some(100)).len(), sample_postings().len());
}

#[test]
fn test_posting_without_description_scores_on_title() {
    let c = criteria(&["analyst"], &[], 0.0);
    let p: JobPosting = serde_json::from_str(r#"{"title": "Data Analyst", "company": "SAP"}"#).unwrap();
    assert_eq!(p.source, JobSource::JobBoards);
    assert_eq!(keyword_score(&p, &c), 1.0);
}

#[test]
fn test_keyword_matcher_reports_matches() {
    let matcher = KeywordMatcher::new(criteria(&["python", "SQL", "excel"], &[], 0.5));
    let p = posting("Analyst", "Python and sql");
    assert_eq!(matcher.matched_keywords(&p), vec!["python".to_string(), "sql".to_string()]);
}

#[test]
fn test_invalid_threshold_rejected() {
    assert!(MatchCriteria::new(["sql"], Vec::<String>::new(), 1.01).is_err());
    assert!(MatchCriteria::new(["sql"], Vec::<String>::new(), -0.01).is_err());
    assert!(MatchCriteria::new(["sql"], Vec::<String>::new(), f64::NAN).is_err());
}

#[test]
fn test_country_code_for_documents() {
    assert_eq!(country_code(Some("Munich, Bavaria, Germany")), CountryCode::De);
    assert_eq!(country_code(Some("London, United Kingdom")), CountryCode::Uk);
    assert_eq!(country_code(Some("New York, NY")), CountryCode::Us);
}

#[test]
fn test_email_classification() {
    let keywords = EmailKeywords::default();
    assert_eq!(
        classify_email("We'd like to schedule a call", "", &keywords),
        Some(ApplicationStatus::InterviewScheduled)
    );
    assert_eq!(
        classify_email("Your application", "We regret to inform you", &keywords),
        Some(ApplicationStatus::Rejected)
    );
}
