use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::ApplicationStatus;

/// Phrases that identify each kind of recruiter email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailKeywords {
    #[serde(default = "default_interview")]
    pub interview: Vec<String>,
    #[serde(default = "default_rejection")]
    pub rejection: Vec<String>,
    #[serde(default = "default_offer")]
    pub offer: Vec<String>,
    #[serde(default = "default_received")]
    pub received: Vec<String>,
}

impl Default for EmailKeywords {
    fn default() -> Self {
        Self {
            interview: default_interview(),
            rejection: default_rejection(),
            offer: default_offer(),
            received: default_received(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_interview() -> Vec<String> {
    to_strings(&[
        "interview",
        "schedule a call",
        "next round",
        "meet the team",
        "vorstellungsgespräch",
    ])
}

fn default_rejection() -> Vec<String> {
    to_strings(&[
        "unfortunately",
        "not moving forward",
        "other candidates",
        "regret to inform",
        "leider",
    ])
}

fn default_offer() -> Vec<String> {
    to_strings(&["offer letter", "pleased to offer", "job offer", "employment contract"])
}

fn default_received() -> Vec<String> {
    to_strings(&[
        "application received",
        "received your application",
        "thank you for applying",
        "thank you for your application",
        "bewerbung erhalten",
    ])
}

/// Classify an email into a status transition
///
/// Categories are checked in priority order: interview, rejection, offer,
/// then received. Returns `None` when nothing matches.
pub fn classify_email(subject: &str, body: &str, keywords: &EmailKeywords) -> Option<ApplicationStatus> {
    let text = format!("{} {}", subject, body).to_lowercase();
    let hit = |terms: &[String]| terms.iter().any(|t| text.contains(&t.to_lowercase()));

    if hit(&keywords.interview) {
        return Some(ApplicationStatus::InterviewScheduled);
    }
    if hit(&keywords.rejection) {
        return Some(ApplicationStatus::Rejected);
    }
    if hit(&keywords.offer) {
        return Some(ApplicationStatus::OfferReceived);
    }
    if hit(&keywords.received) {
        return Some(ApplicationStatus::ApplicationReceived);
    }
    None
}

/// Company and position named in a recruiter email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub position: String,
    pub company: String,
}

/// (pattern, position group, company group)
fn patterns() -> &'static [(Regex, usize, usize)] {
    static PATTERNS: OnceLock<Vec<(Regex, usize, usize)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"(?i)(?:position|role|opportunity)\s+(?:of|as|for)?\s*([\w&/\-]+(?:[ \t]+[\w&/\-]+)*?)\s+at\s+([\w&\-]+(?:[ \t]+[\w&\-]+)*)",
                1,
                2,
            ),
            (
                r"(?i)([\w&\-]+(?:[ \t]+[\w&\-]+)*)\s+-\s+([\w&/\-]+(?:[ \t]+[\w&/\-]+)*?)\s+position",
                2,
                1,
            ),
            (
                r"(?i)application\s+for\s+(?:the\s+)?([\w&/\-]+(?:[ \t]+[\w&/\-]+)*?)\s+at\s+([\w&\-]+(?:[ \t]+[\w&\-]+)*)",
                1,
                2,
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, position, company)| {
            Regex::new(pattern).ok().map(|re| (re, position, company))
        })
        .collect()
    })
}

/// Try to pull the position and company out of an email
///
/// The subject is searched before the body so a greedy match cannot run on
/// into the message text.
pub fn extract_company_position(subject: &str, body: &str) -> Option<PositionInfo> {
    [subject, body]
        .into_iter()
        .find_map(|text| extract_from(text, patterns()))
}

fn extract_from(text: &str, patterns: &[(Regex, usize, usize)]) -> Option<PositionInfo> {
    patterns.iter().find_map(|(re, position_group, company_group)| {
        let caps = re.captures(text)?;
        let position = caps.get(*position_group)?.as_str().trim().to_string();
        let company = caps.get(*company_group)?.as_str().trim().to_string();
        if position.is_empty() || company.is_empty() {
            return None;
        }
        Some(PositionInfo { position, company })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        let keywords = EmailKeywords::default();

        // interview wins over rejection wording
        let status = classify_email(
            "Interview invitation",
            "Unfortunately our first slot is taken",
            &keywords,
        );
        assert_eq!(status, Some(ApplicationStatus::InterviewScheduled));

        let status = classify_email("Your application", "Unfortunately we chose other candidates", &keywords);
        assert_eq!(status, Some(ApplicationStatus::Rejected));

        let status = classify_email("Job offer", "We are pleased to offer you the role", &keywords);
        assert_eq!(status, Some(ApplicationStatus::OfferReceived));

        let status = classify_email("Thank you for applying", "", &keywords);
        assert_eq!(status, Some(ApplicationStatus::ApplicationReceived));
    }

    #[test]
    fn test_classify_none() {
        assert_eq!(classify_email("Newsletter", "Weekly digest", &EmailKeywords::default()), None);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let keywords = EmailKeywords {
            interview: vec!["Next Round".to_string()],
            rejection: vec![],
            offer: vec![],
            received: vec![],
        };
        assert_eq!(
            classify_email("NEXT ROUND", "", &keywords),
            Some(ApplicationStatus::InterviewScheduled)
        );
    }

    #[test]
    fn test_extract_application_for() {
        let info = extract_company_position("Your application for Data Analyst at Celonis", "").unwrap();
        assert_eq!(info.position, "Data Analyst");
        assert_eq!(info.company, "Celonis");
    }

    #[test]
    fn test_extract_role_at() {
        let info = extract_company_position(
            "Update",
            "Thanks for your interest in the role of Project Coordinator at Munich Re.\nBest",
        )
        .unwrap();
        assert_eq!(info.position, "Project Coordinator");
        assert_eq!(info.company, "Munich Re");
    }

    #[test]
    fn test_role_pattern_before_application_for() {
        let info = extract_company_position("Application for the role of Data Analyst at SAP", "").unwrap();
        assert_eq!(info.position, "Data Analyst");
        assert_eq!(info.company, "SAP");
    }

    #[test]
    fn test_extract_dash_position() {
        let info = extract_company_position("Siemens - IT Project Manager position", "").unwrap();
        assert_eq!(info.company, "Siemens");
        assert_eq!(info.position, "IT Project Manager");
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_company_position("Hello", "No details here"), None);
    }
}
