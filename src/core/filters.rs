/// Check whether a scraped career-page title is worth keeping
///
/// A title qualifies when it contains one of the target job titles, one of
/// the company-specific keywords, or at least one general keyword. All
/// comparisons are case-insensitive substring checks.
#[inline]
pub fn matches_title_criteria(
    title: &str,
    job_titles: &[String],
    company_keywords: &[String],
    keywords: &[String],
) -> bool {
    let title_lower = title.to_lowercase();

    let contains = |term: &String| {
        let term = term.trim().to_lowercase();
        !term.is_empty() && title_lower.contains(&term)
    };

    job_titles.iter().any(contains)
        || company_keywords.iter().any(contains)
        || keywords.iter().any(contains)
}

/// First known location mentioned in `text`, in the order given
#[inline]
pub fn detect_location<'a>(text: &str, known_locations: &'a [String]) -> Option<&'a str> {
    let text_lower = text.to_lowercase();
    known_locations
        .iter()
        .find(|loc| text_lower.contains(&loc.to_lowercase()))
        .map(String::as_str)
}

/// Country conventions that decide how a resume is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryCode {
    De,
    Uk,
    Us,
}

impl CountryCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountryCode::De => "DE",
            CountryCode::Uk => "UK",
            CountryCode::Us => "US",
        }
    }

    /// Layout instructions for the tailored resume
    pub fn resume_format(&self) -> &'static str {
        match self {
            CountryCode::De => "Lebenslauf format with professional photo, detailed work history",
            CountryCode::Uk => "2-page CV, no photo, detailed achievements",
            CountryCode::Us => "1-page resume, no photo, concise bullet points",
        }
    }
}

/// Derive the country from the last comma-separated part of a location.
/// A missing location is treated as Germany.
pub fn country_code(location: Option<&str>) -> CountryCode {
    let location = match location {
        Some(l) if !l.trim().is_empty() => l,
        _ => return CountryCode::De,
    };

    let country = location.rsplit(',').next().unwrap_or("").trim();

    if country.contains("Germany") || country.contains("Deutschland") {
        CountryCode::De
    } else if country.contains("United Kingdom") {
        CountryCode::Uk
    } else {
        CountryCode::Us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_matches_job_title() {
        assert!(matches_title_criteria(
            "Junior Data Analyst (m/w/d)",
            &strings(&["Data Analyst"]),
            &[],
            &[],
        ));
    }

    #[test]
    fn test_title_matches_company_keyword() {
        assert!(matches_title_criteria(
            "Process Mining Specialist",
            &strings(&["Data Analyst"]),
            &strings(&["Process Mining"]),
            &[],
        ));
    }

    #[test]
    fn test_title_matches_general_keyword() {
        assert!(matches_title_criteria("Scrum Master", &[], &[], &strings(&["scrum"])));
    }

    #[test]
    fn test_title_rejected() {
        assert!(!matches_title_criteria(
            "Cookie Settings",
            &strings(&["Data Analyst"]),
            &strings(&["Project Manager"]),
            &strings(&["python"]),
        ));
    }

    #[test]
    fn test_blank_terms_ignored() {
        assert!(!matches_title_criteria("Anything", &strings(&["  "]), &[], &[]));
    }

    #[test]
    fn test_detect_location() {
        let known = strings(&["Munich", "München", "Germany"]);
        assert_eq!(detect_location("Standort: MÜNCHEN, Germany", &known), Some("München"));
        assert_eq!(detect_location("Berlin", &known), None);
    }

    #[test]
    fn test_country_code() {
        assert_eq!(country_code(Some("Munich, Bavaria, Germany")), CountryCode::De);
        assert_eq!(country_code(Some("München, Deutschland")), CountryCode::De);
        assert_eq!(country_code(Some("London, United Kingdom")), CountryCode::Uk);
        assert_eq!(country_code(Some("Remote")), CountryCode::Us);
        assert_eq!(country_code(None), CountryCode::De);
        assert_eq!(CountryCode::Uk.as_str(), "UK");
    }
}
