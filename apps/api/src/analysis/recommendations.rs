//! Recommendation Aggregator: course links per skill and job results with
//! deterministic fallback listings when the model's listings are unusable.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

use crate::analysis::models::{known_country, CourseRecommendation, JobListing};
use crate::analysis::parser::ParseFailure;

/// Characters left as-is by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const COURSERA_SEARCH: &str = "https://www.coursera.org/search?query=";
const UDEMY_SEARCH: &str = "https://www.udemy.com/courses/search/?q=";
const JOB_SEARCH: &str = "https://www.google.com/search?q=";
const FALLBACK_COMPANY: &str = "Example Corp";
const REMOTE_LOCATION: &str = "Remote";

pub fn encode_query(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// One recommendation per skill, order preserved.
pub fn build_course_recommendations(skills: &[String]) -> Vec<CourseRecommendation> {
    skills
        .iter()
        .map(|skill| {
            let query = encode_query(skill);
            CourseRecommendation {
                skill: skill.clone(),
                coursera_url: format!("{COURSERA_SEARCH}{query}"),
                udemy_url: format!("{UDEMY_SEARCH}{query}"),
            }
        })
        .collect()
}

/// Passes parsed listings through untouched. On `ParseFailure`, synthesizes
/// exactly one search listing per title, in title order.
pub fn build_job_results(
    parsed: Result<Vec<JobListing>, ParseFailure>,
    titles: &[String],
    country: &str,
) -> Vec<JobListing> {
    match parsed {
        Ok(listings) => listings,
        Err(failure) => {
            warn!(
                "Falling back to {} synthesized job listings: {failure}",
                titles.len()
            );
            let country = known_country(country);
            titles
                .iter()
                .map(|title| fallback_listing(title, country))
                .collect()
        }
    }
}

fn fallback_listing(title: &str, country: Option<&str>) -> JobListing {
    let location = country.unwrap_or(REMOTE_LOCATION);
    let search = match country {
        Some(country) => format!("{title} {country} jobs"),
        None => format!("{title} jobs"),
    };

    JobListing {
        title: title.to_string(),
        company: FALLBACK_COMPANY.to_string(),
        location: location.to_string(),
        url: format!("{JOB_SEARCH}{}", encode_query(&search)),
        description: format!("Search for {title} roles in {location}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn failure() -> ParseFailure {
        ParseFailure {
            reason: "expected value at line 1 column 1".to_string(),
        }
    }

    #[test]
    fn test_encode_query_matches_uri_component_rules() {
        assert_eq!(encode_query("C++"), "C%2B%2B");
        assert_eq!(encode_query("Node.js"), "Node.js");
        assert_eq!(encode_query("Machine Learning"), "Machine%20Learning");
        assert_eq!(encode_query("C#/.NET (Core)"), "C%23%2F.NET%20(Core)");
        assert_eq!(encode_query("Café"), "Caf%C3%A9");
    }

    #[test]
    fn test_course_recommendations_one_per_skill_in_order() {
        let recs = build_course_recommendations(&strings(&["Go", "SQL", "Machine Learning"]));
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].skill, "Go");
        assert_eq!(recs[1].skill, "SQL");
        assert_eq!(
            recs[2].coursera_url,
            "https://www.coursera.org/search?query=Machine%20Learning"
        );
        assert_eq!(
            recs[2].udemy_url,
            "https://www.udemy.com/courses/search/?q=Machine%20Learning"
        );
    }

    #[test]
    fn test_course_recommendations_empty() {
        assert!(build_course_recommendations(&[]).is_empty());
    }

    #[test]
    fn test_job_results_pass_through_parsed_listings() {
        let parsed = vec![JobListing {
            title: "Rust Engineer".to_string(),
            company: "Ferrous".to_string(),
            ..JobListing::default()
        }];
        let results = build_job_results(Ok(parsed.clone()), &strings(&["A", "B"]), "Spain");
        assert_eq!(results, parsed);
    }

    #[test]
    fn test_job_results_fallback_one_per_title_with_country() {
        let titles = strings(&["Backend Engineer", "SRE", "Data Engineer"]);
        let results = build_job_results(Err(failure()), &titles, "Germany");

        assert_eq!(results.len(), 3);
        for (listing, title) in results.iter().zip(&titles) {
            assert_eq!(&listing.title, title);
            assert_eq!(listing.location, "Germany");
            assert_eq!(listing.company, "Example Corp");
        }
        assert_eq!(
            results[0].url,
            "https://www.google.com/search?q=Backend%20Engineer%20Germany%20jobs"
        );
        assert_eq!(results[1].description, "Search for SRE roles in Germany");
    }

    #[test]
    fn test_job_results_fallback_unknown_country_is_remote() {
        let results = build_job_results(Err(failure()), &strings(&["QA Engineer"]), "unknown");
        assert_eq!(results[0].location, "Remote");
        assert_eq!(
            results[0].url,
            "https://www.google.com/search?q=QA%20Engineer%20jobs"
        );
    }

    #[test]
    fn test_job_results_fallback_without_titles_is_empty() {
        assert!(build_job_results(Err(failure()), &[], "France").is_empty());
    }
}
