//! Structured Response Parser: turns raw model replies into typed results.
//!
//! Two strategies:
//! - strict JSON (profile facts, job listings): decode, then coerce field by field,
//!   substituting sentinels for anything missing;
//! - best-effort free text (strength assessment): keyword and line scanning that
//!   never fails. Its imprecision is accepted: "Strongly" counts as Strong.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::analysis::models::{
    ExperienceLevel, JobListing, ProfileFacts, StrengthAssessment, StrengthRating,
    MAX_IMPROVEMENT_POINTS, MAX_SKILLS, SUGGESTED_TITLE_COUNT, UNKNOWN_COUNTRY,
};

/// The job-listing reply could not be read as a JSON array of listings.
#[derive(Debug, Error)]
#[error("job listing reply could not be parsed: {reason}")]
pub struct ParseFailure {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    experience_level: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
    #[serde(default)]
    skills: Option<Value>,
    #[serde(default)]
    suggested_job_titles: Option<Value>,
}

/// Parses the profile-extraction reply. The reply must hold a JSON object;
/// any field it lacks becomes its sentinel.
pub fn parse_profile(reply: &str) -> Result<ProfileFacts, serde_json::Error> {
    let value: Value = decode_json(reply, '{', '}')?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("expected a JSON object"));
    }
    let raw: RawProfile = serde_json::from_value(value)?;

    let experience_level = raw
        .experience_level
        .as_ref()
        .and_then(value_as_text)
        .map(|s| ExperienceLevel::from_model_text(&s))
        .unwrap_or_default();

    let country = raw
        .country
        .as_ref()
        .and_then(value_as_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !is_unknown_marker(s))
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

    Ok(ProfileFacts {
        experience_level,
        country,
        skills: string_list(raw.skills.as_ref(), MAX_SKILLS),
        suggested_job_titles: string_list(
            raw.suggested_job_titles.as_ref(),
            SUGGESTED_TITLE_COUNT,
        ),
    })
}

/// Parses the job-listing reply. Every element must be an object; a reply of
/// any other shape is a `ParseFailure`.
pub fn parse_job_listings(reply: &str) -> Result<Vec<JobListing>, ParseFailure> {
    let items: Vec<Value> = decode_json(reply, '[', ']').map_err(|e| ParseFailure {
        reason: e.to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<JobListing, ParseFailure> {
            let object = item.as_object().ok_or_else(|| ParseFailure {
                reason: format!("element {index} is not an object"),
            })?;
            let field = |name: &str| object.get(name).and_then(value_as_text).unwrap_or_default();
            Ok(JobListing {
                title: field("title"),
                company: field("company"),
                location: field("location"),
                url: field("url"),
                description: field("description"),
            })
        })
        .collect()
}

/// Best-effort strength extraction over free text. Never fails.
///
/// - rating: first case-insensitive occurrence of Strong, Moderate or Weak
///   anywhere in the text, else `Unknown`;
/// - improvement points: pieces split on newlines and `*` bullets, kept when
///   they mention "suggestion" or start with `-`, first three in order.
pub fn extract_strength(reply: &str) -> StrengthAssessment {
    static RATING: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)strong|moderate|weak").expect("rating pattern is valid"));

    let rating = RATING
        .find(reply)
        .map(|m| match m.as_str().to_ascii_lowercase().as_str() {
            "strong" => StrengthRating::Strong,
            "moderate" => StrengthRating::Moderate,
            _ => StrengthRating::Weak,
        })
        .unwrap_or(StrengthRating::Unknown);

    let improvement_points = reply
        .split(['\n', '*'])
        .filter(|piece| {
            piece.to_lowercase().contains("suggestion") || piece.trim_start().starts_with('-')
        })
        .map(|piece| piece.trim().to_string())
        .take(MAX_IMPROVEMENT_POINTS)
        .collect();

    StrengthAssessment {
        rating,
        improvement_points,
    }
}

/// Decodes `reply` as JSON after stripping code fences. If that fails and the
/// reply wraps the payload in prose, retries on the span from the first `open`
/// to the last `close` delimiter. The first error is returned when both fail.
fn decode_json<T: serde::de::DeserializeOwned>(
    reply: &str,
    open: char,
    close: char,
) -> Result<T, serde_json::Error> {
    let mut text = reply.trim();
    if let Some(fenced) = text.strip_prefix("```") {
        // Drop the info string (`json`, `JSON`, ...) and the closing fence.
        let body = fenced.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        text = body.strip_suffix("```").unwrap_or(body).trim();
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first) => {
            let span = text
                .find(open)
                .zip(text.rfind(close))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &text[start..=end]);
            match span {
                Some(inner) if inner.len() < text.len() => {
                    serde_json::from_str(inner).map_err(|_| first)
                }
                _ => Err(first),
            }
        }
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Arrays are taken element-wise; a lone string is split on commas.
fn string_list(value: Option<&Value>, limit: usize) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_as_text).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(limit)
        .collect()
}

fn is_unknown_marker(s: &str) -> bool {
    s.is_empty()
        || ["unknown", "n/a", "na", "none", "null", "not specified"]
            .iter()
            .any(|marker| s.eq_ignore_ascii_case(marker))
}
