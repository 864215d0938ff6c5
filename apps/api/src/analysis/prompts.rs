// Resume analysis prompt templates.
// All prompts for the analysis pipeline are defined here; builders only fill placeholders.

use crate::analysis::models::{known_country, ExperienceLevel};
use crate::extraction::ExtractedText;

/// Profile extraction prompt. Replace `{resume_text}` before sending.
pub const PROFILE_PROMPT_TEMPLATE: &str = r#"Analyze the resume below and extract:
- experience_level (Junior, Mid, Senior or Fresh Graduate)
- country (from address, phone, or other hints)
- skills (up to 5)
- suggested_job_titles (3 matching titles)

Return ONLY a JSON object in this format, with no text before or after it:
{
  "experience_level": "",
  "country": "",
  "skills": [],
  "suggested_job_titles": []
}
Resume:
{resume_text}"#;

/// Job listing prompt. Replace `{country}`, `{experience}`, `{skills}` and `{titles}`.
pub const JOB_PROMPT_TEMPLATE: &str = r#"You are a smart job recommender. Based on:
Country: {country}
Experience: {experience}
Skills: {skills}
Job Titles: {titles}

Generate 5 realistic job listings (title, company, location, url, description) with working links from Google, LinkedIn, Indeed, Glassdoor or similar. Return ONLY a JSON array of objects with exactly those five fields."#;

/// Strength evaluation prompt. Replace `{resume_text}`. The reply is free text.
pub const STRENGTH_PROMPT_TEMPLATE: &str = r#"Based on the resume below, evaluate:
1. CV strength (Strong, Moderate, Weak)
2. 3 improvement suggestions

Resume:
{resume_text}"#;

const DEFAULT_COUNTRY: &str = "global";
const DEFAULT_EXPERIENCE: &str = "Junior";
const NOT_SPECIFIED: &str = "not specified";

pub fn build_profile_prompt(text: &ExtractedText) -> String {
    fill_template(PROFILE_PROMPT_TEMPLATE, &[("resume_text", text.as_str())])
}

pub fn build_job_prompt(
    country: &str,
    experience_level: ExperienceLevel,
    skills: &[String],
    titles: &[String],
) -> String {
    let experience = match experience_level {
        ExperienceLevel::Unknown => DEFAULT_EXPERIENCE,
        level => level.as_str(),
    };

    let skills = join_or_default(skills);
    let titles = join_or_default(titles);
    fill_template(
        JOB_PROMPT_TEMPLATE,
        &[
            ("country", known_country(country).unwrap_or(DEFAULT_COUNTRY)),
            ("experience", experience),
            ("skills", &skills),
            ("titles", &titles),
        ],
    )
}

pub fn build_strength_prompt(text: &ExtractedText) -> String {
    fill_template(STRENGTH_PROMPT_TEMPLATE, &[("resume_text", text.as_str())])
}

/// Substitutes `{name}` placeholders in a single left-to-right pass.
/// Substituted values are never scanned again.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let filled = values.iter().find_map(|&(name, value)| {
            tail.strip_prefix(name)
                .and_then(|after| after.strip_prefix('}'))
                .map(|after| (value, after))
        });
        match filled {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn join_or_default(items: &[String]) -> String {
    if items.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        items.join(", ")
    }
}
