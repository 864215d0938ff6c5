use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder stored when the model gives no usable country.
pub const UNKNOWN_COUNTRY: &str = "unknown";
pub const MAX_SKILLS: usize = 5;
pub const SUGGESTED_TITLE_COUNT: usize = 3;
pub const MAX_IMPROVEMENT_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Fresh Graduate")]
    FreshGraduate,
    Junior,
    Mid,
    Senior,
    #[default]
    Unknown,
}

impl ExperienceLevel {
    /// Lenient mapping from whatever phrasing the model chose. A reply that
    /// starts with one of the four labels wins over keyword matching.
    pub fn from_model_text(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        let labelled = [
            ExperienceLevel::FreshGraduate,
            ExperienceLevel::Junior,
            ExperienceLevel::Mid,
            ExperienceLevel::Senior,
        ]
        .into_iter()
        .find(|level| lower.starts_with(&level.as_str().to_lowercase()));
        if let Some(level) = labelled {
            return level;
        }

        if lower.contains("fresh") || lower.contains("graduate") || lower.contains("entry") {
            ExperienceLevel::FreshGraduate
        } else if lower.contains("junior") {
            ExperienceLevel::Junior
        } else if lower.contains("mid") || lower.contains("intermediate") {
            ExperienceLevel::Mid
        } else if lower.contains("senior")
            || lower.contains("lead")
            || lower.contains("principal")
        {
            ExperienceLevel::Senior
        } else {
            ExperienceLevel::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::FreshGraduate => "Fresh Graduate",
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Career facts pulled from the first model reply. Absent fields are sentinels,
/// never missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFacts {
    pub experience_level: ExperienceLevel,
    pub country: String,
    pub skills: Vec<String>,
    pub suggested_job_titles: Vec<String>,
}

/// `None` when the country is blank or the unknown sentinel.
pub fn known_country(country: &str) -> Option<&str> {
    let trimmed = country.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_COUNTRY) {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    pub skill: String,
    pub coursera_url: String,
    pub udemy_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthRating {
    Strong,
    Moderate,
    Weak,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthAssessment {
    #[serde(rename = "cv_strength")]
    pub rating: StrengthRating,
    #[serde(rename = "improvement_suggestions")]
    pub improvement_points: Vec<String>,
}

/// Everything one analysis produces. Serialized flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub profile: ProfileFacts,
    pub course_recommendations: Vec<CourseRecommendation>,
    pub job_results: Vec<JobListing>,
    #[serde(flatten)]
    pub strength: StrengthAssessment,
}
