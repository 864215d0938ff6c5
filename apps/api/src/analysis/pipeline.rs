//! Pipeline Orchestrator: runs one document through extraction, the three
//! model stages and aggregation, in that fixed order.
//!
//! ```text
//! Extracting -> ProfileAnalysis -> JobAnalysis -> StrengthAnalysis -> Aggregating -> Done
//!      \               \
//!       +---------------+--> Failed
//! ```
//!
//! Only extraction and profile analysis can fail the request. Job and strength
//! failures are absorbed by their fallback policies.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::models::{AnalysisResult, JobListing, ProfileFacts, StrengthAssessment};
use crate::analysis::parser::{extract_strength, parse_job_listings, parse_profile, ParseFailure};
use crate::analysis::prompts::{build_job_prompt, build_profile_prompt, build_strength_prompt};
use crate::analysis::recommendations::{build_course_recommendations, build_job_results};
use crate::extraction::staging::StagedUpload;
use crate::extraction::{ExtractedText, ExtractionError, TextExtractor};
use crate::llm_client::{ModelError, ModelGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extracting,
    ProfileAnalysis,
    JobAnalysis,
    StrengthAnalysis,
    Aggregating,
    Done,
    Failed,
}

impl PipelineStage {
    /// The only transitions the pipeline may take.
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Extracting, ProfileAnalysis)
                | (ProfileAnalysis, JobAnalysis)
                | (JobAnalysis, StrengthAnalysis)
                | (StrengthAnalysis, Aggregating)
                | (Aggregating, Done)
                | (Extracting, Failed)
                | (ProfileAnalysis, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Extracting => "extracting",
            PipelineStage::ProfileAnalysis => "profile-analysis",
            PipelineStage::JobAnalysis => "job-analysis",
            PipelineStage::StrengthAnalysis => "strength-analysis",
            PipelineStage::Aggregating => "aggregating",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("profile extraction failed: model call error: {0}")]
    ProfileModel(#[source] ModelError),

    #[error("profile extraction failed: reply was not a profile object: {0}")]
    ProfileMalformed(#[source] serde_json::Error),

    #[error("internal pipeline fault: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The stage the failure was raised in.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Extraction(_) => PipelineStage::Extracting,
            PipelineError::ProfileModel(_) | PipelineError::ProfileMalformed(_) => {
                PipelineStage::ProfileAnalysis
            }
            PipelineError::Internal(_) => PipelineStage::Aggregating,
        }
    }
}

/// A single analysis run. Stages are strictly sequential; later prompts use
/// earlier results, and no stage is revisited.
pub struct ResumePipeline<'a> {
    extractor: &'a dyn TextExtractor,
    gateway: &'a dyn ModelGateway,
    stage: PipelineStage,
}

impl<'a> ResumePipeline<'a> {
    pub fn new(extractor: &'a dyn TextExtractor, gateway: &'a dyn ModelGateway) -> Self {
        Self {
            extractor,
            gateway,
            stage: PipelineStage::Extracting,
        }
    }

    /// Runs every stage against the staged upload. The upload is released on
    /// every outcome before this returns.
    pub async fn run(mut self, upload: StagedUpload) -> Result<AnalysisResult, PipelineError> {
        let outcome = self.run_stages(&upload).await;
        upload.release();

        if let Err(e) = &outcome {
            warn!("Analysis failed during {}: {e}", e.stage());
            // Internal faults stay wherever the illegal transition was attempted.
            self.advance(PipelineStage::Failed).ok();
        }
        if !self.stage.is_terminal() {
            warn!("Pipeline stopped in non-terminal stage {}", self.stage);
        }
        outcome
    }

    async fn run_stages(
        &mut self,
        upload: &StagedUpload,
    ) -> Result<AnalysisResult, PipelineError> {
        let text = self.extractor.extract(upload.path(), upload.kind()).await?;
        info!(
            "Extracted {} characters from {} upload",
            text.as_str().len(),
            upload.kind()
        );
        self.analyze_text(&text).await
    }

    /// Runs the model stages on already-extracted text.
    pub async fn analyze_text(
        &mut self,
        text: &ExtractedText,
    ) -> Result<AnalysisResult, PipelineError> {
        self.advance(PipelineStage::ProfileAnalysis)?;
        let profile = self.profile_stage(text).await?;

        self.advance(PipelineStage::JobAnalysis)?;
        let parsed_jobs = self.job_stage(&profile).await;

        self.advance(PipelineStage::StrengthAnalysis)?;
        let strength = self.strength_stage(text).await;

        self.advance(PipelineStage::Aggregating)?;
        let course_recommendations = build_course_recommendations(&profile.skills);
        let job_results =
            build_job_results(parsed_jobs, &profile.suggested_job_titles, &profile.country);

        self.advance(PipelineStage::Done)?;
        Ok(AnalysisResult {
            profile,
            course_recommendations,
            job_results,
            strength,
        })
    }

    fn advance(&mut self, next: PipelineStage) -> Result<(), PipelineError> {
        if !self.stage.can_advance_to(next) {
            return Err(PipelineError::Internal(format!(
                "illegal stage transition {} -> {}",
                self.stage, next
            )));
        }
        debug!("Pipeline stage {} -> {}", self.stage, next);
        self.stage = next;
        Ok(())
    }

    async fn profile_stage(&self, text: &ExtractedText) -> Result<ProfileFacts, PipelineError> {
        let reply = self
            .gateway
            .invoke(&build_profile_prompt(text))
            .await
            .map_err(PipelineError::ProfileModel)?;
        parse_profile(&reply).map_err(PipelineError::ProfileMalformed)
    }

    /// Model errors here count as parse failures; the aggregator falls back.
    async fn job_stage(&self, profile: &ProfileFacts) -> Result<Vec<JobListing>, ParseFailure> {
        let prompt = build_job_prompt(
            &profile.country,
            profile.experience_level,
            &profile.skills,
            &profile.suggested_job_titles,
        );
        match self.gateway.invoke(&prompt).await {
            Ok(reply) => parse_job_listings(&reply),
            Err(e) => Err(ParseFailure {
                reason: format!("job listing model call failed: {e}"),
            }),
        }
    }

    async fn strength_stage(&self, text: &ExtractedText) -> StrengthAssessment {
        match self.gateway.invoke(&build_strength_prompt(text)).await {
            Ok(reply) => extract_strength(&reply),
            Err(e) => {
                warn!("Strength evaluation unavailable, rating Unknown: {e}");
                StrengthAssessment::default()
            }
        }
    }
}
