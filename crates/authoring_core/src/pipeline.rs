//! Ordered generation of reference and metadata files.
//!
//! A metadata file for generated content points at a reference file, so the
//! reference file has to exist first. Steps run one after another and the
//! first failure stops the rest.

use shared::{
    domain::{LessonMaterialList, MediaTypeProperties, MerrillQuadrant, TrainingApplication},
    metadata::{Metadata, MetadataWrapper},
    protocol::QuestionExport,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{ServiceCallError, ServiceClient};

#[derive(Debug, Clone)]
pub enum GenerationStep {
    LessonMaterialReference {
        list: LessonMaterialList,
        target: String,
    },
    TrainingAppReference {
        app: Box<TrainingApplication>,
        target: String,
    },
    QuestionExportReference {
        question: QuestionExport,
        target: String,
    },
    Metadata {
        metadata: Box<Metadata>,
        target: String,
    },
}

impl GenerationStep {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LessonMaterialReference { .. } => "lesson material reference file",
            Self::TrainingAppReference { .. } => "training application reference file",
            Self::QuestionExportReference { .. } => "question export reference file",
            Self::Metadata { .. } => "metadata file",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::LessonMaterialReference { target, .. }
            | Self::TrainingAppReference { target, .. }
            | Self::QuestionExportReference { target, .. }
            | Self::Metadata { target, .. } => target,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to generate {step} '{target}': {source}")]
    StepFailed {
        step: &'static str,
        target: String,
        /// Steps that finished before the failure.
        completed: Vec<&'static str>,
        #[source]
        source: ServiceCallError,
    },
}

impl PipelineError {
    pub fn step(&self) -> &'static str {
        match self {
            Self::StepFailed { step, .. } => step,
        }
    }

    pub fn service_error(&self) -> &ServiceCallError {
        match self {
            Self::StepFailed { source, .. } => source,
        }
    }
}

/// A finished step and what it reported.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    ReferenceWritten { step: &'static str, target: String },
    MetadataWritten { target: String, wrapper: Option<MetadataWrapper> },
}

pub struct GenerationPipeline {
    client: ServiceClient,
    steps: Vec<GenerationStep>,
}

impl GenerationPipeline {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            steps: Vec::new(),
        }
    }

    pub fn then(mut self, step: GenerationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn then_lesson_material_reference(self, list: LessonMaterialList, target: impl Into<String>) -> Self {
        self.then(GenerationStep::LessonMaterialReference {
            list,
            target: target.into(),
        })
    }

    pub fn then_training_app_reference(self, app: TrainingApplication, target: impl Into<String>) -> Self {
        self.then(GenerationStep::TrainingAppReference {
            app: Box::new(app),
            target: target.into(),
        })
    }

    pub fn then_question_export_reference(self, question: QuestionExport, target: impl Into<String>) -> Self {
        self.then(GenerationStep::QuestionExportReference {
            question,
            target: target.into(),
        })
    }

    pub fn then_metadata(self, metadata: Metadata, target: impl Into<String>) -> Self {
        self.then(GenerationStep::Metadata {
            metadata: Box::new(metadata),
            target: target.into(),
        })
    }

    pub fn steps(&self) -> &[GenerationStep] {
        &self.steps
    }

    pub async fn run(self) -> Result<Vec<StepOutcome>, PipelineError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        let mut completed = Vec::with_capacity(self.steps.len());

        for step in self.steps {
            let label = step.label();
            let target = step.target().to_string();
            let result = match step {
                GenerationStep::LessonMaterialReference { list, target } => self
                    .client
                    .generate_lesson_material_reference_file(list, &target)
                    .await
                    .map(|()| StepOutcome::ReferenceWritten { step: label, target }),
                GenerationStep::TrainingAppReference { app, target } => self
                    .client
                    .generate_training_app_reference_file(*app, &target)
                    .await
                    .map(|()| StepOutcome::ReferenceWritten { step: label, target }),
                GenerationStep::QuestionExportReference { question, target } => self
                    .client
                    .generate_question_export_reference_file(question, &target)
                    .await
                    .map(|()| StepOutcome::ReferenceWritten { step: label, target }),
                GenerationStep::Metadata { metadata, target } => self
                    .client
                    .generate_metadata_file(*metadata, &target)
                    .await
                    .map(|wrapper| StepOutcome::MetadataWritten { target, wrapper }),
            };

            match result {
                Ok(outcome) => {
                    info!(step = label, target = %target, "pipeline: step complete");
                    completed.push(label);
                    outcomes.push(outcome);
                }
                Err(source) => {
                    warn!(step = label, target = %target, completed = completed.len(), "pipeline: step failed, aborting");
                    return Err(PipelineError::StepFailed {
                        step: label,
                        target,
                        completed,
                        source,
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

/// Where newly generated content shows up in the branch point editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRoute {
    /// Append the wrapper to this phase's list without asking the server.
    Append(MerrillQuadrant, MetadataWrapper),
    /// Ask the server for this phase's list again.
    Refresh(MerrillQuadrant),
    /// The content teaches concepts this branch point does not cover.
    Skip,
}

pub fn route_generated_metadata(
    metadata: &Metadata,
    wrapper: Option<MetadataWrapper>,
    branch_point_concepts: &[String],
) -> ContentRoute {
    let Some(phase) = metadata.target_phase() else {
        return ContentRoute::Skip;
    };
    let wrapper = match wrapper {
        Some(wrapper) if phase != MerrillQuadrant::Practice => wrapper,
        _ => return ContentRoute::Refresh(phase),
    };
    if branch_point_concepts.is_empty() || metadata.concepts.is_empty() {
        return ContentRoute::Skip;
    }
    let all_taught = metadata.concepts.iter().all(|concept| {
        branch_point_concepts
            .iter()
            .any(|taught| taught.eq_ignore_ascii_case(&concept.name))
    });
    if all_taught {
        ContentRoute::Append(phase, wrapper)
    } else {
        ContentRoute::Skip
    }
}

/// Notice shown once a lesson material reference file is written.
pub fn lesson_material_uploaded_message(list: &LessonMaterialList) -> String {
    let kind = list.media.first().and_then(|media| match &media.properties {
        MediaTypeProperties::WebPage => None,
        properties => Some(properties.display_name()),
    });
    uploaded_message(kind)
}

/// Notice shown once a question export reference file is written.
pub fn question_export_uploaded_message(question: &QuestionExport) -> String {
    let kind = if question.is_summarize_passage() {
        "summarize text"
    } else {
        "highlight text"
    };
    uploaded_message(Some(kind))
}

fn uploaded_message(kind: Option<&str>) -> String {
    match kind {
        Some(kind) => format!("Your {kind} content has been successfully uploaded to the server."),
        None => "Your content has been successfully uploaded to the server.".to_string(),
    }
}

pub const METADATA_CREATED_MESSAGE: &str =
    "A metadata file has been created for you based on the attributes you selected.";
pub const TRAINING_APP_UPLOADED_MESSAGE: &str =
    "A reference to your training application has been successfully uploaded to the server.";

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
