use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{
    domain::{DkfRef, Media},
    error::{ApiError, ErrorCode},
    metadata::{MetadataConcept, PresentAt},
    protocol::{GatAction, GatResult},
};

use super::*;
use crate::dispatch::DispatchService;

#[derive(Default)]
struct ScriptedService {
    calls: Mutex<Vec<&'static str>>,
    fail_on: Option<&'static str>,
    reject_on: Option<&'static str>,
}

#[async_trait]
impl DispatchService for ScriptedService {
    async fn execute(&self, action: GatAction) -> anyhow::Result<GatResult> {
        let name = action.name();
        self.calls.lock().expect("calls").push(name);
        if self.fail_on == Some(name) {
            return Err(anyhow!("connection reset"));
        }
        if self.reject_on == Some(name) {
            return Ok(GatResult::Failure(ApiError::new(
                ErrorCode::Conflict,
                "file is locked",
            )));
        }
        Ok(match action {
            GatAction::GenerateMetadataFile {
                target_filename, ..
            } => GatResult::MetadataFileGenerated {
                metadata: Some(wrapper(&target_filename)),
            },
            _ => GatResult::Success,
        })
    }
}

fn wrapper(path: &str) -> MetadataWrapper {
    MetadataWrapper {
        metadata_file_path: path.to_string(),
        display_name: "convoy".into(),
        content_file: None,
        concepts: vec!["A".into()],
        is_quadrant_resource: true,
    }
}

fn training_app() -> TrainingApplication {
    TrainingApplication {
        transition_name: Some("convoy".into()),
        dkf_ref: Some(DkfRef {
            file: "convoy.dkf.xml".into(),
        }),
        ..TrainingApplication::default()
    }
}

fn metadata(quadrant: Option<MerrillQuadrant>, concepts: &[&str]) -> Metadata {
    Metadata {
        present_at: PresentAt {
            merrill_quadrant: quadrant,
            remediation_only: quadrant.is_none(),
        },
        concepts: concepts.iter().map(|name| MetadataConcept::new(*name)).collect(),
        ..Metadata::default()
    }
}

#[tokio::test]
async fn steps_run_in_order() {
    let service = Arc::new(ScriptedService::default());
    let client = ServiceClient::new(service.clone(), "author");

    let outcomes = GenerationPipeline::new(client)
        .then_training_app_reference(training_app(), "c/convoy.trainingapp.xml")
        .then_metadata(metadata(Some(MerrillQuadrant::Practice), &["A"]), "c/convoy.metadata.xml")
        .run()
        .await
        .expect("pipeline");

    assert_eq!(
        *service.calls.lock().expect("calls"),
        vec!["generate_training_app_reference_file", "generate_metadata_file"]
    );
    assert_eq!(
        outcomes[1],
        StepOutcome::MetadataWritten {
            target: "c/convoy.metadata.xml".into(),
            wrapper: Some(wrapper("c/convoy.metadata.xml")),
        }
    );
}

#[tokio::test]
async fn transport_failure_short_circuits() {
    let service = Arc::new(ScriptedService {
        fail_on: Some("generate_training_app_reference_file"),
        ..ScriptedService::default()
    });
    let client = ServiceClient::new(service.clone(), "author");

    let err = GenerationPipeline::new(client)
        .then_training_app_reference(training_app(), "c/convoy.trainingapp.xml")
        .then_metadata(metadata(Some(MerrillQuadrant::Practice), &["A"]), "c/convoy.metadata.xml")
        .run()
        .await
        .expect_err("aborted");

    assert_eq!(err.step(), "training application reference file");
    assert!(matches!(err.service_error(), ServiceCallError::Transport { .. }));
    assert_eq!(
        *service.calls.lock().expect("calls"),
        vec!["generate_training_app_reference_file"]
    );
}

#[tokio::test]
async fn rejected_step_reports_completed_steps() {
    let service = Arc::new(ScriptedService {
        reject_on: Some("generate_metadata_file"),
        ..ScriptedService::default()
    });
    let client = ServiceClient::new(service, "author");

    let err = GenerationPipeline::new(client)
        .then_lesson_material_reference(LessonMaterialList::default(), "c/m.lessonMaterial.xml")
        .then_metadata(metadata(Some(MerrillQuadrant::Rule), &["A"]), "c/m.metadata.xml")
        .run()
        .await
        .expect_err("rejected");

    let PipelineError::StepFailed {
        step,
        completed,
        source,
        ..
    } = err;
    assert_eq!(step, "metadata file");
    assert_eq!(completed, vec!["lesson material reference file"]);
    assert_eq!(source.to_api_error().message, "file is locked");
}

#[test]
fn content_for_taught_concepts_is_appended() {
    let metadata = metadata(Some(MerrillQuadrant::Rule), &["a", "B"]);
    let route = route_generated_metadata(
        &metadata,
        Some(wrapper("x")),
        &["A".to_string(), "b".to_string(), "c".to_string()],
    );
    assert_eq!(route, ContentRoute::Append(MerrillQuadrant::Rule, wrapper("x")));
}

#[test]
fn content_for_other_concepts_is_skipped() {
    let metadata = metadata(Some(MerrillQuadrant::Example), &["A", "Z"]);
    assert_eq!(
        route_generated_metadata(&metadata, Some(wrapper("x")), &["A".to_string()]),
        ContentRoute::Skip
    );
    assert_eq!(
        route_generated_metadata(&metadata, Some(wrapper("x")), &[]),
        ContentRoute::Skip
    );
}

#[test]
fn practice_and_missing_wrappers_refresh() {
    let practice = metadata(Some(MerrillQuadrant::Practice), &["A"]);
    assert_eq!(
        route_generated_metadata(&practice, Some(wrapper("x")), &["A".to_string()]),
        ContentRoute::Refresh(MerrillQuadrant::Practice)
    );

    let remediation = metadata(None, &["A"]);
    assert_eq!(
        route_generated_metadata(&remediation, None, &["A".to_string()]),
        ContentRoute::Refresh(MerrillQuadrant::RemediationAfterRecall)
    );
}

#[test]
fn upload_messages_name_the_content_type() {
    let list = LessonMaterialList {
        is_collection: Some(false),
        media: vec![Media {
            name: "clip".into(),
            uri: "https://youtu.be/x".into(),
            properties: MediaTypeProperties::YoutubeVideo { size: None },
        }],
    };
    assert_eq!(
        lesson_material_uploaded_message(&list),
        "Your YouTube video content has been successfully uploaded to the server."
    );
    assert_eq!(
        lesson_material_uploaded_message(&LessonMaterialList::default()),
        "Your content has been successfully uploaded to the server."
    );
    assert_eq!(
        question_export_uploaded_message(&QuestionExport {
            question_text: "q".into(),
            answer_field_text_box: Some(true),
        }),
        "Your summarize text content has been successfully uploaded to the server."
    );
}
