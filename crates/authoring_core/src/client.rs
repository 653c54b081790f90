use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{LessonMaterialList, Media, TrainingApplication},
    error::{ApiError, ErrorCode},
    metadata::{Metadata, MetadataWrapper},
    protocol::{
        FileCheck, FileTreeModel, GatAction, GatResult, PracticeApplicationObject, QuadrantRequest,
        QuadrantSearchResult, QuestionExport,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dispatch::DispatchService;

#[derive(Debug, Error)]
pub enum ServiceCallError {
    #[error("{action} request failed: {message}")]
    Transport {
        action: &'static str,
        message: String,
    },
    #[error("{action} was rejected: {}", .error.message)]
    Rejected {
        action: &'static str,
        error: ApiError,
    },
    #[error("unexpected server response for {action}")]
    UnexpectedResponse { action: &'static str },
}

impl ServiceCallError {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Transport { action, .. }
            | Self::Rejected { action, .. }
            | Self::UnexpectedResponse { action } => action,
        }
    }

    /// Payload for an error-details dialog.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::Rejected { error, .. } => error.clone(),
            Self::Transport { message, .. } => {
                ApiError::new(ErrorCode::Internal, self.to_string()).with_details(message.clone())
            }
            Self::UnexpectedResponse { .. } => ApiError::new(ErrorCode::Internal, self.to_string()),
        }
    }
}

pub type CallResult<T> = std::result::Result<T, ServiceCallError>;

/// Typed calls over a [`DispatchService`] on behalf of one author.
#[derive(Clone)]
pub struct ServiceClient {
    service: Arc<dyn DispatchService>,
    username: String,
}

macro_rules! expect_result {
    ($result:expr, $action:expr, $pattern:pat => $value:expr) => {
        match $result {
            $pattern => Ok($value),
            _ => Err(ServiceCallError::UnexpectedResponse { action: $action }),
        }
    };
}

impl ServiceClient {
    pub fn new(service: Arc<dyn DispatchService>, username: impl Into<String>) -> Self {
        Self {
            service,
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Runs one action, turning in-band failures into [`ServiceCallError::Rejected`].
    pub async fn call(&self, action: GatAction) -> CallResult<GatResult> {
        let name = action.name();
        debug!(action = name, username = %self.username, "service: call");
        match self.service.execute(action).await {
            Ok(GatResult::Failure(error)) => {
                warn!(action = name, message = %error.message, "service: action failed");
                Err(ServiceCallError::Rejected {
                    action: name,
                    error,
                })
            }
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(action = name, "service: transport failure: {err:#}");
                Err(ServiceCallError::Transport {
                    action: name,
                    message: format!("{err:#}"),
                })
            }
        }
    }

    pub async fn domain_content_server_address(&self) -> CallResult<String> {
        let action = GatAction::FetchDomainContentServerAddress;
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::DomainContentServerAddress { address } => address)
    }

    pub async fn workspace_file_exists(&self, path: &str) -> CallResult<bool> {
        let action = GatAction::WorkspaceFileExists {
            username: self.username.clone(),
            path: path.to_string(),
        };
        let name = action.name();
        match self.call(action).await? {
            GatResult::Success => Ok(true),
            GatResult::FilesExist { results } => {
                Ok(results.get(path).map(|check| check.exists).unwrap_or(false))
            }
            _ => Err(ServiceCallError::UnexpectedResponse { action: name }),
        }
    }

    pub async fn workspace_files_exist(
        &self,
        course_folder_path: &str,
        media: Vec<Media>,
    ) -> CallResult<BTreeMap<String, FileCheck>> {
        let action = GatAction::WorkspaceFilesExist {
            username: self.username.clone(),
            course_folder_path: course_folder_path.to_string(),
            media,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::FilesExist { results } => results)
    }

    pub async fn convert_lesson_material_files(
        &self,
        files: Vec<String>,
        course_folder_path: &str,
    ) -> CallResult<Option<LessonMaterialList>> {
        let action = GatAction::ConvertLessonMaterialFiles {
            username: self.username.clone(),
            files,
            course_folder_path: course_folder_path.to_string(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::LessonMaterialConverted { list } => list)
    }

    pub async fn generate_metadata_file(
        &self,
        metadata: Metadata,
        target_filename: &str,
    ) -> CallResult<Option<MetadataWrapper>> {
        let action = GatAction::GenerateMetadataFile {
            username: self.username.clone(),
            metadata,
            target_filename: target_filename.to_string(),
        };
        let name = action.name();
        match self.call(action).await? {
            GatResult::MetadataFileGenerated { metadata } => Ok(metadata),
            GatResult::Success => Ok(None),
            _ => Err(ServiceCallError::UnexpectedResponse { action: name }),
        }
    }

    pub async fn generate_lesson_material_reference_file(
        &self,
        lesson_material_list: LessonMaterialList,
        target_filename: &str,
    ) -> CallResult<()> {
        let action = GatAction::GenerateLessonMaterialReferenceFile {
            username: self.username.clone(),
            lesson_material_list,
            target_filename: target_filename.to_string(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name, GatResult::Success => ())
    }

    pub async fn generate_training_app_reference_file(
        &self,
        training_app: TrainingApplication,
        target_filename: &str,
    ) -> CallResult<()> {
        let action = GatAction::GenerateTrainingAppReferenceFile {
            username: self.username.clone(),
            training_app,
            target_filename: target_filename.to_string(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name, GatResult::Success => ())
    }

    pub async fn generate_question_export_reference_file(
        &self,
        question: QuestionExport,
        target_filename: &str,
    ) -> CallResult<()> {
        let action = GatAction::GenerateQuestionExportReferenceFile {
            username: self.username.clone(),
            question,
            target_filename: target_filename.to_string(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name, GatResult::Success => ())
    }

    pub async fn merrill_quadrant_files(
        &self,
        course_folder_path: &str,
        requests: Vec<QuadrantRequest>,
    ) -> CallResult<QuadrantSearchResult> {
        let action = GatAction::GetMerrillQuadrantFiles {
            username: self.username.clone(),
            course_folder_path: course_folder_path.to_string(),
            requests,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::QuadrantFiles { search_result } => search_result)
    }

    pub async fn practice_applications(
        &self,
        course_folder_path: &str,
        concepts: Vec<String>,
        other_course_concepts: Vec<String>,
    ) -> CallResult<Vec<PracticeApplicationObject>> {
        let action = GatAction::GetPracticeApplications {
            username: self.username.clone(),
            course_folder_path: course_folder_path.to_string(),
            concepts,
            other_course_concepts,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::PracticeApplications { applications } => applications.unwrap_or_default())
    }

    pub async fn delete_metadata(
        &self,
        course_folder_path: &str,
        metadata_file_path: &str,
    ) -> CallResult<()> {
        let action = GatAction::DeleteMetadata {
            username: self.username.clone(),
            course_folder_path: course_folder_path.to_string(),
            metadata_file_path: metadata_file_path.to_string(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name, GatResult::Success => ())
    }

    pub async fn delete_workspace_files(
        &self,
        browser_session_key: &str,
        files: Vec<String>,
        delete_lock: bool,
    ) -> CallResult<()> {
        let action = GatAction::DeleteWorkspaceFiles {
            username: self.username.clone(),
            browser_session_key: browser_session_key.to_string(),
            files,
            delete_lock,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name, GatResult::Success => ())
    }

    pub async fn root_directory_model(&self) -> CallResult<FileTreeModel> {
        let action = GatAction::FetchRootDirectoryModel {
            username: self.username.clone(),
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::RootDirectory { model } => model)
    }

    pub async fn validate_media_semantics(
        &self,
        file_path: &str,
        update_invalid_files: bool,
    ) -> CallResult<bool> {
        let action = GatAction::ValidateMediaSemantics {
            username: self.username.clone(),
            file_path: file_path.to_string(),
            update_invalid_files,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::MediaSemanticsValidated { valid_file } => valid_file)
    }

    pub async fn scenario_concepts(
        &self,
        dkf_path: &str,
        course_concepts: Vec<String>,
    ) -> CallResult<Vec<String>> {
        let action = GatAction::GetScenarioConcepts {
            username: self.username.clone(),
            dkf_path: dkf_path.to_string(),
            course_concepts,
        };
        let name = action.name();
        expect_result!(self.call(action).await?, name,
            GatResult::ScenarioConcepts { concepts } => concepts.unwrap_or_default())
    }
}
