use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{LessonMaterialList, Media, MerrillQuadrant, TrainingApplication},
    error::ApiError,
    metadata::{Metadata, MetadataWrapper},
};

/// Highlight/summarize passage question exported for remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionExport {
    pub question_text: String,
    /// Set when the learner answers in a free text box (summarize passage).
    pub answer_field_text_box: Option<bool>,
}

impl QuestionExport {
    pub fn is_summarize_passage(&self) -> bool {
        self.answer_field_text_box.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantRequest {
    pub quadrant: MerrillQuadrant,
    pub remediation: bool,
    pub concepts: Vec<String>,
    pub other_course_concepts: Vec<String>,
    #[serde(default)]
    pub exclude_rule_example_content: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantSearchResult {
    pub results: BTreeMap<MerrillQuadrant, Vec<MetadataWrapper>>,
}

impl QuadrantSearchResult {
    pub fn results_for(&self, quadrant: MerrillQuadrant) -> Vec<MetadataWrapper> {
        self.results.get(&quadrant).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeApplicationObject {
    pub metadata_file_path: String,
    pub display_name: String,
    pub training_app: Option<TrainingApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCheck {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeModel {
    pub name: String,
    #[serde(default)]
    pub children: Vec<FileTreeModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GatAction {
    FetchDomainContentServerAddress,
    WorkspaceFileExists {
        username: String,
        path: String,
    },
    WorkspaceFilesExist {
        username: String,
        course_folder_path: String,
        media: Vec<Media>,
    },
    ConvertLessonMaterialFiles {
        username: String,
        files: Vec<String>,
        course_folder_path: String,
    },
    GenerateMetadataFile {
        username: String,
        metadata: Metadata,
        target_filename: String,
    },
    GenerateLessonMaterialReferenceFile {
        username: String,
        lesson_material_list: LessonMaterialList,
        target_filename: String,
    },
    GenerateTrainingAppReferenceFile {
        username: String,
        training_app: TrainingApplication,
        target_filename: String,
    },
    GenerateQuestionExportReferenceFile {
        username: String,
        question: QuestionExport,
        target_filename: String,
    },
    GetMerrillQuadrantFiles {
        username: String,
        course_folder_path: String,
        requests: Vec<QuadrantRequest>,
    },
    GetPracticeApplications {
        username: String,
        course_folder_path: String,
        concepts: Vec<String>,
        other_course_concepts: Vec<String>,
    },
    DeleteMetadata {
        username: String,
        course_folder_path: String,
        metadata_file_path: String,
    },
    DeleteWorkspaceFiles {
        username: String,
        browser_session_key: String,
        files: Vec<String>,
        delete_lock: bool,
    },
    FetchRootDirectoryModel {
        username: String,
    },
    ValidateMediaSemantics {
        username: String,
        file_path: String,
        update_invalid_files: bool,
    },
    GetScenarioConcepts {
        username: String,
        dkf_path: String,
        course_concepts: Vec<String>,
    },
}

impl GatAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchDomainContentServerAddress => "fetch_domain_content_server_address",
            Self::WorkspaceFileExists { .. } => "workspace_file_exists",
            Self::WorkspaceFilesExist { .. } => "workspace_files_exist",
            Self::ConvertLessonMaterialFiles { .. } => "convert_lesson_material_files",
            Self::GenerateMetadataFile { .. } => "generate_metadata_file",
            Self::GenerateLessonMaterialReferenceFile { .. } => {
                "generate_lesson_material_reference_file"
            }
            Self::GenerateTrainingAppReferenceFile { .. } => "generate_training_app_reference_file",
            Self::GenerateQuestionExportReferenceFile { .. } => {
                "generate_question_export_reference_file"
            }
            Self::GetMerrillQuadrantFiles { .. } => "get_merrill_quadrant_files",
            Self::GetPracticeApplications { .. } => "get_practice_applications",
            Self::DeleteMetadata { .. } => "delete_metadata",
            Self::DeleteWorkspaceFiles { .. } => "delete_workspace_files",
            Self::FetchRootDirectoryModel { .. } => "fetch_root_directory_model",
            Self::ValidateMediaSemantics { .. } => "validate_media_semantics",
            Self::GetScenarioConcepts { .. } => "get_scenario_concepts",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GatResult {
    DomainContentServerAddress {
        address: String,
    },
    Success,
    FilesExist {
        results: BTreeMap<String, FileCheck>,
    },
    LessonMaterialConverted {
        #[serde(default)]
        list: Option<LessonMaterialList>,
    },
    MetadataFileGenerated {
        #[serde(default)]
        metadata: Option<MetadataWrapper>,
    },
    QuadrantFiles {
        search_result: QuadrantSearchResult,
    },
    PracticeApplications {
        #[serde(default)]
        applications: Option<Vec<PracticeApplicationObject>>,
    },
    RootDirectory {
        model: FileTreeModel,
    },
    MediaSemanticsValidated {
        valid_file: bool,
    },
    ScenarioConcepts {
        #[serde(default)]
        concepts: Option<Vec<String>>,
    },
    Failure(ApiError),
}

/// Notifications exchanged between presenters and the rest of the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorEvent {
    EditorDirty,
    CourseObjectDisabled { transition_name: Option<String> },
    CourseObjectRedraw { transition_name: Option<String> },
    CourseObjectRenamed { old_name: Option<String>, new_name: String },
    CourseConceptsChanged,
    CourseLtiProvidersChanged,
    CourseLoaded,
    ScenarioSaved { dkf_path: String },
    CourseFolderChanged { course_folder_path: String },
}
