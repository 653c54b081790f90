//! Capabilities the presenters need from their views. Views are passive: they
//! render what they are given and report user input back through presenter
//! methods.

use std::collections::BTreeMap;

use authoring_core::{
    concepts::CandidateConcept,
    questions::ScoringSlider,
    validation::{CandidateAttribute, ValidationReport},
};
use shared::{
    domain::{
        ConceptQuestions, Guidance, LtiProvider, Media, MerrillQuadrant, TrainingAppRemediation,
    },
    metadata::MetadataWrapper,
    protocol::{FileCheck, PracticeApplicationObject},
};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ErrorDetails {
        title: String,
        message: String,
        details: Option<String>,
        stack_trace: Vec<String>,
    },
    Warning {
        title: String,
        message: String,
    },
    Info {
        title: Option<String>,
        message: String,
    },
}

impl Notice {
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Warning {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ErrorDetails {
            title: title.into(),
            message: message.into(),
            details: None,
            stack_trace: Vec::new(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Info {
            title: Some(title.into()),
            message: message.into(),
        }
    }

    /// Short-lived notification without a dialog.
    pub fn toast(message: impl Into<String>) -> Self {
        Self::Info {
            title: None,
            message: message.into(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::ErrorDetails { title, .. } | Self::Warning { title, .. } => Some(title),
            Self::Info { title, .. } => title.as_deref(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ErrorDetails { message, .. }
            | Self::Warning { message, .. }
            | Self::Info { message, .. } => message,
        }
    }
}

/// A course concept offered in a pick list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptChoice {
    pub name: String,
    pub chosen: bool,
}

pub trait LessonMaterialView: Send {
    fn set_read_only(&mut self, read_only: bool);
    fn set_disabled(&mut self, disabled: bool);
    /// A single piece of media edited in place (slide show, LTI, non-collection).
    fn show_media(&mut self, media: &Media);
    fn show_collection(&mut self, media: &[Media]);
    fn set_lti_concepts(&mut self, concepts: &[ConceptChoice]);
    fn set_lti_providers(&mut self, providers: &[LtiProvider]);
    fn set_media_validity(&mut self, results: &BTreeMap<String, FileCheck>);
    /// `None` opens the editor to add new media.
    fn open_media_editor(&mut self, editing: Option<(usize, &Media)>);
    fn open_preview(&mut self, url: Url);
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandatoryControls {
    /// Skipped when the learner already has state for the concepts.
    Optional,
    Always,
    AfterShelfLife { days: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDialogView {
    pub title: &'static str,
    pub concepts: Vec<ConceptChoice>,
}

pub trait MbpView: Send {
    fn set_read_only(&mut self, read_only: bool);
    fn set_disabled(&mut self, disabled: bool);
    fn set_check_on_learning_concepts(&mut self, concepts: &[CandidateConcept]);
    fn set_practice_concepts(&mut self, concepts: &[CandidateConcept]);
    fn set_lti_providers(&mut self, providers: &[LtiProvider]);
    fn set_question_rows(&mut self, rows: &[ConceptQuestions]);
    fn set_scoring_sliders(&mut self, sliders: &[(String, ScoringSlider)]);
    fn remove_slider(&mut self, concept: &str);
    fn set_extraneous_concepts(&mut self, entries: &[ConceptQuestions]);
    fn set_guidance(&mut self, quadrant: MerrillQuadrant, guidance: Option<&Guidance>);
    /// Red banner under a phase whose transitions cannot be edited here.
    fn set_transitions_warning(&mut self, quadrant: MerrillQuadrant, message: Option<&str>);
    fn set_recall_attempts(&mut self, attempts: Option<u32>);
    fn set_practice_attempts(&mut self, attempts: Option<u32>);
    fn set_exclude_rule_example_content(&mut self, exclude: bool);
    fn set_mandatory_controls(&mut self, controls: MandatoryControls);
    fn set_content_loading(&mut self, quadrant: MerrillQuadrant, loading: bool);
    fn set_content_files(&mut self, quadrant: MerrillQuadrant, files: Option<&[MetadataWrapper]>);
    fn add_content_file(&mut self, quadrant: MerrillQuadrant, file: MetadataWrapper);
    fn set_practice_applications(&mut self, applications: Option<&[PracticeApplicationObject]>);
    /// Returns false when the application was not listed.
    fn remove_practice_application(&mut self, metadata_file_path: &str) -> bool;
    fn show_add_dialog(&mut self, dialog: AddDialogView);
    fn hide_add_dialog(&mut self);
    fn set_dialog_attributes(&mut self, concept: &str, attributes: &[CandidateAttribute]);
    fn set_validation(&mut self, report: &ValidationReport);
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingAppControls {
    pub full_screen: bool,
    pub disabled: bool,
    pub disable_inst_inter_impl: bool,
    pub show_avatar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DkfRemoval {
    /// Unlink the real-time assessment but keep its file.
    Unlink,
    DeleteFile,
}

pub trait TrainingAppView: Send {
    fn set_read_only(&mut self, read_only: bool);
    fn set_controls(&mut self, controls: TrainingAppControls);
    fn set_avatar_label(&mut self, label: &str);
    fn set_guidance(&mut self, guidance: Option<&Guidance>);
    /// `scenario_concepts` is `None` until the scenario's concepts are known;
    /// `loaded` is false while they are being fetched.
    fn set_remediation(
        &mut self,
        remediation: Option<&TrainingAppRemediation>,
        scenario_concepts: Option<&[String]>,
        loaded: bool,
    );
    /// Yes/no question; false when the author declines.
    fn confirm(&mut self, title: &str, message: &str) -> bool;
    /// `None` cancels the change of application.
    fn ask_dkf_removal(&mut self, dkf_file: &str) -> Option<DkfRemoval>;
    fn notify(&mut self, notice: Notice);
}
