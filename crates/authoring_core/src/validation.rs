//! Add-dialog validation for content, remediation content and practice
//! applications. Every function here is pure: presenters recompute a
//! [`ValidationReport`] after each edit and hand it to the view.

use std::fmt;

use shared::{
    domain::TrainingApplication,
    metadata::{ActivityType, Metadata, MetadataAttribute, MetadataConcept, PresentAt},
    protocol::QuestionExport,
};

/// What the reference editor inside an add dialog currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadedContent {
    #[default]
    Nothing,
    Media,
    QuestionExport(QuestionExport),
    ConversationTree,
    TrainingApp(Box<TrainingApplication>),
    LessonMaterial { interactive: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    /// Field errors reported by the reference editor itself.
    pub errors: Vec<String>,
    pub loaded: LoadedContent,
}

impl EditorState {
    pub fn with_loaded(loaded: LoadedContent) -> Self {
        Self {
            errors: Vec::new(),
            loaded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Editor(String),
    NoConcepts,
    MissingAttributes { concept: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editor(message) => f.write_str(message),
            Self::NoConcepts => f.write_str("At least one metadata concept must be chosen."),
            Self::MissingAttributes { concept } => write!(
                f,
                "At least one metadata attribute must be chosen for concept '{concept}'."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSubject {
    Content,
    PracticeApplication,
}

impl ValidationSubject {
    fn noun(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::PracticeApplication => "practice application",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub subject: ValidationSubject,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn can_submit(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Error banner shown above the add button; empty when nothing is wrong.
    pub fn to_html(&self) -> String {
        if self.issues.is_empty() {
            return String::new();
        }
        let noun = self.subject.noun();
        let items: String = self
            .issues
            .iter()
            .map(|issue| format!("<li>{issue}</li>"))
            .collect();
        format!(
            "<div style='width: 100%; color: red; font-weight: bold;'> \
             The following problem(s) have been detected in this {noun}:\
             <ul>{items}</ul>\
             You must correct these problems before you can add your {noun}.\
             </div>\
             <hr style='border-top-style: solid; border-top-width: 1px; border-top-color: #AAAAAA;'/>"
        )
    }
}

fn editor_issues(editor: &EditorState) -> impl Iterator<Item = ValidationIssue> + '_ {
    editor.errors.iter().cloned().map(ValidationIssue::Editor)
}

fn concept_issues(metadata: &Metadata, check_attributes: bool, issues: &mut Vec<ValidationIssue>) {
    if metadata.concepts.is_empty() {
        issues.push(ValidationIssue::NoConcepts);
        return;
    }
    if !check_attributes {
        return;
    }
    for concept in &metadata.concepts {
        if missing_attributes(concept, &metadata.present_at) {
            issues.push(ValidationIssue::MissingAttributes {
                concept: concept.name.clone(),
            });
        }
    }
}

fn missing_attributes(concept: &MetadataConcept, present_at: &PresentAt) -> bool {
    match &concept.activity_type {
        Some(ActivityType::Passive { attributes }) => attributes.is_empty(),
        _ => present_at.merrill_quadrant.is_some(),
    }
}

/// Rule/Example content dialog.
pub fn validate_content(metadata: Option<&Metadata>, editor: &EditorState) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = editor_issues(editor).collect();
    if let Some(metadata) = metadata {
        concept_issues(metadata, true, &mut issues);
    }
    ValidationReport {
        subject: ValidationSubject::Content,
        issues,
    }
}

/// Remediation content dialog. Question exports and conversation trees carry
/// no presentation attributes, so only the concept requirement applies.
pub fn validate_remediation_content(
    metadata: Option<&Metadata>,
    editor: &EditorState,
) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = editor_issues(editor).collect();
    if let Some(metadata) = metadata {
        let check_attributes = !matches!(
            editor.loaded,
            LoadedContent::QuestionExport(_) | LoadedContent::ConversationTree
        );
        concept_issues(metadata, check_attributes, &mut issues);
    }
    ValidationReport {
        subject: ValidationSubject::Content,
        issues,
    }
}

/// Practice application dialog. Editor errors only count once a training
/// application or lesson material has been loaded into it.
pub fn validate_practice_application(
    metadata: Option<&Metadata>,
    editor: &EditorState,
) -> ValidationReport {
    let mut issues = Vec::new();
    if matches!(
        editor.loaded,
        LoadedContent::TrainingApp(_) | LoadedContent::LessonMaterial { .. }
    ) {
        issues.extend(editor_issues(editor));
    }
    if let Some(metadata) = metadata {
        concept_issues(metadata, true, &mut issues);
    }
    ValidationReport {
        subject: ValidationSubject::PracticeApplication,
        issues,
    }
}

/// Activity a concept should be tagged with for the content being described.
pub fn derive_activity_type(present_at: &PresentAt, loaded: &LoadedContent) -> ActivityType {
    if present_at.remediation_only {
        match loaded {
            LoadedContent::QuestionExport(question) if question.is_summarize_passage() => {
                return ActivityType::Constructive
            }
            LoadedContent::QuestionExport(_) | LoadedContent::ConversationTree => {
                return ActivityType::Active
            }
            LoadedContent::TrainingApp(_) | LoadedContent::LessonMaterial { interactive: true } => {
                return ActivityType::Interactive
            }
            _ => {}
        }
    }
    ActivityType::passive()
}

/// Re-derives the concept's activity, keeping chosen attributes when it stays passive.
pub fn update_activity_type(concept: &mut MetadataConcept, present_at: &PresentAt, loaded: &LoadedContent) {
    let derived = derive_activity_type(present_at, loaded);
    if derived.is_passive() && concept.activity_type.as_ref().is_some_and(ActivityType::is_passive) {
        return;
    }
    concept.activity_type = Some(derived);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Content,
    Remediation,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateAttribute {
    pub attribute: MetadataAttribute,
    pub chosen: bool,
}

/// Rows of the attribute table for one selected concept. Non-passive concepts
/// have no attributes to choose.
pub fn attribute_candidates(concept: &MetadataConcept, mode: DialogMode) -> Vec<CandidateAttribute> {
    let Some(existing) = concept.passive_attributes() else {
        return Vec::new();
    };
    MetadataAttribute::ALL
        .into_iter()
        .filter(|attribute| match mode {
            DialogMode::Content | DialogMode::Remediation => attribute.is_content_attribute(),
            DialogMode::Application => attribute.is_practice_attribute(),
        })
        .map(|attribute| CandidateAttribute {
            attribute,
            chosen: existing.contains(&attribute),
        })
        .collect()
}

/// Ticks or unticks an attribute on a passive concept.
pub fn set_attribute(concept: &mut MetadataConcept, attribute: MetadataAttribute, chosen: bool) {
    let activity = concept.activity_type.get_or_insert_with(ActivityType::passive);
    let ActivityType::Passive { attributes } = activity else {
        return;
    };
    if chosen {
        if !attributes.contains(&attribute) {
            attributes.push(attribute);
        }
    } else {
        attributes.retain(|existing| *existing != attribute);
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
