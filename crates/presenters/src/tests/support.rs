//! Scripted service and recording views shared by the presenter tests.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use authoring_core::{
    concepts::CandidateConcept,
    questions::ScoringSlider,
    validation::{CandidateAttribute, ValidationReport},
    AuthoringSettings, DispatchService, EventBus,
};
use shared::{
    domain::{
        ConceptQuestions, Guidance, LtiProvider, Media, MerrillQuadrant, TrainingAppRemediation,
    },
    error::{ApiError, ErrorCode},
    metadata::MetadataWrapper,
    protocol::{
        EditorEvent, FileCheck, GatAction, GatResult, PracticeApplicationObject,
        QuadrantSearchResult,
    },
};
use tokio::sync::broadcast;
use url::Url;

use crate::{
    context::AuthoringContext,
    view::{
        AddDialogView, ConceptChoice, DkfRemoval, LessonMaterialView, MandatoryControls, MbpView,
        Notice, TrainingAppControls, TrainingAppView,
    },
};

type Responder = Box<dyn Fn(&GatAction) -> anyhow::Result<GatResult> + Send + Sync>;

/// Answers every action with a plausible default unless a test scripted it.
#[derive(Default)]
pub(crate) struct FakeService {
    actions: Mutex<Vec<GatAction>>,
    responders: Mutex<HashMap<&'static str, Responder>>,
}

impl FakeService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(
        &self,
        action: &'static str,
        responder: impl Fn(&GatAction) -> anyhow::Result<GatResult> + Send + Sync + 'static,
    ) {
        self.responders
            .lock()
            .expect("responders")
            .insert(action, Box::new(responder));
    }

    pub(crate) fn reject(&self, action: &'static str, message: &'static str) {
        self.respond(action, move |_| {
            Ok(GatResult::Failure(ApiError::new(ErrorCode::Internal, message)))
        });
    }

    pub(crate) fn fail(&self, action: &'static str) {
        self.respond(action, |_| Err(anyhow::anyhow!("connection refused")));
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.actions
            .lock()
            .expect("actions")
            .iter()
            .map(GatAction::name)
            .collect()
    }

    pub(crate) fn actions(&self) -> Vec<GatAction> {
        self.actions.lock().expect("actions").clone()
    }

    pub(crate) fn count(&self, action: &str) -> usize {
        self.names().iter().filter(|name| **name == action).count()
    }
}

fn default_result(action: &GatAction) -> GatResult {
    match action {
        GatAction::FetchDomainContentServerAddress => GatResult::DomainContentServerAddress {
            address: "http://gift.local:8885".into(),
        },
        GatAction::WorkspaceFilesExist { .. } => GatResult::FilesExist {
            results: BTreeMap::new(),
        },
        GatAction::GetMerrillQuadrantFiles { .. } => GatResult::QuadrantFiles {
            search_result: QuadrantSearchResult::default(),
        },
        GatAction::GetPracticeApplications { .. } => {
            GatResult::PracticeApplications { applications: None }
        }
        GatAction::ValidateMediaSemantics { .. } => {
            GatResult::MediaSemanticsValidated { valid_file: true }
        }
        GatAction::GetScenarioConcepts { .. } => GatResult::ScenarioConcepts { concepts: None },
        _ => GatResult::Success,
    }
}

#[async_trait]
impl DispatchService for FakeService {
    async fn execute(&self, action: GatAction) -> anyhow::Result<GatResult> {
        self.actions.lock().expect("actions").push(action.clone());
        let responders = self.responders.lock().expect("responders");
        match responders.get(action.name()) {
            Some(responder) => responder(&action),
            None => Ok(default_result(&action)),
        }
    }
}

pub(crate) fn context(
    service: Arc<FakeService>,
    read_only: bool,
) -> (AuthoringContext, broadcast::Receiver<EditorEvent>) {
    let settings = AuthoringSettings {
        server_url: "http://gift.local:8080/gat".into(),
        course_folder_path: "author/course".into(),
        browser_session_key: "session-1".into(),
        read_only,
        ..AuthoringSettings::default()
    };
    let events = EventBus::new();
    let receiver = events.subscribe();
    let context = AuthoringContext::from_settings(&settings, service, events).expect("context");
    (context, receiver)
}

pub(crate) fn drain(receiver: &mut broadcast::Receiver<EditorEvent>) -> Vec<EditorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub(crate) fn wrapper(path: &str, concepts: &[&str]) -> MetadataWrapper {
    MetadataWrapper {
        metadata_file_path: path.to_string(),
        display_name: path.to_string(),
        content_file: None,
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
        is_quadrant_resource: true,
    }
}

#[derive(Default)]
pub(crate) struct LessonMaterialRecorder {
    pub read_only: Option<bool>,
    pub disabled: Option<bool>,
    pub single: Option<Media>,
    pub collection: Option<Vec<Media>>,
    pub lti_concepts: Vec<ConceptChoice>,
    pub lti_providers: Vec<LtiProvider>,
    pub validity: Option<BTreeMap<String, FileCheck>>,
    pub editor_opened: Vec<Option<usize>>,
    pub previews: Vec<Url>,
    pub notices: Vec<Notice>,
}

impl LessonMaterialView for LessonMaterialRecorder {
    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = Some(read_only);
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = Some(disabled);
    }

    fn show_media(&mut self, media: &Media) {
        self.single = Some(media.clone());
    }

    fn show_collection(&mut self, media: &[Media]) {
        self.collection = Some(media.to_vec());
    }

    fn set_lti_concepts(&mut self, concepts: &[ConceptChoice]) {
        self.lti_concepts = concepts.to_vec();
    }

    fn set_lti_providers(&mut self, providers: &[LtiProvider]) {
        self.lti_providers = providers.to_vec();
    }

    fn set_media_validity(&mut self, results: &BTreeMap<String, FileCheck>) {
        self.validity = Some(results.clone());
    }

    fn open_media_editor(&mut self, editing: Option<(usize, &Media)>) {
        self.editor_opened.push(editing.map(|(index, _)| index));
    }

    fn open_preview(&mut self, url: Url) {
        self.previews.push(url);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[derive(Default)]
pub(crate) struct MbpRecorder {
    pub disabled: Option<bool>,
    pub check_on_learning: Vec<CandidateConcept>,
    pub practice: Vec<CandidateConcept>,
    pub question_rows: Vec<ConceptQuestions>,
    pub sliders: Vec<(String, ScoringSlider)>,
    pub removed_sliders: Vec<String>,
    pub extraneous: Vec<ConceptQuestions>,
    pub guidance: HashMap<MerrillQuadrant, Option<Guidance>>,
    pub transition_warnings: HashMap<MerrillQuadrant, Option<String>>,
    pub recall_attempts: Option<Option<u32>>,
    pub practice_attempts: Option<Option<u32>>,
    pub exclude_rule_example: Option<bool>,
    pub mandatory: Option<MandatoryControls>,
    pub loading: HashMap<MerrillQuadrant, bool>,
    pub files: HashMap<MerrillQuadrant, Option<Vec<MetadataWrapper>>>,
    pub added: Vec<(MerrillQuadrant, MetadataWrapper)>,
    pub practice_applications: Option<Vec<PracticeApplicationObject>>,
    pub dialog: Option<AddDialogView>,
    pub dialog_attributes: HashMap<String, Vec<CandidateAttribute>>,
    pub validation: Option<ValidationReport>,
    pub notices: Vec<Notice>,
}

impl MbpView for MbpRecorder {
    fn set_read_only(&mut self, _read_only: bool) {}

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = Some(disabled);
    }

    fn set_check_on_learning_concepts(&mut self, concepts: &[CandidateConcept]) {
        self.check_on_learning = concepts.to_vec();
    }

    fn set_practice_concepts(&mut self, concepts: &[CandidateConcept]) {
        self.practice = concepts.to_vec();
    }

    fn set_lti_providers(&mut self, _providers: &[LtiProvider]) {}

    fn set_question_rows(&mut self, rows: &[ConceptQuestions]) {
        self.question_rows = rows.to_vec();
    }

    fn set_scoring_sliders(&mut self, sliders: &[(String, ScoringSlider)]) {
        self.sliders = sliders.to_vec();
    }

    fn remove_slider(&mut self, concept: &str) {
        self.removed_sliders.push(concept.to_string());
    }

    fn set_extraneous_concepts(&mut self, entries: &[ConceptQuestions]) {
        self.extraneous = entries.to_vec();
    }

    fn set_guidance(&mut self, quadrant: MerrillQuadrant, guidance: Option<&Guidance>) {
        self.guidance.insert(quadrant, guidance.cloned());
    }

    fn set_transitions_warning(&mut self, quadrant: MerrillQuadrant, message: Option<&str>) {
        self.transition_warnings
            .insert(quadrant, message.map(str::to_string));
    }

    fn set_recall_attempts(&mut self, attempts: Option<u32>) {
        self.recall_attempts = Some(attempts);
    }

    fn set_practice_attempts(&mut self, attempts: Option<u32>) {
        self.practice_attempts = Some(attempts);
    }

    fn set_exclude_rule_example_content(&mut self, exclude: bool) {
        self.exclude_rule_example = Some(exclude);
    }

    fn set_mandatory_controls(&mut self, controls: MandatoryControls) {
        self.mandatory = Some(controls);
    }

    fn set_content_loading(&mut self, quadrant: MerrillQuadrant, loading: bool) {
        self.loading.insert(quadrant, loading);
    }

    fn set_content_files(&mut self, quadrant: MerrillQuadrant, files: Option<&[MetadataWrapper]>) {
        self.files.insert(quadrant, files.map(<[_]>::to_vec));
    }

    fn add_content_file(&mut self, quadrant: MerrillQuadrant, file: MetadataWrapper) {
        self.added.push((quadrant, file));
    }

    fn set_practice_applications(&mut self, applications: Option<&[PracticeApplicationObject]>) {
        self.practice_applications = applications.map(<[_]>::to_vec);
    }

    fn remove_practice_application(&mut self, metadata_file_path: &str) -> bool {
        let Some(applications) = self.practice_applications.as_mut() else {
            return false;
        };
        let before = applications.len();
        applications.retain(|app| app.metadata_file_path != metadata_file_path);
        applications.len() != before
    }

    fn show_add_dialog(&mut self, dialog: AddDialogView) {
        self.dialog = Some(dialog);
    }

    fn hide_add_dialog(&mut self) {
        self.dialog = None;
    }

    fn set_dialog_attributes(&mut self, concept: &str, attributes: &[CandidateAttribute]) {
        self.dialog_attributes
            .insert(concept.to_string(), attributes.to_vec());
    }

    fn set_validation(&mut self, report: &ValidationReport) {
        self.validation = Some(report.clone());
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[derive(Default)]
pub(crate) struct TrainingAppRecorder {
    pub read_only: Option<bool>,
    pub controls: Option<TrainingAppControls>,
    pub avatar_label: Option<String>,
    pub guidance: Option<Option<Guidance>>,
    pub remediation: Vec<(Option<TrainingAppRemediation>, Option<Vec<String>>, bool)>,
    /// Answers handed out to `confirm`, in order. Defaults to "no".
    pub confirm_answers: VecDeque<bool>,
    pub confirmations: Vec<String>,
    pub dkf_answer: Option<DkfRemoval>,
    pub dkf_questions: Vec<String>,
    pub notices: Vec<Notice>,
}

impl TrainingAppView for TrainingAppRecorder {
    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = Some(read_only);
    }

    fn set_controls(&mut self, controls: TrainingAppControls) {
        self.controls = Some(controls);
    }

    fn set_avatar_label(&mut self, label: &str) {
        self.avatar_label = Some(label.to_string());
    }

    fn set_guidance(&mut self, guidance: Option<&Guidance>) {
        self.guidance = Some(guidance.cloned());
    }

    fn set_remediation(
        &mut self,
        remediation: Option<&TrainingAppRemediation>,
        scenario_concepts: Option<&[String]>,
        loaded: bool,
    ) {
        self.remediation.push((
            remediation.cloned(),
            scenario_concepts.map(<[_]>::to_vec),
            loaded,
        ));
    }

    fn confirm(&mut self, title: &str, _message: &str) -> bool {
        self.confirmations.push(title.to_string());
        self.confirm_answers.pop_front().unwrap_or(false)
    }

    fn ask_dkf_removal(&mut self, dkf_file: &str) -> Option<DkfRemoval> {
        self.dkf_questions.push(dkf_file.to_string());
        self.dkf_answer
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
