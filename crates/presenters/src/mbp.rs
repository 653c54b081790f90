//! Adaptive courseflow (Merrill's branch point) editor.
//!
//! Content lists for the Rule, Example, Remediation and Practice phases are
//! fetched from the server. A refresh is split into [`MbpPresenter::prepare_refresh`],
//! [`PendingRefresh::fetch`] and [`MbpPresenter::apply_refresh`] so a host
//! can keep several fetches in flight; only the newest fetch per phase is
//! applied.

use authoring_core::{
    client::CallResult,
    concepts::ConceptSelection,
    naming::{self, GeneratedContent},
    pipeline::{
        lesson_material_uploaded_message, question_export_uploaded_message,
        route_generated_metadata, ContentRoute, StepOutcome, METADATA_CREATED_MESSAGE,
        TRAINING_APP_UPLOADED_MESSAGE,
    },
    quadrants::{self, make_data_valid_for_view, AttemptLimit},
    questions::{
        apply_question_edit, apply_slider_levels, populate_question_table, question_row_mut,
        Difficulty, ExtraneousConcepts, ScoringSlider,
    },
    validation::{
        attribute_candidates, set_attribute, update_activity_type, validate_content,
        validate_practice_application, validate_remediation_content, DialogMode, EditorState,
        ValidationReport,
    },
    GenerationPipeline, PipelineError, RefreshDebouncer, RefreshSequencer, RefreshStamp,
    ServiceCallError, ServiceClient,
};
use chrono::Local;
use shared::{
    domain::{
        ConceptQuestions, Course, Guidance, LessonMaterialList, MandatoryBehavior,
        MerrillQuadrant, MerrillsBranchPoint, MediaTypeProperties, TrainingApplication,
        Transitions, DAY_IN_MILLIS,
    },
    metadata::{Metadata, MetadataConcept, MetadataContent, PresentAt},
    protocol::{EditorEvent, PracticeApplicationObject, QuadrantRequest, QuadrantSearchResult, QuestionExport},
};
use tracing::{debug, info, warn};

use crate::{
    context::AuthoringContext,
    error::{service_notice, PresenterError, PresenterResult},
    view::{AddDialogView, ConceptChoice, MandatoryControls, MbpView, Notice},
};

const GUIDED_PHASES: [(MerrillQuadrant, &str); 3] = [
    (MerrillQuadrant::Rule, "Rule"),
    (MerrillQuadrant::Example, "Example"),
    (MerrillQuadrant::Recall, "Recall"),
];

const CONTENT_PHASES: [MerrillQuadrant; 3] = [
    MerrillQuadrant::Rule,
    MerrillQuadrant::Example,
    MerrillQuadrant::RemediationAfterRecall,
];

pub const MULTIPLE_TRANSITIONS_WARNING: &str = "Warning! The authoring tool that you are using doesn't support some of the authored features of \
     this course. Specifically, it looks like this course has multiple transitions following this phase. \
     As a result, if you select the option to show a message after this phase you might destroy some of the transitions already authored.";

const MISSING_CONCEPTS_MESSAGE: &str = "Adaptive Courseflow requires course concepts to be defined and the course concepts could not be loaded. \
     <br/><br/>Please check the course properties to verify that you have specified concepts to cover in this course.";

/// Which list an add dialog contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddTarget {
    Rule,
    Example,
    Remediation,
    PracticeApplication,
}

impl AddTarget {
    fn label(self) -> &'static str {
        match self {
            Self::Rule => "Rule",
            Self::Example => "Example",
            Self::Remediation => "Remediation",
            Self::PracticeApplication => "Practice",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Rule => "Add Rule Content",
            Self::Example => "Add Example Content",
            Self::Remediation => "Add Remediation Content",
            Self::PracticeApplication => "Add Practice Application",
        }
    }

    fn mode(self) -> DialogMode {
        match self {
            Self::Rule | Self::Example => DialogMode::Content,
            Self::Remediation => DialogMode::Remediation,
            Self::PracticeApplication => DialogMode::Application,
        }
    }

    fn present_at(self) -> PresentAt {
        let (merrill_quadrant, remediation_only) = match self {
            Self::Rule => (Some(MerrillQuadrant::Rule), false),
            Self::Example => (Some(MerrillQuadrant::Example), false),
            Self::Remediation => (None, true),
            Self::PracticeApplication => (Some(MerrillQuadrant::Practice), false),
        };
        PresentAt {
            merrill_quadrant,
            remediation_only,
        }
    }
}

/// Content handed over when the author presses the dialog's add button.
#[derive(Debug, Clone, PartialEq)]
pub enum AddedContent {
    /// A file already uploaded to the course folder.
    File { path: String },
    Url { url: String },
    LessonMaterial { list: LessonMaterialList },
    QuestionExport { question: QuestionExport },
    TrainingApp { app: Box<TrainingApplication> },
}

#[derive(Debug, Clone)]
struct AddDialog {
    target: AddTarget,
    metadata: Metadata,
    editor: EditorState,
}

impl AddDialog {
    fn validate(&self) -> ValidationReport {
        match self.target.mode() {
            DialogMode::Content => validate_content(Some(&self.metadata), &self.editor),
            DialogMode::Remediation => validate_remediation_content(Some(&self.metadata), &self.editor),
            DialogMode::Application => validate_practice_application(Some(&self.metadata), &self.editor),
        }
    }
}

/// Mandatory-behavior controls for a behavior.
pub fn mandatory_controls(behavior: &MandatoryBehavior) -> MandatoryControls {
    match behavior {
        MandatoryBehavior::Simple {
            use_existing_learner_state_if_available: true,
        } => MandatoryControls::Optional,
        MandatoryBehavior::Simple { .. } => MandatoryControls::Always,
        MandatoryBehavior::FixedDecay {
            learner_state_shelf_life_ms,
        } => MandatoryControls::AfterShelfLife {
            days: (learner_state_shelf_life_ms.unwrap_or(DAY_IN_MILLIS) / DAY_IN_MILLIS).max(1),
        },
    }
}

/// `None` when the shelf life does not fit in milliseconds.
fn mandatory_behavior(controls: MandatoryControls) -> Option<MandatoryBehavior> {
    let behavior = match controls {
        MandatoryControls::Optional => MandatoryBehavior::Simple {
            use_existing_learner_state_if_available: true,
        },
        MandatoryControls::Always => MandatoryBehavior::Simple {
            use_existing_learner_state_if_available: false,
        },
        MandatoryControls::AfterShelfLife { days } => MandatoryBehavior::FixedDecay {
            learner_state_shelf_life_ms: Some(days.max(1).checked_mul(DAY_IN_MILLIS)?),
        },
    };
    Some(behavior)
}

/// Stamped requests for one content refresh, ready to be sent.
pub struct PendingRefresh {
    client: ServiceClient,
    course_folder_path: String,
    quadrants: Vec<(RefreshStamp, QuadrantRequest)>,
    practice: Option<(RefreshStamp, Vec<String>, Vec<String>)>,
}

/// Server answers for a [`PendingRefresh`].
pub struct FetchedContent {
    quadrants: Option<(Vec<RefreshStamp>, CallResult<QuadrantSearchResult>)>,
    practice: Option<(RefreshStamp, CallResult<Vec<PracticeApplicationObject>>)>,
}

impl PendingRefresh {
    pub fn quadrants(&self) -> Vec<MerrillQuadrant> {
        let mut phases: Vec<_> = self.quadrants.iter().map(|(stamp, _)| stamp.quadrant()).collect();
        if self.practice.is_some() {
            phases.push(MerrillQuadrant::Practice);
        }
        phases
    }

    /// Sends both lookups at once.
    pub async fn fetch(self) -> FetchedContent {
        let Self {
            client,
            course_folder_path,
            quadrants,
            practice,
        } = self;

        let quadrant_lookup = async {
            if quadrants.is_empty() {
                return None;
            }
            let (stamps, requests): (Vec<_>, Vec<_>) = quadrants.into_iter().unzip();
            let result = client.merrill_quadrant_files(&course_folder_path, requests).await;
            Some((stamps, result))
        };
        let practice_lookup = async {
            let (stamp, concepts, other) = practice?;
            let result = client
                .practice_applications(&course_folder_path, concepts, other)
                .await;
            Some((stamp, result))
        };

        let (quadrants, practice) = futures::join!(quadrant_lookup, practice_lookup);
        FetchedContent {
            quadrants,
            practice,
        }
    }
}

pub struct MbpPresenter<V> {
    context: AuthoringContext,
    view: V,
    mbp: Option<MerrillsBranchPoint>,
    course: Course,
    selection: ConceptSelection,
    extraneous: ExtraneousConcepts,
    sequencer: RefreshSequencer,
    debouncer: RefreshDebouncer,
    recall_attempts: AttemptLimit,
    practice_attempts: AttemptLimit,
    dialog: Option<AddDialog>,
    transition_warning_shown: bool,
}

impl<V: MbpView> MbpPresenter<V> {
    pub fn new(context: AuthoringContext, view: V) -> Self {
        let defaults = context.defaults;
        let debouncer = RefreshDebouncer::new(context.refresh_debounce);
        Self {
            context,
            view,
            mbp: None,
            course: Course::default(),
            selection: ConceptSelection::default(),
            extraneous: ExtraneousConcepts::default(),
            sequencer: RefreshSequencer::default(),
            debouncer,
            recall_attempts: AttemptLimit::new(defaults.recall_allowed_attempts),
            practice_attempts: AttemptLimit::new(defaults.practice_allowed_attempts),
            dialog: None,
            transition_warning_shown: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn branch_point(&self) -> Option<&MerrillsBranchPoint> {
        self.mbp.as_ref()
    }

    pub fn selection(&self) -> &ConceptSelection {
        &self.selection
    }

    pub fn extraneous_concepts(&self) -> &ExtraneousConcepts {
        &self.extraneous
    }

    pub fn dialog_metadata(&self) -> Option<&Metadata> {
        self.dialog.as_ref().map(|dialog| &dialog.metadata)
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub async fn edit(&mut self, mut mbp: MerrillsBranchPoint, course: Course) {
        debug!(transition = ?mbp.transition_name, "mbp: edit");
        make_data_valid_for_view(&mut mbp, self.context.defaults);
        self.mbp = Some(mbp);
        self.course = course;
        self.populate().await;
    }

    /// Replaces the course the concept lists come from. Call before
    /// forwarding a course change event.
    pub fn set_course(&mut self, course: Course) {
        self.course = course;
    }

    fn mbp_mut(&mut self) -> PresenterResult<&mut MerrillsBranchPoint> {
        self.mbp.as_mut().ok_or(PresenterError::NotEditing)
    }

    fn dirty(&self) {
        self.context.events.publish(EditorEvent::EditorDirty);
    }

    async fn populate(&mut self) {
        self.view.set_read_only(self.context.read_only);
        let Some(mbp) = self.mbp.as_ref() else {
            return;
        };
        self.view.set_disabled(mbp.disabled);

        let behavior = mbp
            .mandatory_option
            .as_ref()
            .and_then(|option| option.mandatory_behavior.as_ref())
            .map(mandatory_controls)
            .unwrap_or(MandatoryControls::Optional);
        self.view.set_mandatory_controls(behavior);

        self.populate_guidance();
        self.populate_concepts();
        self.view.set_lti_providers(&self.course.lti_providers);

        if let Some(content) = self.mbp.as_ref().and_then(|mbp| mbp.quadrants.as_ref()).map(|q| &q.content) {
            let exclude = quadrants::remediation(content)
                .is_some_and(|remediation| remediation.exclude_rule_example_content);
            let practice_attempts = quadrants::practice(content)
                .and_then(|practice| practice.allowed_attempts)
                .filter(|attempts| *attempts != 0);
            let recall_attempts = quadrants::recall(content)
                .and_then(|recall| recall.allowed_attempts)
                .filter(|attempts| *attempts != 0);
            self.view.set_exclude_rule_example_content(exclude);
            self.view.set_practice_attempts(practice_attempts);
            self.view.set_recall_attempts(recall_attempts);
        }

        self.populate_questions();
        self.refresh_content(None).await;
    }

    fn populate_guidance(&mut self) {
        let Some(content) = self.mbp.as_ref().and_then(|mbp| mbp.quadrants.as_ref()).map(|q| q.content.clone()) else {
            return;
        };
        for (phase, _) in GUIDED_PHASES {
            match quadrants::transitions_after(&content, phase) {
                None => {
                    self.view.set_transitions_warning(phase, None);
                    self.view.set_guidance(phase, None);
                }
                Some(Transitions { guidance }) if guidance.len() == 1 => {
                    self.view.set_transitions_warning(phase, None);
                    self.view.set_guidance(phase, guidance.first());
                }
                Some(_) => {
                    warn!(phase = ?phase, "mbp: transitions after phase cannot be edited here");
                    self.view
                        .set_transitions_warning(phase, Some(MULTIPLE_TRANSITIONS_WARNING));
                    self.view.set_guidance(phase, None);
                    self.show_transition_warning();
                }
            }
        }
    }

    fn show_transition_warning(&mut self) {
        if self.transition_warning_shown {
            return;
        }
        self.view.notify(Notice::warning(
            "Adaptive courseflow error",
            "A problem was detected in one or more <br/>Adaptive courseflow course objects.<br/><br/>\
             Please check this course's Adaptive courseflow course objects and look for any error messages that need addressing.",
        ));
        self.transition_warning_shown = true;
    }

    fn populate_concepts(&mut self) {
        let Some(mbp) = self.mbp.as_mut() else {
            return;
        };
        let names = self.course.concept_names();
        self.selection = ConceptSelection::from_course(&names, mbp);
        self.view
            .set_check_on_learning_concepts(self.selection.check_on_learning());
        self.view.set_practice_concepts(self.selection.practice());

        if self.course.concepts.is_none() {
            self.view
                .notify(Notice::error("Missing course concepts", MISSING_CONCEPTS_MESSAGE));
            return;
        }

        let Some(content) = mbp.quadrants.as_ref().map(|q| &q.content) else {
            return;
        };
        let Some(recall) = quadrants::recall(content).cloned() else {
            return;
        };
        let concepts = mbp.concepts.get_or_insert_with(Vec::new);
        let extraneous = self.extraneous.check(&names, &recall, concepts);
        self.view.set_extraneous_concepts(&extraneous);
    }

    /// Rebuilds the question and scoring tables from the chosen concepts.
    fn populate_questions(&mut self) {
        let chosen = self.selection.chosen_check_on_learning();
        let Some(recall) = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::recall_mut(&mut q.content))
        else {
            self.view.notify(Notice::error(
                "Missing Recall",
                "The Adaptive courseflow Recall object was not created prior to trying to populate the question and scoring components.",
            ));
            return;
        };
        let rows = populate_question_table(&chosen, recall, &mut self.extraneous);
        self.view.set_question_rows(&rows);
        self.view.set_scoring_sliders(&sliders(&rows));
    }

    pub fn set_disabled(&mut self, disabled: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let mbp = self.mbp_mut()?;
        mbp.disabled = disabled;
        let transition_name = mbp.transition_name.clone();
        self.dirty();
        self.context
            .events
            .publish(EditorEvent::CourseObjectDisabled { transition_name });
        Ok(())
    }

    /// Check-on-learning table changed. The content lists are refreshed once
    /// the author stops clicking.
    pub fn set_check_on_learning(&mut self, selected: &[String]) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let previous = self.selection.chosen_check_on_learning();
        let mbp = self.mbp.as_mut().ok_or(PresenterError::NotEditing)?;
        self.selection.set_check_on_learning(selected, mbp);

        for name in previous.iter().filter(|name| !selected.contains(name)) {
            self.view.remove_slider(name);
        }
        self.view
            .set_check_on_learning_concepts(self.selection.check_on_learning());
        self.view.set_practice_concepts(self.selection.practice());
        self.populate_questions();

        self.debouncer.cancel();
        self.debouncer.schedule();
        self.dirty();
        Ok(())
    }

    pub fn set_practice(&mut self, selected: &[String]) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let mbp = self.mbp.as_mut().ok_or(PresenterError::NotEditing)?;
        self.selection.set_practice(selected, mbp);
        self.view.set_practice_concepts(self.selection.practice());
        self.debouncer.schedule();
        self.dirty();
        Ok(())
    }

    /// Runs the debounced refresh once its quiet period is over.
    pub async fn flush_pending_refresh(&mut self) -> bool {
        if !self.debouncer.wait_due().await {
            return false;
        }
        info!("mbp: refreshing content after concept changes");
        self.refresh_content(None).await;
        true
    }

    /// Non-blocking variant for hosts that poll.
    pub async fn refresh_if_due(&mut self) -> bool {
        if !self.debouncer.take_due() {
            return false;
        }
        self.refresh_content(None).await;
        true
    }

    pub async fn refresh_content(&mut self, specific: Option<MerrillQuadrant>) {
        if let Some(pending) = self.prepare_refresh(specific) {
            let fetched = pending.fetch().await;
            self.apply_refresh(fetched);
        }
    }

    /// Stamps the requests for a refresh and marks the lists as loading.
    /// Returns `None` when nothing has to be fetched.
    pub fn prepare_refresh(&mut self, specific: Option<MerrillQuadrant>) -> Option<PendingRefresh> {
        let mbp = self.mbp.as_ref()?;
        let concepts = mbp.concepts.clone().unwrap_or_default();
        if concepts.is_empty() {
            for phase in CONTENT_PHASES {
                self.sequencer.issue(phase);
                self.view.set_content_loading(phase, false);
                self.view.set_content_files(phase, None);
            }
            self.sequencer.issue(MerrillQuadrant::Practice);
            self.view.set_content_loading(MerrillQuadrant::Practice, false);
            self.view.set_practice_applications(None);
            return None;
        }

        let other_course_concepts = self.selection.other_course_concepts(mbp);
        let content = mbp.quadrants.as_ref().map(|q| q.content.as_slice()).unwrap_or_default();
        let exclude_rule_example_content = quadrants::remediation(content)
            .is_some_and(|remediation| remediation.exclude_rule_example_content);
        let practice_concepts = quadrants::practice(content).map(|practice| practice.practice_concepts.clone());

        let phases: Vec<MerrillQuadrant> = match specific {
            None => CONTENT_PHASES.to_vec(),
            Some(phase) if CONTENT_PHASES.contains(&phase) => vec![phase],
            Some(_) => Vec::new(),
        };
        let requests: Vec<QuadrantRequest> = phases
            .iter()
            .map(|&quadrant| {
                let remediation = quadrant == MerrillQuadrant::RemediationAfterRecall;
                QuadrantRequest {
                    quadrant,
                    remediation,
                    concepts: concepts.clone(),
                    other_course_concepts: other_course_concepts.clone(),
                    exclude_rule_example_content: remediation && exclude_rule_example_content,
                }
            })
            .collect();

        let wants_practice = matches!(specific, None | Some(MerrillQuadrant::Practice));
        let practice = practice_concepts
            .filter(|_| wants_practice)
            .map(|practice_concepts| (practice_concepts, other_course_concepts));

        let mut pending = PendingRefresh {
            client: self.context.client.clone(),
            course_folder_path: self.context.course_folder_path.clone(),
            quadrants: Vec::with_capacity(requests.len()),
            practice: None,
        };
        for request in requests {
            let stamp = self.sequencer.issue(request.quadrant);
            self.view.set_content_loading(request.quadrant, true);
            pending.quadrants.push((stamp, request));
        }
        if let Some((practice_concepts, other)) = practice {
            let stamp = self.sequencer.issue(MerrillQuadrant::Practice);
            self.view.set_content_loading(MerrillQuadrant::Practice, true);
            pending.practice = Some((stamp, practice_concepts, other));
        }

        if pending.quadrants.is_empty() && pending.practice.is_none() {
            return None;
        }
        debug!(phases = ?pending.quadrants(), "mbp: refreshing content lists");
        Some(pending)
    }

    /// Applies fetched lists, skipping phases a newer refresh has claimed.
    pub fn apply_refresh(&mut self, fetched: FetchedContent) {
        if let Some((stamps, result)) = fetched.quadrants {
            let current: Vec<MerrillQuadrant> = stamps
                .iter()
                .filter(|stamp| self.sequencer.is_current(stamp))
                .map(RefreshStamp::quadrant)
                .collect();
            for &phase in &current {
                self.view.set_content_loading(phase, false);
            }
            match result {
                Ok(search_result) => {
                    for phase in current {
                        let files = search_result.results_for(phase);
                        self.view.set_content_files(phase, Some(files.as_slice()));
                    }
                }
                Err(err) if !current.is_empty() => {
                    let phases = current
                        .iter()
                        .map(|phase| phase.display_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.view.notify(service_notice(
                        &format!("Failed to Get {phases} Content Files"),
                        &format!("An error occurred while getting the list of {phases} content files."),
                        &err,
                    ));
                }
                Err(err) => debug!("mbp: ignoring failure of a superseded refresh: {err}"),
            }
        }

        if let Some((stamp, result)) = fetched.practice {
            if !self.sequencer.is_current(&stamp) {
                return;
            }
            self.view.set_content_loading(MerrillQuadrant::Practice, false);
            match result {
                Ok(applications) => self.view.set_practice_applications(Some(applications.as_slice())),
                Err(err) => self.view.notify(service_notice(
                    "Failed to Get Practice Content Files",
                    "An error occurred while getting the list of Practice content files.",
                    &err,
                )),
            }
        }
    }

    /// Guidance shown after a phase; `None` removes it.
    pub fn set_guidance(&mut self, phase: MerrillQuadrant, guidance: Option<Guidance>) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let Some((_, label)) = GUIDED_PHASES.iter().find(|(guided, _)| *guided == phase) else {
            return Err(PresenterError::Rejected(format!(
                "{} phase has no guidance",
                phase.display_name()
            )));
        };
        let mbp = self.mbp_mut()?;
        let name = mbp.transition_name.clone().unwrap_or_default();
        let transitions = guidance.map(|mut guidance| {
            guidance.transition_name = Some(format!("{name} - After {label} Guidance"));
            Transitions {
                guidance: vec![guidance],
            }
        });
        if let Some(quadrants) = mbp.quadrants.as_mut() {
            quadrants::set_transitions_after(&mut quadrants.content, phase, transitions);
        }
        self.dirty();
        Ok(())
    }

    pub fn set_recall_attempts_enabled(&mut self, enabled: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let recall = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::recall_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        let shown = self.recall_attempts.set_enabled(&mut recall.allowed_attempts, enabled);
        self.view.set_recall_attempts(shown);
        self.dirty();
        Ok(())
    }

    pub fn set_recall_attempts(&mut self, attempts: u32) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let recall = self
            .mbp_mut()?
            .quadrants
            .as_mut()
            .and_then(|q| quadrants::recall_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        recall.allowed_attempts = Some(attempts);
        self.dirty();
        Ok(())
    }

    pub fn set_practice_attempts_enabled(&mut self, enabled: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let practice = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::practice_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        let shown = self.practice_attempts.set_enabled(&mut practice.allowed_attempts, enabled);
        self.view.set_practice_attempts(shown);
        self.dirty();
        Ok(())
    }

    pub fn set_practice_attempts(&mut self, attempts: u32) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let practice = self
            .mbp_mut()?
            .quadrants
            .as_mut()
            .and_then(|q| quadrants::practice_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        practice.allowed_attempts = Some(attempts);
        self.dirty();
        Ok(())
    }

    pub async fn set_remediation_enabled(&mut self, enabled: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        if let Some(quadrants) = self.mbp_mut()?.quadrants.as_mut() {
            quadrants::set_remediation_enabled(&mut quadrants.content, enabled);
        }
        self.dirty();
        self.refresh_content(Some(MerrillQuadrant::RemediationAfterRecall)).await;
        Ok(())
    }

    pub async fn set_exclude_rule_example_content(&mut self, exclude: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        if let Some(quadrants) = self.mbp_mut()?.quadrants.as_mut() {
            quadrants::set_remediation_enabled(&mut quadrants.content, true);
            if let Some(remediation) = quadrants::remediation_mut(&mut quadrants.content) {
                remediation.exclude_rule_example_content = exclude;
            }
        }
        self.refresh_content(Some(MerrillQuadrant::RemediationAfterRecall)).await;
        self.dirty();
        Ok(())
    }

    pub fn set_mandatory(&mut self, controls: MandatoryControls) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        if self.mbp.is_none() {
            return Err(PresenterError::NotEditing);
        }
        let Some(behavior) = mandatory_behavior(controls) else {
            let message = "The learner state shelf life is too long.";
            self.view.notify(Notice::warning("Invalid value", message));
            let current = self
                .mbp
                .as_ref()
                .and_then(|mbp| mbp.mandatory_option.as_ref())
                .and_then(|option| option.mandatory_behavior.as_ref())
                .map(mandatory_controls)
                .unwrap_or(MandatoryControls::Optional);
            self.view.set_mandatory_controls(current);
            return Err(PresenterError::Rejected(message.into()));
        };
        self.mbp_mut()?
            .mandatory_option
            .get_or_insert_with(Default::default)
            .mandatory_behavior = Some(behavior);
        self.view.set_mandatory_controls(controls);
        self.dirty();
        Ok(())
    }

    /// Question count typed into the questions table. Bad input is rejected
    /// and the table redrawn with the old values.
    pub fn edit_question_count(&mut self, concept: &str, difficulty: Difficulty, raw: &str) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let recall = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::recall_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        let row = question_row_mut(recall, concept)
            .ok_or_else(|| PresenterError::Rejected(format!("no questions for concept '{concept}'")))?;

        let edited = apply_question_edit(row, difficulty, raw);
        let rows = live_rows(recall, &self.extraneous);
        match edited {
            Ok(()) => {
                self.view.set_question_rows(&rows);
                self.view.set_scoring_sliders(&sliders(&rows));
                self.dirty();
                Ok(())
            }
            Err(err) => {
                self.view.notify(Notice::warning("Invalid value", err.to_string()));
                self.view.set_question_rows(&rows);
                Err(PresenterError::Rejected(err.to_string()))
            }
        }
    }

    /// Scoring slider released at `levels` (`[below, at, above]`).
    pub fn set_scoring_levels(&mut self, concept: &str, levels: [u32; 3]) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let recall = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::recall_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        let row = question_row_mut(recall, concept)
            .ok_or_else(|| PresenterError::Rejected(format!("no questions for concept '{concept}'")))?;
        apply_slider_levels(row, levels);
        self.dirty();
        Ok(())
    }

    pub fn dismiss_extraneous_concept(&mut self, concept: &str) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let recall = self
            .mbp
            .as_mut()
            .and_then(|mbp| mbp.quadrants.as_mut())
            .and_then(|q| quadrants::recall_mut(&mut q.content))
            .ok_or(PresenterError::NotEditing)?;
        if self.extraneous.dismiss(concept, recall).is_some() {
            let remaining: Vec<ConceptQuestions> = self.extraneous.entries().cloned().collect();
            self.view.set_extraneous_concepts(&remaining);
            self.dirty();
        }
        Ok(())
    }

    pub async fn delete_practice_application(&mut self, metadata_file_path: &str) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        if let Err(err) = self
            .context
            .client
            .delete_metadata(&self.context.course_folder_path, metadata_file_path)
            .await
        {
            let title = "Failed to Delete Practice Application";
            self.view.notify(service_notice(title, "", &err));
            return Err(PresenterError::service(title, err));
        }
        if !self.view.remove_practice_application(metadata_file_path) {
            self.refresh_content(Some(MerrillQuadrant::Practice)).await;
        }
        Ok(())
    }

    pub fn open_add_dialog(&mut self, target: AddTarget) -> PresenterResult<()> {
        if self.mbp.is_none() {
            return Err(PresenterError::NotEditing);
        }
        if self.context.read_only {
            self.view.notify(Notice::warning(
                "Read only",
                format!("{} content cannot be added in Read-Only mode.", target.label()),
            ));
            return Err(PresenterError::ReadOnly {
                what: target.label(),
            });
        }
        let names = self.course.concept_names();
        if names.is_empty() {
            self.view
                .notify(Notice::warning("Missing course concepts", MISSING_CONCEPTS_MESSAGE));
            return Err(PresenterError::Rejected("the course has no concepts".into()));
        }

        let dialog = AddDialog {
            target,
            metadata: Metadata {
                present_at: target.present_at(),
                ..Metadata::default()
            },
            editor: EditorState::default(),
        };
        self.view.show_add_dialog(AddDialogView {
            title: target.title(),
            concepts: names
                .into_iter()
                .map(|name| ConceptChoice { name, chosen: false })
                .collect(),
        });
        self.view.set_validation(&dialog.validate());
        self.dialog = Some(dialog);
        Ok(())
    }

    pub fn cancel_add_dialog(&mut self) {
        self.dialog = None;
        self.view.hide_add_dialog();
    }

    fn dialog_mut(&mut self) -> PresenterResult<&mut AddDialog> {
        self.dialog.as_mut().ok_or(PresenterError::NotEditing)
    }

    fn revalidate(&mut self) {
        if let Some(dialog) = self.dialog.as_ref() {
            let report = dialog.validate();
            self.view.set_validation(&report);
        }
    }

    pub fn set_dialog_concept(&mut self, concept: &str, chosen: bool) -> PresenterResult<()> {
        let dialog = self.dialog_mut()?;
        let mode = dialog.target.mode();
        let metadata = &mut dialog.metadata;
        if chosen {
            if metadata.concept(concept).is_none() {
                let mut added = MetadataConcept::new(concept);
                update_activity_type(&mut added, &metadata.present_at, &dialog.editor.loaded);
                metadata.concepts.push(added);
            }
        } else {
            metadata.concepts.retain(|existing| existing.name != concept);
        }
        let candidates = metadata
            .concept(concept)
            .map(|selected| attribute_candidates(selected, mode))
            .unwrap_or_default();
        self.view.set_dialog_attributes(concept, &candidates);
        self.revalidate();
        Ok(())
    }

    pub fn set_dialog_attribute(
        &mut self,
        concept: &str,
        attribute: shared::metadata::MetadataAttribute,
        chosen: bool,
    ) -> PresenterResult<()> {
        let dialog = self.dialog_mut()?;
        let mode = dialog.target.mode();
        let selected = dialog
            .metadata
            .concept_mut(concept)
            .ok_or_else(|| PresenterError::Rejected(format!("concept '{concept}' is not selected")))?;
        set_attribute(selected, attribute, chosen);
        let candidates = attribute_candidates(selected, mode);
        self.view.set_dialog_attributes(concept, &candidates);
        self.revalidate();
        Ok(())
    }

    /// The dialog's reference editor loaded or changed content.
    pub fn set_dialog_editor(&mut self, editor: EditorState) -> PresenterResult<()> {
        let dialog = self.dialog_mut()?;
        dialog.editor = editor;
        let mode = dialog.target.mode();
        let present_at = dialog.metadata.present_at.clone();
        let mut refreshed = Vec::with_capacity(dialog.metadata.concepts.len());
        for concept in &mut dialog.metadata.concepts {
            update_activity_type(concept, &present_at, &dialog.editor.loaded);
            refreshed.push((concept.name.clone(), attribute_candidates(concept, mode)));
        }
        for (name, candidates) in refreshed {
            self.view.set_dialog_attributes(&name, &candidates);
        }
        self.revalidate();
        Ok(())
    }

    pub fn set_dialog_display_name(&mut self, display_name: Option<String>) -> PresenterResult<()> {
        self.dialog_mut()?.metadata.display_name = display_name;
        Ok(())
    }

    /// Writes the content's reference file (if any) and metadata file, then
    /// shows the new content in its phase.
    pub async fn submit_add_dialog(&mut self, content: AddedContent) -> PresenterResult<()> {
        self.context.ensure_writable("Adaptive courseflow")?;
        let dialog = self.dialog.as_ref().ok_or(PresenterError::NotEditing)?;
        let report = dialog.validate();
        if !report.can_submit() {
            self.view.set_validation(&report);
            return Err(PresenterError::Rejected(report.messages().join(" ")));
        }
        let target = dialog.target;
        let mut metadata = dialog.metadata.clone();
        let folder = self.context.course_folder_path.clone();
        let now = Local::now().naive_local();
        let mut pipeline = GenerationPipeline::new(self.context.client.clone());
        let mut reference_notices = Vec::new();

        let metadata_path = match (content, target) {
            (AddedContent::File { path }, AddTarget::Rule | AddTarget::Example | AddTarget::Remediation) => {
                let name = naming::file_name(&path).to_string();
                self.view.notify(Notice::toast(format!(
                    "Content for '{name}' has been successfully uploaded to the server."
                )));
                metadata.content = Some(MetadataContent::Simple(name));
                naming::metadata_path_for_file(&folder, &path)
            }
            (AddedContent::Url { url }, AddTarget::Rule | AddTarget::Example | AddTarget::Remediation) => {
                self.view.notify(Notice::toast(format!(
                    "Web address content for '{url}' has been successfully uploaded to the server."
                )));
                let path = naming::metadata_path_for_url(&folder, &url, now);
                metadata.content = Some(MetadataContent::Url(url));
                path
            }
            (AddedContent::QuestionExport { question }, AddTarget::Remediation) => {
                let names = naming::generated_names(&folder, GeneratedContent::QuestionExport, now);
                let (Some(reference_name), Some(reference_path)) = (names.reference_file_name, names.reference_path) else {
                    return Err(self.add_failed("Could not generate metadata file. An error occurred while getting the  file name needed to generate the files."));
                };
                reference_notices.push(question_export_uploaded_message(&question));
                metadata.content = Some(MetadataContent::Simple(reference_name));
                pipeline = pipeline.then_question_export_reference(question, reference_path);
                names.metadata_path
            }
            (AddedContent::LessonMaterial { mut list }, _) => {
                if target == AddTarget::PracticeApplication {
                    let concept_names: Vec<String> = metadata.concepts.iter().map(|c| c.name.clone()).collect();
                    for media in &mut list.media {
                        if let MediaTypeProperties::Lti { lti_concepts, .. } = &mut media.properties {
                            *lti_concepts = concept_names.clone();
                        }
                    }
                    if let Some(media) = list.media.first() {
                        metadata.display_name = Some(media.name.clone());
                    }
                }
                let names = naming::generated_names(&folder, GeneratedContent::LessonMaterial, now);
                let (Some(reference_name), Some(reference_path)) = (names.reference_file_name, names.reference_path) else {
                    return Err(self.add_failed("Could not generate metadata for training lesson material."));
                };
                reference_notices.push(lesson_material_uploaded_message(&list));
                metadata.content = Some(MetadataContent::LessonMaterial(reference_name));
                pipeline = pipeline.then_lesson_material_reference(list, reference_path);
                names.metadata_path
            }
            (AddedContent::TrainingApp { mut app }, AddTarget::PracticeApplication) => {
                let Some(dkf) = app.dkf_ref.as_ref().map(|dkf| dkf.file.clone()) else {
                    return Err(self.add_failed(
                        "Could not generate metadata and training application reference files. \
                         An error occurred while getting the DKF file name needed to generate the files.",
                    ));
                };
                let names = naming::training_app_names(&folder, &dkf);
                let transition_name = app
                    .transition_name
                    .get_or_insert_with(|| naming::file_name(&names.base).to_string())
                    .clone();
                metadata.display_name.get_or_insert(transition_name);
                reference_notices.push(TRAINING_APP_UPLOADED_MESSAGE.to_string());
                metadata.content = Some(MetadataContent::TrainingApp(names.reference_file_name));
                pipeline = pipeline.then_training_app_reference(*app, names.reference_path);
                names.metadata_path
            }
            (_, target) => {
                return Err(self.add_failed(&format!(
                    "This kind of content cannot be added as {} content.",
                    target.label()
                )));
            }
        };

        let generates_reference = !pipeline.steps().is_empty();
        let outcomes = match pipeline.then_metadata(metadata.clone(), metadata_path).run().await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                self.notify_pipeline_failure(&err);
                return Err(err.into());
            }
        };

        for message in reference_notices {
            self.view.notify(Notice::toast(message));
        }
        self.view.notify(Notice::toast(METADATA_CREATED_MESSAGE));
        self.dialog = None;
        self.view.hide_add_dialog();
        if generates_reference {
            self.dirty();
        }

        let wrapper = outcomes.into_iter().find_map(|outcome| match outcome {
            StepOutcome::MetadataWritten { wrapper, .. } => wrapper,
            StepOutcome::ReferenceWritten { .. } => None,
        });
        let taught = self
            .mbp
            .as_ref()
            .and_then(|mbp| mbp.concepts.clone())
            .unwrap_or_default();
        match route_generated_metadata(&metadata, wrapper, &taught) {
            ContentRoute::Append(phase, wrapper) => self.view.add_content_file(phase, wrapper),
            ContentRoute::Refresh(phase) => self.refresh_content(Some(phase)).await,
            ContentRoute::Skip => debug!("mbp: generated content is not for this branch point"),
        }
        Ok(())
    }

    fn add_failed(&mut self, message: &str) -> PresenterError {
        self.view.notify(Notice::warning("Failed to add content", message));
        PresenterError::Rejected(message.to_string())
    }

    fn notify_pipeline_failure(&mut self, err: &PipelineError) {
        let PipelineError::StepFailed {
            step,
            target,
            source,
            ..
        } = err;
        let notice = match source {
            ServiceCallError::Rejected { .. } => service_notice("Error", "", source),
            _ if *step == "metadata file" => Notice::warning(
                "Failed to create metadata",
                format!("An error occurred while communicating with the server to generate a metadata file for {target}"),
            ),
            _ => service_notice(
                "Failed to add content",
                &format!("An error occurred while communicating with the server to generate the {step} {target}"),
                source,
            ),
        };
        self.view.notify(notice);
    }

    pub async fn handle_event(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::CourseConceptsChanged | EditorEvent::CourseLtiProvidersChanged => {
                self.populate().await
            }
            EditorEvent::CourseLoaded => self.transition_warning_shown = false,
            EditorEvent::CourseObjectRenamed { old_name, new_name } => {
                self.rename(old_name.as_deref(), new_name)
            }
            EditorEvent::CourseFolderChanged { course_folder_path } => {
                self.context.course_folder_path = course_folder_path.clone();
            }
            _ => {}
        }
    }

    /// Keeps guidance names in step with the branch point's name.
    fn rename(&mut self, old_name: Option<&str>, new_name: &str) {
        let Some(mbp) = self.mbp.as_mut() else {
            return;
        };
        if mbp.transition_name.as_deref() != old_name {
            return;
        }
        mbp.transition_name = Some(new_name.to_string());
        let Some(quadrants) = mbp.quadrants.as_mut() else {
            return;
        };
        for (phase, label) in GUIDED_PHASES {
            let Some(mut transitions) = quadrants::transitions_after(&quadrants.content, phase).cloned() else {
                continue;
            };
            for guidance in &mut transitions.guidance {
                guidance.transition_name = Some(format!("{new_name} - After {label} Guidance"));
            }
            quadrants::set_transitions_after(&mut quadrants.content, phase, Some(transitions));
        }
    }
}

fn sliders(rows: &[ConceptQuestions]) -> Vec<(String, ScoringSlider)> {
    rows.iter()
        .filter_map(|row| {
            let name = row.name.clone()?;
            let total = row.question_types.as_ref()?.total();
            let rules = row.assessment_rules.as_ref()?;
            Some((name, ScoringSlider::from_rules(total, rules)))
        })
        .collect()
}

/// Recall rows minus the extraneous ones kept at the end of the model.
fn live_rows(recall: &shared::domain::Recall, extraneous: &ExtraneousConcepts) -> Vec<ConceptQuestions> {
    recall
        .concept_questions()
        .iter()
        .filter(|row| !row.name.as_deref().is_some_and(|name| extraneous.contains(name)))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "tests/mbp_tests.rs"]
mod tests;
