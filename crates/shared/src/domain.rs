use serde::{Deserialize, Serialize};

/// Question bank key every adaptive courseflow recall survey is bound to.
pub const KNOWLEDGE_ASSESSMENT_QBANK_KEY: &str = "KnowledgeAssessmentQBank";

/// Value of `TrainingApplication::finished_when` when the author never chose one.
pub const TRAINING_APP_STOPPED_STATE: &str = "STOPPED";

pub const DAY_IN_MILLIS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerrillQuadrant {
    Rule,
    Example,
    Recall,
    Practice,
    RemediationAfterRecall,
    RemediationAfterPractice,
}

impl MerrillQuadrant {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rule => "Rule",
            Self::Example => "Example",
            Self::Recall => "Recall",
            Self::Practice => "Practice",
            Self::RemediationAfterRecall => "Remediation after Recall",
            Self::RemediationAfterPractice => "Remediation after Practice",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub transition_name: Option<String>,
    pub message: Option<String>,
    pub full_screen: bool,
}

/// Guidance shown between two phases of an adaptive courseflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    pub guidance: Vec<Guidance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTypes {
    pub easy: Option<u32>,
    pub medium: Option<u32>,
    pub hard: Option<u32>,
}

impl QuestionTypes {
    pub fn total(&self) -> u32 {
        self.easy.unwrap_or(0) + self.medium.unwrap_or(0) + self.hard.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRules {
    pub above_expectation: Option<u32>,
    pub at_expectation: Option<u32>,
    pub below_expectation: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptQuestions {
    pub name: Option<String>,
    pub question_types: Option<QuestionTypes>,
    pub assessment_rules: Option<AssessmentRules>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptSurvey {
    pub gift_survey_key: Option<String>,
    pub concept_questions: Vec<ConceptQuestions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentSurvey {
    pub survey_choice: Option<ConceptSurvey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recall {
    /// `Some(0)` means unlimited attempts.
    pub allowed_attempts: Option<u32>,
    pub present_survey: Option<PresentSurvey>,
}

impl Recall {
    /// Concept questions of the recall survey, creating the survey on demand.
    pub fn concept_questions_mut(&mut self) -> &mut Vec<ConceptQuestions> {
        &mut self
            .present_survey
            .get_or_insert_with(PresentSurvey::default)
            .survey_choice
            .get_or_insert_with(ConceptSurvey::default)
            .concept_questions
    }

    pub fn concept_questions(&self) -> &[ConceptQuestions] {
        self.present_survey
            .as_ref()
            .and_then(|survey| survey.survey_choice.as_ref())
            .map(|choice| choice.concept_questions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    pub exclude_rule_example_content: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub allowed_attempts: Option<u32>,
    pub practice_concepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum QuadrantContent {
    Rule(Rule),
    Example(Example),
    Recall(Recall),
    Remediation(Remediation),
    Practice(Practice),
    Transitions(Transitions),
}

impl QuadrantContent {
    pub fn is_transitions(&self) -> bool {
        matches!(self, Self::Transitions(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rule(_) => "rule",
            Self::Example(_) => "example",
            Self::Recall(_) => "recall",
            Self::Remediation(_) => "remediation",
            Self::Practice(_) => "practice",
            Self::Transitions(_) => "transitions",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadrants {
    pub content: Vec<QuadrantContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MandatoryBehavior {
    Simple {
        use_existing_learner_state_if_available: bool,
    },
    FixedDecay {
        learner_state_shelf_life_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandatoryOption {
    pub mandatory_behavior: Option<MandatoryBehavior>,
}

/// Adaptive courseflow course object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerrillsBranchPoint {
    pub transition_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub concepts: Option<Vec<String>>,
    pub quadrants: Option<Quadrants>,
    pub mandatory_option: Option<MandatoryOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaTypeProperties {
    SlideShow {
        slide_relative_paths: Vec<String>,
    },
    Pdf,
    Image,
    Video,
    YoutubeVideo {
        size: Option<Size>,
    },
    WebPage,
    Lti {
        provider_id: Option<String>,
        lti_concepts: Vec<String>,
    },
}

impl MediaTypeProperties {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SlideShow { .. } => "slide show",
            Self::Pdf => "PDF",
            Self::Image => "image",
            Self::Video => "video",
            Self::YoutubeVideo { .. } => "YouTube video",
            Self::WebPage => "web page",
            Self::Lti { .. } => "LTI provider",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub name: String,
    pub uri: String,
    pub properties: MediaTypeProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMaterialList {
    pub is_collection: Option<bool>,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMaterial {
    pub transition_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub lesson_material_list: Option<LessonMaterialList>,
    /// Legacy references to standalone lesson material files.
    pub lesson_material_files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingApplicationType {
    SimpleExampleTa,
    Vbs,
    Tc3,
    PowerPoint,
    Unity,
    VrEngage,
    Ares,
    DeRemoteApp,
}

impl TrainingApplicationType {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::SimpleExampleTa => "Simple Example TA",
            Self::Vbs => "VBS",
            Self::Tc3 => "TC3",
            Self::PowerPoint => "PowerPoint",
            Self::Unity => "Unity",
            Self::VrEngage => "VR-Engage",
            Self::Ares => "ARES",
            Self::DeRemoteApp => "Desktop Remote App",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interops {
    pub implementations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkfRef {
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSemantics {
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowAvatarInitially {
    pub avatar_choice: Option<MediaSemantics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingAppRemediation {
    pub allowed_attempts: Option<u32>,
    pub concepts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingAppOptions {
    pub full_screen: Option<bool>,
    pub disabled: Option<bool>,
    pub disable_inst_inter_impl: Option<bool>,
    pub show_avatar_initially: Option<ShowAvatarInitially>,
    pub remediation: Option<TrainingAppRemediation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingApplication {
    pub transition_name: Option<String>,
    pub app_type: Option<TrainingApplicationType>,
    pub interops: Option<Interops>,
    pub dkf_ref: Option<DkfRef>,
    pub options: Option<TrainingAppOptions>,
    pub guidance: Option<Guidance>,
    pub finished_when: Option<String>,
    #[serde(default)]
    pub embedded_app: bool,
}

impl TrainingApplication {
    pub fn options_mut(&mut self) -> &mut TrainingAppOptions {
        self.options.get_or_insert_with(TrainingAppOptions::default)
    }

    pub fn remediation(&self) -> Option<&TrainingAppRemediation> {
        self.options.as_ref().and_then(|options| options.remediation.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<ConceptNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CourseConcepts {
    List(Vec<String>),
    Hierarchy(ConceptNode),
}

impl CourseConcepts {
    /// Every concept name in the course, hierarchy flattened depth-first.
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::List(names) => names.clone(),
            Self::Hierarchy(root) => {
                let mut names = Vec::new();
                collect_concept_names(root, &mut names);
                names
            }
        }
    }
}

fn collect_concept_names(node: &ConceptNode, names: &mut Vec<String>) {
    names.push(node.name.clone());
    for child in &node.children {
        collect_concept_names(child, names);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiProvider {
    pub identifier: String,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub concepts: Option<CourseConcepts>,
    #[serde(default)]
    pub lti_providers: Vec<LtiProvider>,
    pub survey_context: Option<i64>,
}

impl Course {
    pub fn concept_names(&self) -> Vec<String> {
        self.concepts
            .as_ref()
            .map(CourseConcepts::names)
            .unwrap_or_default()
    }
}
