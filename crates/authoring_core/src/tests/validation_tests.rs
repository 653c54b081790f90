use super::*;
use shared::domain::MerrillQuadrant;

fn passive(name: &str, attributes: &[MetadataAttribute]) -> MetadataConcept {
    MetadataConcept {
        name: name.to_string(),
        activity_type: Some(ActivityType::Passive {
            attributes: attributes.to_vec(),
        }),
    }
}

fn metadata(concepts: Vec<MetadataConcept>, quadrant: Option<MerrillQuadrant>) -> Metadata {
    Metadata {
        present_at: PresentAt {
            merrill_quadrant: quadrant,
            remediation_only: quadrant.is_none(),
        },
        concepts,
        ..Metadata::default()
    }
}

#[test]
fn no_concepts_blocks_submission() {
    let metadata = metadata(Vec::new(), Some(MerrillQuadrant::Rule));
    let report = validate_content(Some(&metadata), &EditorState::default());

    assert!(!report.can_submit());
    assert_eq!(report.issues, vec![ValidationIssue::NoConcepts]);
    assert_eq!(
        report.messages(),
        vec!["At least one metadata concept must be chosen.".to_string()]
    );
}

#[test]
fn adding_an_attribute_clears_only_that_concepts_error() {
    let mut metadata = metadata(
        vec![passive("A", &[]), passive("B", &[])],
        Some(MerrillQuadrant::Example),
    );
    let editor = EditorState::default();

    let report = validate_content(Some(&metadata), &editor);
    assert_eq!(
        report.issues,
        vec![
            ValidationIssue::MissingAttributes { concept: "A".into() },
            ValidationIssue::MissingAttributes { concept: "B".into() },
        ]
    );

    let concept = metadata.concept_mut("A").expect("concept A");
    set_attribute(concept, MetadataAttribute::Text, true);

    let report = validate_content(Some(&metadata), &editor);
    assert_eq!(
        report.issues,
        vec![ValidationIssue::MissingAttributes { concept: "B".into() }]
    );
    assert_eq!(
        report.messages(),
        vec!["At least one metadata attribute must be chosen for concept 'B'.".to_string()]
    );
}

#[test]
fn non_passive_concept_needs_attributes_once_a_phase_is_set() {
    let concept = MetadataConcept {
        name: "A".into(),
        activity_type: None,
    };

    let with_phase = metadata(vec![concept.clone()], Some(MerrillQuadrant::Rule));
    assert!(!validate_content(Some(&with_phase), &EditorState::default()).can_submit());

    let remediation_only = metadata(vec![concept], None);
    assert!(validate_content(Some(&remediation_only), &EditorState::default()).can_submit());
}

#[test]
fn editor_errors_come_first() {
    let metadata = metadata(Vec::new(), Some(MerrillQuadrant::Rule));
    let editor = EditorState {
        errors: vec!["A URL must be provided.".into()],
        loaded: LoadedContent::Media,
    };

    let report = validate_content(Some(&metadata), &editor);
    assert_eq!(
        report.messages(),
        vec![
            "A URL must be provided.".to_string(),
            "At least one metadata concept must be chosen.".to_string(),
        ]
    );
}

#[test]
fn remediation_skips_attributes_for_question_exports() {
    let metadata = metadata(vec![passive("A", &[])], None);
    let question = EditorState::with_loaded(LoadedContent::QuestionExport(QuestionExport {
        question_text: "Highlight the key sentence".into(),
        answer_field_text_box: None,
    }));

    assert!(validate_remediation_content(Some(&metadata), &question).can_submit());
    assert!(
        validate_remediation_content(Some(&metadata), &EditorState::with_loaded(LoadedContent::ConversationTree))
            .can_submit()
    );
    assert!(
        !validate_remediation_content(Some(&metadata), &EditorState::with_loaded(LoadedContent::Media))
            .can_submit()
    );
}

#[test]
fn practice_ignores_editor_errors_until_something_is_loaded() {
    let metadata = metadata(
        vec![passive("A", &[MetadataAttribute::Realistic])],
        Some(MerrillQuadrant::Practice),
    );
    let mut editor = EditorState {
        errors: vec!["Select a training application type.".into()],
        loaded: LoadedContent::Nothing,
    };
    assert!(validate_practice_application(Some(&metadata), &editor).can_submit());

    editor.loaded = LoadedContent::LessonMaterial { interactive: false };
    let report = validate_practice_application(Some(&metadata), &editor);
    assert_eq!(report.messages(), vec!["Select a training application type.".to_string()]);
}

#[test]
fn html_banner_names_the_subject() {
    let report = ValidationReport {
        subject: ValidationSubject::PracticeApplication,
        issues: vec![ValidationIssue::NoConcepts],
    };
    let html = report.to_html();
    assert!(html.starts_with("<div style='width: 100%; color: red; font-weight: bold;'> The following problem(s) have been detected in this practice application:<ul>"));
    assert!(html.contains("<li>At least one metadata concept must be chosen.</li>"));
    assert!(html.contains("before you can add your practice application.</div><hr "));

    let clean = ValidationReport {
        subject: ValidationSubject::Content,
        issues: Vec::new(),
    };
    assert_eq!(clean.to_html(), "");
}

#[test]
fn remediation_only_activity_follows_loaded_content() {
    let remediation = PresentAt {
        merrill_quadrant: None,
        remediation_only: true,
    };
    let summarize = LoadedContent::QuestionExport(QuestionExport {
        question_text: "Summarize".into(),
        answer_field_text_box: Some(true),
    });

    assert_eq!(derive_activity_type(&remediation, &summarize), ActivityType::Constructive);
    assert_eq!(
        derive_activity_type(&remediation, &LoadedContent::ConversationTree),
        ActivityType::Active
    );
    assert_eq!(
        derive_activity_type(&remediation, &LoadedContent::LessonMaterial { interactive: true }),
        ActivityType::Interactive
    );
    assert_eq!(
        derive_activity_type(&remediation, &LoadedContent::Media),
        ActivityType::passive()
    );
    assert_eq!(
        derive_activity_type(&PresentAt::default(), &summarize),
        ActivityType::passive()
    );
}

#[test]
fn update_activity_type_keeps_existing_passive_attributes() {
    let mut concept = passive("A", &[MetadataAttribute::Video]);
    update_activity_type(&mut concept, &PresentAt::default(), &LoadedContent::Media);
    assert_eq!(concept.passive_attributes(), Some(&[MetadataAttribute::Video][..]));
}

#[test]
fn attribute_candidates_depend_on_dialog() {
    let concept = passive("A", &[MetadataAttribute::Simulated]);

    let content = attribute_candidates(&concept, DialogMode::Content);
    assert!(content.iter().all(|c| c.attribute.is_content_attribute()));
    assert!(content.iter().all(|c| !c.chosen));

    let application = attribute_candidates(&concept, DialogMode::Application);
    assert_eq!(application.len(), 5);
    assert!(application
        .iter()
        .any(|c| c.attribute == MetadataAttribute::Simulated && c.chosen));

    let active = MetadataConcept {
        name: "B".into(),
        activity_type: Some(ActivityType::Active),
    };
    assert!(attribute_candidates(&active, DialogMode::Content).is_empty());
}
