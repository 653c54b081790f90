//! Canonical layout of an adaptive courseflow's quadrant content.
//!
//! After [`make_data_valid_for_view`] the content list always reads
//! `[Rule, T?, Example, T?, Recall, Remediation?, T?, Practice]`, where each
//! `T` is the Transitions node shown after the phase before it. Recall's
//! transitions sit after the Remediation node when one exists.

use shared::domain::{
    MandatoryBehavior, MandatoryOption, MerrillQuadrant, MerrillsBranchPoint, Practice,
    QuadrantContent, Quadrants, Recall, Remediation, Transitions, DAY_IN_MILLIS,
    KNOWLEDGE_ASSESSMENT_QBANK_KEY,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadrantDefaults {
    pub recall_allowed_attempts: u32,
    pub practice_allowed_attempts: u32,
}

impl From<&crate::config::AuthoringSettings> for QuadrantDefaults {
    fn from(settings: &crate::config::AuthoringSettings) -> Self {
        Self {
            recall_allowed_attempts: settings.default_recall_allowed_attempts,
            practice_allowed_attempts: settings.default_practice_allowed_attempts,
        }
    }
}

/// Brings a branch point loaded from disk into the shape the editor expects.
pub fn make_data_valid_for_view(mbp: &mut MerrillsBranchPoint, defaults: QuadrantDefaults) {
    mbp.concepts.get_or_insert_with(Vec::new);

    let quadrants = mbp.quadrants.get_or_insert_with(Quadrants::default);
    let content = std::mem::take(&mut quadrants.content);
    quadrants.content = normalize_content(content, defaults);

    let option = mbp
        .mandatory_option
        .get_or_insert_with(MandatoryOption::default);
    match &mut option.mandatory_behavior {
        None => {
            option.mandatory_behavior = Some(MandatoryBehavior::Simple {
                use_existing_learner_state_if_available: true,
            })
        }
        Some(MandatoryBehavior::FixedDecay {
            learner_state_shelf_life_ms,
        }) => {
            learner_state_shelf_life_ms.get_or_insert(DAY_IN_MILLIS);
        }
        Some(MandatoryBehavior::Simple { .. }) => {}
    }
}

/// Reorders `content` into the canonical layout, synthesizing missing phases.
pub fn normalize_content(
    content: Vec<QuadrantContent>,
    defaults: QuadrantDefaults,
) -> Vec<QuadrantContent> {
    let mut slots: Vec<Option<QuadrantContent>> = content.into_iter().map(Some).collect();

    let mut rule = None;
    let mut rule_transitions = None;
    let mut example = None;
    let mut example_transitions = None;
    let mut recall = None;
    let mut recall_transitions = None;
    let mut remediation = None;
    let mut practice = None;

    for index in 0..slots.len() {
        let Some(node) = slots[index].take() else {
            continue;
        };
        match node {
            QuadrantContent::Rule(node) if rule.is_none() => {
                rule = Some(node);
                rule_transitions = take_transitions(&mut slots, index + 1);
            }
            QuadrantContent::Example(node) if example.is_none() => {
                example = Some(node);
                example_transitions = take_transitions(&mut slots, index + 1);
            }
            QuadrantContent::Recall(node) if recall.is_none() => {
                recall = Some(node);
                if let Some(transitions) = take_transitions(&mut slots, index + 1) {
                    recall_transitions.get_or_insert(transitions);
                }
            }
            QuadrantContent::Remediation(node) if remediation.is_none() => {
                remediation = Some(node);
                if let Some(transitions) = take_transitions(&mut slots, index + 1) {
                    recall_transitions = Some(transitions);
                }
            }
            QuadrantContent::Practice(node) if practice.is_none() => {
                practice = Some(node);
            }
            other => {
                debug!(kind = other.kind_name(), "quadrants: dropping duplicate or stray node");
            }
        }
    }

    let mut recall = recall.unwrap_or_else(|| Recall {
        allowed_attempts: Some(defaults.recall_allowed_attempts),
        present_survey: None,
    });
    bind_recall_survey(&mut recall);

    let practice = practice.unwrap_or_else(|| Practice {
        allowed_attempts: Some(defaults.practice_allowed_attempts),
        practice_concepts: Vec::new(),
    });

    let mut normalized = Vec::with_capacity(8);
    normalized.push(QuadrantContent::Rule(rule.unwrap_or_default()));
    normalized.extend(rule_transitions.map(QuadrantContent::Transitions));
    normalized.push(QuadrantContent::Example(example.unwrap_or_default()));
    normalized.extend(example_transitions.map(QuadrantContent::Transitions));
    normalized.push(QuadrantContent::Recall(recall));
    normalized.extend(remediation.map(QuadrantContent::Remediation));
    normalized.extend(recall_transitions.map(QuadrantContent::Transitions));
    normalized.push(QuadrantContent::Practice(practice));
    normalized
}

fn take_transitions(slots: &mut [Option<QuadrantContent>], index: usize) -> Option<Transitions> {
    match slots.get(index) {
        Some(Some(QuadrantContent::Transitions(_))) => match slots[index].take() {
            Some(QuadrantContent::Transitions(transitions)) => Some(transitions),
            _ => None,
        },
        _ => None,
    }
}

fn bind_recall_survey(recall: &mut Recall) {
    recall.concept_questions_mut();
    if let Some(choice) = recall
        .present_survey
        .as_mut()
        .and_then(|survey| survey.survey_choice.as_mut())
    {
        choice.gift_survey_key = Some(KNOWLEDGE_ASSESSMENT_QBANK_KEY.to_string());
    }
}

fn phase_index(content: &[QuadrantContent], quadrant: MerrillQuadrant) -> Option<usize> {
    let matches = |node: &QuadrantContent| match quadrant {
        MerrillQuadrant::Rule => matches!(node, QuadrantContent::Rule(_)),
        MerrillQuadrant::Example => matches!(node, QuadrantContent::Example(_)),
        MerrillQuadrant::Recall => matches!(node, QuadrantContent::Recall(_)),
        MerrillQuadrant::Practice => matches!(node, QuadrantContent::Practice(_)),
        MerrillQuadrant::RemediationAfterRecall | MerrillQuadrant::RemediationAfterPractice => {
            matches!(node, QuadrantContent::Remediation(_))
        }
    };
    content.iter().position(matches)
}

/// Index of the node that Transitions for `quadrant` would follow.
fn anchor_index(content: &[QuadrantContent], quadrant: MerrillQuadrant) -> Option<usize> {
    let index = phase_index(content, quadrant)?;
    if quadrant == MerrillQuadrant::Recall {
        if let Some(QuadrantContent::Remediation(_)) = content.get(index + 1) {
            return Some(index + 1);
        }
    }
    Some(index)
}

pub fn transitions_after(content: &[QuadrantContent], quadrant: MerrillQuadrant) -> Option<&Transitions> {
    let anchor = anchor_index(content, quadrant)?;
    match content.get(anchor + 1) {
        Some(QuadrantContent::Transitions(transitions)) => Some(transitions),
        _ => None,
    }
}

/// Replaces, inserts or (with `None`) removes the Transitions after `quadrant`.
pub fn set_transitions_after(
    content: &mut Vec<QuadrantContent>,
    quadrant: MerrillQuadrant,
    transitions: Option<Transitions>,
) {
    let Some(anchor) = anchor_index(content, quadrant) else {
        return;
    };
    let slot = anchor + 1;
    let existing = matches!(content.get(slot), Some(QuadrantContent::Transitions(_)));
    match (existing, transitions) {
        (true, Some(transitions)) => content[slot] = QuadrantContent::Transitions(transitions),
        (true, None) => {
            content.remove(slot);
        }
        (false, Some(transitions)) => content.insert(slot, QuadrantContent::Transitions(transitions)),
        (false, None) => {}
    }
}

pub fn recall(content: &[QuadrantContent]) -> Option<&Recall> {
    content.iter().find_map(|node| match node {
        QuadrantContent::Recall(recall) => Some(recall),
        _ => None,
    })
}

pub fn recall_mut(content: &mut [QuadrantContent]) -> Option<&mut Recall> {
    content.iter_mut().find_map(|node| match node {
        QuadrantContent::Recall(recall) => Some(recall),
        _ => None,
    })
}

pub fn remediation(content: &[QuadrantContent]) -> Option<&Remediation> {
    content.iter().find_map(|node| match node {
        QuadrantContent::Remediation(remediation) => Some(remediation),
        _ => None,
    })
}

pub fn remediation_mut(content: &mut [QuadrantContent]) -> Option<&mut Remediation> {
    content.iter_mut().find_map(|node| match node {
        QuadrantContent::Remediation(remediation) => Some(remediation),
        _ => None,
    })
}

pub fn practice(content: &[QuadrantContent]) -> Option<&Practice> {
    content.iter().find_map(|node| match node {
        QuadrantContent::Practice(practice) => Some(practice),
        _ => None,
    })
}

pub fn practice_mut(content: &mut [QuadrantContent]) -> Option<&mut Practice> {
    content.iter_mut().find_map(|node| match node {
        QuadrantContent::Practice(practice) => Some(practice),
        _ => None,
    })
}

/// Adds a Remediation node directly after Recall, or removes it. Recall's
/// transitions keep trailing whichever node ends the recall phase.
pub fn set_remediation_enabled(content: &mut Vec<QuadrantContent>, enabled: bool) {
    let has_remediation = remediation(content).is_some();
    if enabled == has_remediation {
        return;
    }
    let Some(recall_index) = phase_index(content, MerrillQuadrant::Recall) else {
        return;
    };
    if enabled {
        content.insert(recall_index + 1, QuadrantContent::Remediation(Remediation::default()));
    } else if let Some(index) = phase_index(content, MerrillQuadrant::RemediationAfterRecall) {
        content.remove(index);
    }
}

/// Allowed-attempt limit behind a show/hide toggle. Hiding clears the limit
/// and remembers the last non-zero value so showing it again restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLimit {
    default_attempts: u32,
    last_attempts: Option<u32>,
}

impl AttemptLimit {
    pub fn new(default_attempts: u32) -> Self {
        Self {
            default_attempts,
            last_attempts: None,
        }
    }

    /// Returns the value to show in the spinner when enabling.
    pub fn set_enabled(&mut self, allowed_attempts: &mut Option<u32>, enabled: bool) -> Option<u32> {
        if enabled {
            let value = match *allowed_attempts {
                Some(current) if current != 0 => current,
                _ => self.last_attempts.unwrap_or(self.default_attempts),
            };
            *allowed_attempts = Some(value);
            Some(value)
        } else {
            if let Some(current) = allowed_attempts.take() {
                if current != 0 {
                    self.last_attempts = Some(current);
                }
            }
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/quadrants_tests.rs"]
mod tests;

