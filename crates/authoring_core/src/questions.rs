//! Recall question and scoring tables.

use std::collections::BTreeMap;

use shared::domain::{AssessmentRules, ConceptQuestions, QuestionTypes, Recall};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionEditError {
    #[error("Please enter a positive integer value.")]
    NotAnInteger,
    #[error("Please enter a positive value.")]
    Negative,
    #[error("At least one Easy, Medium, or Hard question must exist for this concept.")]
    NoQuestionsLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Recall questions kept for concepts the course no longer defines, so an
/// author can see and dismiss them instead of silently losing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraneousConcepts {
    entries: BTreeMap<String, ConceptQuestions>,
}

impl ExtraneousConcepts {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConceptQuestions> {
        self.entries.values()
    }

    /// Moves recall questions for unknown concepts into this context and drops
    /// those concepts from the branch point. Only scans once per session.
    pub fn check(
        &mut self,
        course_concepts: &[String],
        recall: &Recall,
        mbp_concepts: &mut Vec<String>,
    ) -> Vec<ConceptQuestions> {
        if self.entries.is_empty() {
            for questions in recall.concept_questions() {
                let Some(name) = questions.name.as_ref() else {
                    continue;
                };
                if course_concepts.contains(name) {
                    continue;
                }
                info!(concept = %name, "questions: keeping questions for concept missing from course");
                self.entries.insert(name.clone(), questions.clone());
                mbp_concepts.retain(|concept| concept != name);
            }
        }
        self.entries.values().cloned().collect()
    }

    /// Forgets an extraneous concept and its recall questions.
    pub fn dismiss(&mut self, name: &str, recall: &mut Recall) -> Option<ConceptQuestions> {
        let removed = self.entries.remove(name)?;
        recall
            .concept_questions_mut()
            .retain(|questions| questions.name.as_deref() != Some(name));
        debug!(concept = %name, "questions: extraneous concept dismissed");
        Some(removed)
    }

    fn take(&mut self, name: &str) {
        self.entries.remove(name);
    }
}

fn with_defaults(mut questions: ConceptQuestions, name: &str) -> ConceptQuestions {
    if questions.question_types.is_none() {
        questions.name = Some(name.to_string());
    }
    let types = questions
        .question_types
        .get_or_insert_with(QuestionTypes::default);
    types.easy.get_or_insert(1);
    types.medium.get_or_insert(0);
    types.hard.get_or_insert(0);

    let rules = questions
        .assessment_rules
        .get_or_insert_with(AssessmentRules::default);
    rules.above_expectation.get_or_insert(1);
    rules.at_expectation.get_or_insert(0);
    rules.below_expectation.get_or_insert(0);
    questions
}

/// Rebuilds the recall questions from the chosen check-on-learning concepts.
/// Returns the rows for the questions and scoring tables; the recall model
/// additionally keeps every extraneous entry after them.
pub fn populate_question_table(
    chosen_concepts: &[String],
    recall: &mut Recall,
    extraneous: &mut ExtraneousConcepts,
) -> Vec<ConceptQuestions> {
    let existing = recall.concept_questions().to_vec();
    let mut rows = Vec::with_capacity(chosen_concepts.len());

    for name in chosen_concepts {
        let found = existing
            .iter()
            .find(|questions| questions.name.as_deref() == Some(name.as_str()))
            .cloned();
        if found.is_some() {
            extraneous.take(name);
        }
        rows.push(with_defaults(found.unwrap_or_default(), name));
    }

    let model = recall.concept_questions_mut();
    model.clear();
    model.extend(rows.iter().cloned());
    model.extend(extraneous.entries().cloned());
    rows
}

pub fn question_row_mut<'a>(recall: &'a mut Recall, concept: &str) -> Option<&'a mut ConceptQuestions> {
    recall
        .concept_questions_mut()
        .iter_mut()
        .find(|questions| questions.name.as_deref() == Some(concept))
}

/// Applies a typed cell value. On error the row is left untouched.
pub fn apply_question_edit(
    row: &mut ConceptQuestions,
    difficulty: Difficulty,
    raw: &str,
) -> Result<(), QuestionEditError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| QuestionEditError::NotAnInteger)?;
    if value < 0 {
        return Err(QuestionEditError::Negative);
    }
    let value = u32::try_from(value).map_err(|_| QuestionEditError::NotAnInteger)?;

    let Some(types) = row.question_types.as_mut() else {
        return Ok(());
    };
    let others = match difficulty {
        Difficulty::Easy => [types.medium, types.hard],
        Difficulty::Medium => [types.easy, types.hard],
        Difficulty::Hard => [types.easy, types.medium],
    };
    if value == 0 && others.iter().all(|other| *other == Some(0)) {
        return Err(QuestionEditError::NoQuestionsLeft);
    }

    let slot = match difficulty {
        Difficulty::Easy => &mut types.easy,
        Difficulty::Medium => &mut types.medium,
        Difficulty::Hard => &mut types.hard,
    };
    *slot = Some(value);
    refresh_thresholds(row);
    Ok(())
}

/// Scoring slider over `0..=total` correct answers with two handles: the
/// at-expectation and above-expectation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringSlider {
    total: u32,
    at_threshold: u32,
    above_threshold: u32,
}

impl ScoringSlider {
    pub fn new(total: u32, at_threshold: u32, above_threshold: u32) -> Self {
        let above_threshold = above_threshold.min(total);
        Self {
            total,
            at_threshold: at_threshold.min(above_threshold),
            above_threshold,
        }
    }

    pub fn from_rules(total: u32, rules: &AssessmentRules) -> Self {
        Self::new(
            total,
            rules.at_expectation.unwrap_or(0),
            rules.above_expectation.unwrap_or(1),
        )
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// `[below, at, above]` correct-answer counts.
    pub fn levels(&self) -> [u32; 3] {
        [0, self.at_threshold, self.above_threshold]
    }
}

/// Slider released: thresholds follow the handles, below stays at zero.
pub fn apply_slider_levels(row: &mut ConceptQuestions, levels: [u32; 3]) {
    let rules = row
        .assessment_rules
        .get_or_insert_with(AssessmentRules::default);
    rules.above_expectation = Some(levels[2]);
    rules.at_expectation = Some(levels[1]);
    rules.below_expectation = Some(0);
}

/// Re-clamps the thresholds after the question counts change.
pub fn refresh_thresholds(row: &mut ConceptQuestions) -> Option<ScoringSlider> {
    let total = row.question_types.as_ref().map(QuestionTypes::total)?;
    let slider = ScoringSlider::from_rules(total, row.assessment_rules.as_ref()?);
    apply_slider_levels(row, slider.levels());
    Some(slider)
}

#[cfg(test)]
#[path = "tests/questions_tests.rs"]
mod tests;
