//! Check-on-learning and practice concept tables of an adaptive courseflow.
//!
//! Every concept chosen for check-on-learning is also practiced. A concept the
//! author picked for practice on their own stays there when it is dropped from
//! check-on-learning; one that was only inherited goes with it.

use std::collections::BTreeSet;

use shared::domain::{MerrillsBranchPoint, QuadrantContent};
use tracing::debug;

use crate::quadrants;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateConcept {
    pub name: String,
    pub chosen: bool,
    /// Held in the practice table by a check-on-learning selection.
    pub remain_selected: bool,
}

impl CandidateConcept {
    fn new(name: &str, chosen: bool) -> Self {
        Self {
            name: name.to_string(),
            chosen,
            remain_selected: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptSelection {
    check_on_learning: Vec<CandidateConcept>,
    practice: Vec<CandidateConcept>,
    independent_practice: BTreeSet<String>,
}

impl ConceptSelection {
    /// Builds both tables from the course concepts and what the branch point
    /// already selects.
    pub fn from_course(course_concepts: &[String], mbp: &MerrillsBranchPoint) -> Self {
        let selected = mbp.concepts.as_deref().unwrap_or_default();
        let practiced: &[String] = mbp
            .quadrants
            .as_ref()
            .and_then(|q| quadrants::practice(&q.content))
            .map(|practice| practice.practice_concepts.as_slice())
            .unwrap_or_default();

        let check_on_learning = course_concepts
            .iter()
            .map(|name| CandidateConcept::new(name, selected.contains(name)))
            .collect();

        let mut independent_practice = BTreeSet::new();
        let practice = course_concepts
            .iter()
            .map(|name| {
                let inherited = selected.contains(name);
                let chosen = inherited || practiced.contains(name);
                if chosen && !inherited {
                    independent_practice.insert(name.clone());
                }
                CandidateConcept {
                    name: name.clone(),
                    chosen,
                    remain_selected: inherited,
                }
            })
            .collect();

        Self {
            check_on_learning,
            practice,
            independent_practice,
        }
    }

    pub fn check_on_learning(&self) -> &[CandidateConcept] {
        &self.check_on_learning
    }

    pub fn practice(&self) -> &[CandidateConcept] {
        &self.practice
    }

    pub fn chosen_check_on_learning(&self) -> Vec<String> {
        chosen_names(&self.check_on_learning)
    }

    pub fn chosen_practice(&self) -> Vec<String> {
        chosen_names(&self.practice)
    }

    /// Course concepts this branch point does not teach.
    pub fn other_course_concepts(&self, mbp: &MerrillsBranchPoint) -> Vec<String> {
        let selected = mbp.concepts.as_deref().unwrap_or_default();
        self.check_on_learning
            .iter()
            .filter(|candidate| !selected.contains(&candidate.name))
            .map(|candidate| candidate.name.clone())
            .collect()
    }

    /// Applies a new check-on-learning selection to both tables and the model.
    pub fn set_check_on_learning(&mut self, selected: &[String], mbp: &mut MerrillsBranchPoint) {
        let concepts = mbp.concepts.get_or_insert_with(Vec::new);
        let mut practice_updates = Vec::new();

        for candidate in &mut self.check_on_learning {
            let was_chosen = candidate.chosen;
            let practice_index = self.practice.iter().position(|p| p.name == candidate.name);

            if selected.contains(&candidate.name) {
                candidate.chosen = true;
                if !concepts.contains(&candidate.name) {
                    concepts.push(candidate.name.clone());
                }
                if let Some(index) = practice_index {
                    let practice = &mut self.practice[index];
                    practice.chosen = true;
                    practice.remain_selected = true;
                }
            } else {
                candidate.chosen = false;
                concepts.retain(|name| name != &candidate.name);
                if let Some(index) = practice_index {
                    if was_chosen {
                        let practice = &mut self.practice[index];
                        practice.remain_selected = false;
                        practice.chosen = self.independent_practice.contains(&practice.name);
                    }
                }
            }

            if let Some(index) = practice_index {
                practice_updates.push(self.practice[index].clone());
            }
        }

        debug!(selected = ?selected, "concepts: check-on-learning selection applied");
        for candidate in &practice_updates {
            update_practice_quadrant(candidate, mbp);
        }
    }

    /// Applies a new practice selection. Concepts still chosen for
    /// check-on-learning cannot be dropped here.
    pub fn set_practice(&mut self, selected: &[String], mbp: &mut MerrillsBranchPoint) {
        for candidate in &mut self.practice {
            if selected.contains(&candidate.name) {
                candidate.chosen = true;
                if !candidate.remain_selected {
                    self.independent_practice.insert(candidate.name.clone());
                }
            } else {
                self.independent_practice.remove(&candidate.name);
                candidate.chosen = self
                    .check_on_learning
                    .iter()
                    .find(|col| col.name == candidate.name)
                    .map(|col| col.chosen)
                    .unwrap_or(false);
            }
            update_practice_quadrant(candidate, mbp);
        }
        debug!(selected = ?selected, "concepts: practice selection applied");
    }
}

fn chosen_names(candidates: &[CandidateConcept]) -> Vec<String> {
    candidates
        .iter()
        .filter(|candidate| candidate.chosen)
        .map(|candidate| candidate.name.clone())
        .collect()
}

fn update_practice_quadrant(candidate: &CandidateConcept, mbp: &mut MerrillsBranchPoint) {
    let Some(content) = mbp.quadrants.as_mut().map(|q| &mut q.content) else {
        return;
    };
    let Some(practice) = content.iter_mut().find_map(|node| match node {
        QuadrantContent::Practice(practice) => Some(practice),
        _ => None,
    }) else {
        return;
    };
    let present = practice.practice_concepts.contains(&candidate.name);
    if candidate.chosen && !present {
        practice.practice_concepts.push(candidate.name.clone());
    } else if !candidate.chosen && present {
        practice
            .practice_concepts
            .retain(|name| name != &candidate.name);
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{Practice, Quadrants};

    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn branch_point(concepts: &[&str], practiced: &[&str]) -> MerrillsBranchPoint {
        MerrillsBranchPoint {
            concepts: Some(names(concepts)),
            quadrants: Some(Quadrants {
                content: vec![QuadrantContent::Practice(Practice {
                    allowed_attempts: None,
                    practice_concepts: names(practiced),
                })],
            }),
            ..MerrillsBranchPoint::default()
        }
    }

    fn practiced(mbp: &MerrillsBranchPoint) -> Vec<String> {
        mbp.quadrants
            .as_ref()
            .and_then(|q| quadrants::practice(&q.content))
            .map(|p| p.practice_concepts.clone())
            .unwrap_or_default()
    }

    #[test]
    fn selecting_check_on_learning_forces_practice() {
        let course = names(&["A", "B"]);
        let mut mbp = branch_point(&[], &[]);
        let mut selection = ConceptSelection::from_course(&course, &mbp);

        selection.set_check_on_learning(&names(&["A"]), &mut mbp);

        assert_eq!(mbp.concepts, Some(names(&["A"])));
        assert_eq!(practiced(&mbp), names(&["A"]));
        let practice_a = &selection.practice()[0];
        assert!(practice_a.chosen && practice_a.remain_selected);
    }

    #[test]
    fn deselecting_inherited_concept_drops_it_from_practice() {
        let course = names(&["A", "B"]);
        let mut mbp = branch_point(&[], &[]);
        let mut selection = ConceptSelection::from_course(&course, &mbp);

        selection.set_check_on_learning(&names(&["A"]), &mut mbp);
        selection.set_check_on_learning(&[], &mut mbp);

        assert_eq!(mbp.concepts, Some(Vec::new()));
        assert!(practiced(&mbp).is_empty());
        assert!(selection.chosen_practice().is_empty());
    }

    #[test]
    fn deselecting_independently_practiced_concept_keeps_it() {
        let course = names(&["A", "B"]);
        let mut mbp = branch_point(&[], &[]);
        let mut selection = ConceptSelection::from_course(&course, &mbp);

        selection.set_practice(&names(&["A"]), &mut mbp);
        selection.set_check_on_learning(&names(&["A"]), &mut mbp);
        selection.set_check_on_learning(&[], &mut mbp);

        assert_eq!(practiced(&mbp), names(&["A"]));
        let practice_a = &selection.practice()[0];
        assert!(practice_a.chosen);
        assert!(!practice_a.remain_selected);
    }

    #[test]
    fn practice_cannot_drop_a_check_on_learning_concept() {
        let course = names(&["A", "B"]);
        let mut mbp = branch_point(&["A"], &["A"]);
        let mut selection = ConceptSelection::from_course(&course, &mbp);

        selection.set_practice(&names(&["B"]), &mut mbp);

        assert_eq!(selection.chosen_practice(), names(&["A", "B"]));
        assert_eq!(practiced(&mbp), names(&["A", "B"]));
    }

    #[test]
    fn loaded_practice_only_concepts_count_as_independent() {
        let course = names(&["A", "B"]);
        let mut mbp = branch_point(&["A"], &["A", "B"]);
        let mut selection = ConceptSelection::from_course(&course, &mbp);
        assert_eq!(selection.other_course_concepts(&mbp), names(&["B"]));

        selection.set_check_on_learning(&names(&["B"]), &mut mbp);
        selection.set_check_on_learning(&[], &mut mbp);

        assert_eq!(practiced(&mbp), names(&["B"]));
    }
}
