//! Candidate set and the user's chosen subset.

use std::collections::HashSet;

use crate::model::CandidatePoint;

/// Holds the selectable water points and which of them are chosen.
///
/// Selection order always follows candidate order, not click order.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    candidates: Vec<CandidatePoint>,
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn new(candidates: Vec<CandidatePoint>) -> Self {
        Self {
            candidates,
            selected: HashSet::new(),
        }
    }

    pub fn candidates(&self) -> &[CandidatePoint] {
        &self.candidates
    }

    /// Swaps in a fresh candidate set, keeping chosen ids that still exist.
    pub fn replace_candidates(&mut self, candidates: Vec<CandidatePoint>) {
        let known: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        self.selected.retain(|id| known.contains(id.as_str()));
        self.candidates = candidates;
    }

    /// Flips one candidate in or out. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if !self.candidates.iter().any(|candidate| candidate.id == id) {
            return;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.candidates.iter().map(|c| c.id.clone()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> Vec<CandidatePoint> {
        self.candidates
            .iter()
            .filter(|candidate| self.selected.contains(&candidate.id))
            .cloned()
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|candidate| self.selected.contains(&candidate.id))
            .map(|candidate| candidate.id.clone())
            .collect()
    }
}
