//! Selection and preference state.
//!
//! Two independent lifecycles:
//!
//! * [`Selection`]: search text, difficulty, tags, progress filter and the
//!   selected topic. Ephemeral; resets every session.
//! * [`LearnedSet`]: topics the user marked as learned. Durable, shared
//!   with every other process using the same storage.
//!
//! [`Preferences`] bundles both for front ends. Clearing filters never
//! touches the learned set.

pub mod learned;
pub mod selection;

pub use learned::LearnedSet;
pub use selection::Selection;

use crate::catalog::{query, CatalogIndex, TopicId};
use crate::storage::Storage;

pub struct Preferences {
    selection: Selection,
    learned: LearnedSet,
}

impl Preferences {
    pub fn new(storage: Storage) -> Self {
        Self {
            selection: Selection::default(),
            learned: LearnedSet::new(storage),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn learned(&self) -> &LearnedSet {
        &self.learned
    }

    /// Replace the selection with the snapshot `transition` derives from it.
    pub fn update(&mut self, transition: impl FnOnce(&Selection) -> Selection) {
        self.selection = transition(&self.selection);
    }

    pub fn clear_filters(&mut self) {
        self.update(Selection::clear_filters);
    }

    /// Evaluate the current selection, including its progress filter.
    pub fn visible_topics(&self, index: &CatalogIndex) -> Vec<TopicId> {
        let ids = query::evaluate(index, &self.selection.query());
        query::retain_progress(ids, self.selection.progress, |id| self.learned.is_learned(id))
    }
}
