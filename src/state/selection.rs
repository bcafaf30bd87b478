//! Ephemeral selection state: the user's current query parameters.
//!
//! Every transition takes `&self` and returns a new snapshot; the previous
//! snapshot is untouched. Nothing here is persisted.

use crate::catalog::{DifficultyFilter, ProgressFilter, Query, TopicId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub search_query: String,
    pub difficulty: DifficultyFilter,
    /// Selected tags in the order the user picked them.
    pub tags: Vec<String>,
    pub progress: ProgressFilter,
    pub selected_topic: Option<TopicId>,
}

impl Selection {
    pub fn set_search_query(&self, text: impl Into<String>) -> Self {
        Self { search_query: text.into(), ..self.clone() }
    }

    pub fn set_selected_difficulty(&self, difficulty: DifficultyFilter) -> Self {
        Self { difficulty, ..self.clone() }
    }

    pub fn set_progress(&self, progress: ProgressFilter) -> Self {
        Self { progress, ..self.clone() }
    }

    /// Add `tag` if absent, remove it if present.
    pub fn toggle_tag(&self, tag: &str) -> Self {
        let mut tags = self.tags.clone();
        match tags.iter().position(|t| t == tag) {
            Some(pos) => {
                tags.remove(pos);
            }
            None => tags.push(tag.to_string()),
        }
        Self { tags, ..self.clone() }
    }

    pub fn select_topic(&self, id: Option<TopicId>) -> Self {
        Self { selected_topic: id, ..self.clone() }
    }

    /// Reset search, difficulty, tags and progress. The selected topic stays.
    pub fn clear_filters(&self) -> Self {
        Self {
            selected_topic: self.selected_topic.clone(),
            ..Self::default()
        }
    }

    /// The query the engine should evaluate for this snapshot.
    pub fn query(&self) -> Query {
        Query {
            search_text: self.search_query.clone(),
            difficulty: self.difficulty,
            tags: self.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Difficulty;

    #[test]
    fn transitions_produce_new_snapshots() {
        let base = Selection::default();
        let next = base.set_search_query("closure");
        assert_eq!(base.search_query, "");
        assert_eq!(next.search_query, "closure");
    }

    #[test]
    fn toggle_tag_is_symmetric() {
        let s = Selection::default().toggle_tag("async").toggle_tag("scope");
        assert_eq!(s.tags, ["async", "scope"]);
        let s = s.toggle_tag("async");
        assert_eq!(s.tags, ["scope"]);
        assert_eq!(s.toggle_tag("scope"), Selection::default());
    }

    #[test]
    fn clear_filters_resets_query_only() {
        let s = Selection::default()
            .set_search_query("this")
            .set_selected_difficulty(DifficultyFilter::Only(Difficulty::Advanced))
            .toggle_tag("context")
            .set_progress(ProgressFilter::LearnedOnly)
            .select_topic(Some("this".into()));
        let cleared = s.clear_filters();
        assert!(cleared.query().is_empty());
        assert_eq!(cleared.progress, ProgressFilter::Any);
        assert_eq!(cleared.selected_topic.as_deref(), Some("this"));
    }

    #[test]
    fn query_mirrors_selection() {
        let s = Selection::default()
            .set_search_query("loop")
            .set_selected_difficulty(DifficultyFilter::Only(Difficulty::Beginner))
            .toggle_tag("runtime");
        let q = s.query();
        assert_eq!(q.search_text, "loop");
        assert_eq!(q.difficulty, DifficultyFilter::Only(Difficulty::Beginner));
        assert_eq!(q.tags, ["runtime"]);
    }
}
