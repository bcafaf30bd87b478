//! Query evaluation against a [`CatalogIndex`].
//!
//! Active filters combine with AND. Results always come back in catalog
//! order; nothing is ranked.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::{CatalogIndex, Difficulty, Topic, TopicId};

/// Difficulty restriction; `All` disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(Difficulty),
}

impl FromStr for DifficultyFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(DifficultyFilter::All);
        }
        s.parse().map(DifficultyFilter::Only)
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyFilter::All => f.write_str("all"),
            DifficultyFilter::Only(d) => fmt::Display::fmt(d, f),
        }
    }
}

/// Restrict results by the user's learned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressFilter {
    #[default]
    Any,
    LearnedOnly,
    UnlearnedOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Case-insensitive substring; whitespace-only means no text filter.
    pub search_text: String,
    pub difficulty: DifficultyFilter,
    /// A topic must carry every one of these tags.
    pub tags: Vec<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.difficulty == DifficultyFilter::All
            && self.tags.is_empty()
    }
}

/// Evaluate `query` and return matching ids in catalog order.
pub fn evaluate(index: &CatalogIndex, query: &Query) -> Vec<TopicId> {
    let needle = query.search_text.trim().to_lowercase();

    let candidates: Box<dyn Iterator<Item = &Topic> + '_> = match query.difficulty {
        DifficultyFilter::All => Box::new(index.topics().iter()),
        DifficultyFilter::Only(d) => Box::new(
            index
                .topics_by_difficulty(d)
                .iter()
                .filter_map(|id| index.lookup_by_id(id)),
        ),
    };

    candidates
        .filter(|t| has_all_tags(index, t, &query.tags))
        .filter(|t| needle.is_empty() || matches_text(t, &needle))
        .map(|t| t.id.clone())
        .collect()
}

/// Keep only ids whose learned state satisfies `filter`. Order is preserved.
pub fn retain_progress(
    ids: Vec<TopicId>,
    filter: ProgressFilter,
    is_learned: impl Fn(&str) -> bool,
) -> Vec<TopicId> {
    match filter {
        ProgressFilter::Any => ids,
        ProgressFilter::LearnedOnly => ids.into_iter().filter(|id| is_learned(id.as_str())).collect(),
        ProgressFilter::UnlearnedOnly => ids.into_iter().filter(|id| !is_learned(id.as_str())).collect(),
    }
}

fn has_all_tags(index: &CatalogIndex, topic: &Topic, tags: &[String]) -> bool {
    tags.iter().all(|tag| {
        index
            .topics_by_tag(tag)
            .is_some_and(|ids| ids.contains(&topic.id))
    })
}

/// `needle` must already be trimmed and lowercased.
fn matches_text(topic: &Topic, needle: &str) -> bool {
    topic.title.to_lowercase().contains(needle)
        || topic.description.to_lowercase().contains(needle)
        || topic.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

/// Distinct tags across `ids`, sorted. Used to offer tag choices for a result set.
pub fn tags_of<'a>(index: &'a CatalogIndex, ids: &[TopicId]) -> Vec<&'a str> {
    let tags: BTreeSet<&str> = ids
        .iter()
        .filter_map(|id| index.lookup_by_id(id))
        .flat_map(|t| t.tags.iter().map(String::as_str))
        .collect();
    tags.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_topic;
    use std::collections::HashSet;

    fn index() -> CatalogIndex {
        let mut this = test_topic("this", "Контекст this", Difficulty::Intermediate, &["context"]);
        this.description = "How the receiver is bound".into();
        let mut closures = test_topic("closures", "Closures", Difficulty::Intermediate, &["closure", "scope"]);
        closures.description = "Functions that capture their lexical environment".into();
        CatalogIndex::build(vec![
            test_topic("vars", "Variables", Difficulty::Beginner, &["scope", "basics"]),
            closures,
            test_topic("promises", "Promises", Difficulty::Intermediate, &["closure", "async"]),
            this,
            test_topic("event-loop", "Event Loop", Difficulty::Advanced, &["async", "runtime"]),
        ])
        .unwrap()
    }

    fn q(text: &str, difficulty: DifficultyFilter, tags: &[&str]) -> Query {
        Query {
            search_text: text.into(),
            difficulty,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn empty_query_returns_catalog_order() {
        let idx = index();
        assert!(Query::default().is_empty());
        assert_eq!(evaluate(&idx, &Query::default()), idx.all_ids());
    }

    #[test]
    fn whitespace_search_is_empty() {
        let idx = index();
        let query = q("   \t", DifficultyFilter::All, &[]);
        assert!(query.is_empty());
        assert_eq!(evaluate(&idx, &query), idx.all_ids());
    }

    #[test]
    fn tags_use_and_semantics() {
        let idx = index();
        assert_eq!(evaluate(&idx, &q("", DifficultyFilter::All, &["closure"])), ["closures", "promises"]);
        assert_eq!(evaluate(&idx, &q("", DifficultyFilter::All, &["closure", "scope"])), ["closures"]);
        assert!(evaluate(&idx, &q("", DifficultyFilter::All, &["closure", "nonexistent"])).is_empty());
    }

    #[test]
    fn tag_filter_matches_subset_property() {
        let idx = index();
        let sets: [&[&str]; 4] = [&["scope"], &["async"], &["async", "runtime"], &["basics", "closure"]];
        for set in sets {
            let result: HashSet<_> = evaluate(&idx, &q("", DifficultyFilter::All, set)).into_iter().collect();
            for t in idx.topics() {
                let superset = set.iter().all(|s| t.has_tag(s));
                assert_eq!(result.contains(&t.id), superset, "topic {} tags {set:?}", t.id);
            }
        }
    }

    #[test]
    fn difficulty_partitions_catalog() {
        let idx = index();
        let mut seen = Vec::new();
        for d in Difficulty::ALL {
            let ids = evaluate(&idx, &q("", DifficultyFilter::Only(d), &[]));
            for id in &ids {
                assert_eq!(idx.lookup_by_id(id).unwrap().difficulty, d);
            }
            seen.extend(ids);
        }
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());
        assert_eq!(unique.len(), idx.len());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let idx = index();
        assert_eq!(evaluate(&idx, &q("THIS", DifficultyFilter::All, &[])), ["this"]);
        assert_eq!(evaluate(&idx, &q("контекст", DifficultyFilter::All, &[])), ["this"]);
        // description match
        assert_eq!(evaluate(&idx, &q("lexical", DifficultyFilter::All, &[])), ["closures"]);
        // tag substring match
        assert_eq!(evaluate(&idx, &q("asyn", DifficultyFilter::All, &[])), ["promises", "event-loop"]);
        assert!(evaluate(&idx, &q("rust", DifficultyFilter::All, &[])).is_empty());
    }

    #[test]
    fn search_text_is_trimmed() {
        let idx = index();
        assert_eq!(evaluate(&idx, &q("  closures  ", DifficultyFilter::All, &[])), ["closures"]);
    }

    #[test]
    fn filters_compose_with_and() {
        let idx = index();
        let ids = evaluate(&idx, &q("o", DifficultyFilter::Only(Difficulty::Intermediate), &["closure"]));
        assert_eq!(ids, ["closures", "promises"]);
        let ids = evaluate(&idx, &q("event", DifficultyFilter::Only(Difficulty::Intermediate), &[]));
        assert!(ids.is_empty());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let idx = index();
        let query = q("s", DifficultyFilter::All, &["scope"]);
        assert_eq!(evaluate(&idx, &query), evaluate(&idx, &query));
    }

    #[test]
    fn difficulty_filter_parses() {
        assert_eq!("all".parse::<DifficultyFilter>(), Ok(DifficultyFilter::All));
        assert_eq!(
            "beginner".parse::<DifficultyFilter>(),
            Ok(DifficultyFilter::Only(Difficulty::Beginner))
        );
        assert!("hard".parse::<DifficultyFilter>().is_err());
        assert_eq!(DifficultyFilter::Only(Difficulty::Advanced).to_string(), "advanced");
    }

    #[test]
    fn progress_filter_keeps_order() {
        let ids: Vec<TopicId> = vec!["a".into(), "b".into(), "c".into()];
        let learned = |id: &str| id != "b";
        assert_eq!(retain_progress(ids.clone(), ProgressFilter::Any, learned), ["a", "b", "c"]);
        assert_eq!(retain_progress(ids.clone(), ProgressFilter::LearnedOnly, learned), ["a", "c"]);
        assert_eq!(retain_progress(ids, ProgressFilter::UnlearnedOnly, learned), ["b"]);
    }

    #[test]
    fn tags_of_result_set() {
        let idx = index();
        let ids = evaluate(&idx, &q("", DifficultyFilter::All, &["async"]));
        assert_eq!(tags_of(&idx, &ids), ["async", "closure", "runtime"]);
    }
}
