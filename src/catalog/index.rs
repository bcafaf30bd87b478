//! [`CatalogIndex`]: read-only lookup structures over the master catalog.
//!
//! Built once at startup. Holds the topics in catalog order plus three
//! derived maps: id → position, tag → ids, difficulty → ids (catalog order).

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::{CatalogError, Difficulty, Topic, TopicId};

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    topics: Vec<Topic>,
    /// id -> position in `topics`
    by_id: HashMap<TopicId, usize>,
    /// tag -> set of topic ids
    by_tag: HashMap<String, HashSet<TopicId>>,
    /// difficulty -> ids in catalog order; every level is present
    by_difficulty: HashMap<Difficulty, Vec<TopicId>>,
}

impl CatalogIndex {
    /// Build the index. Fails on the first repeated id.
    pub fn build(topics: Vec<Topic>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(topics.len());
        let mut by_tag: HashMap<String, HashSet<TopicId>> = HashMap::new();
        let mut by_difficulty: HashMap<Difficulty, Vec<TopicId>> =
            Difficulty::ALL.iter().map(|d| (*d, Vec::new())).collect();

        for (pos, topic) in topics.iter().enumerate() {
            if by_id.insert(topic.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId { id: topic.id.clone() });
            }
            for tag in &topic.tags {
                by_tag.entry(tag.clone()).or_default().insert(topic.id.clone());
            }
            by_difficulty
                .entry(topic.difficulty)
                .or_default()
                .push(topic.id.clone());
        }

        debug!(topics = topics.len(), tags = by_tag.len(), "catalog index built");

        Ok(Self { topics, by_id, by_tag, by_difficulty })
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// All topics in catalog order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// All ids in catalog order.
    pub fn all_ids(&self) -> Vec<TopicId> {
        self.topics.iter().map(|t| t.id.clone()).collect()
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<&Topic> {
        self.by_id.get(id).map(|&pos| &self.topics[pos])
    }

    /// Ids carrying `tag`, or `None` if no topic has it.
    pub fn topics_by_tag(&self, tag: &str) -> Option<&HashSet<TopicId>> {
        self.by_tag.get(tag)
    }

    /// Ids at `difficulty`, in catalog order.
    pub fn topics_by_difficulty(&self, difficulty: Difficulty) -> &[TopicId] {
        self.by_difficulty
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every tag in the catalog, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let sorted: BTreeSet<&str> = self.by_tag.keys().map(String::as_str).collect();
        sorted.into_iter().collect()
    }

    /// Related topics of `id` that resolve; dangling links are skipped.
    pub fn related(&self, id: &str) -> Vec<&Topic> {
        let Some(topic) = self.lookup_by_id(id) else {
            return Vec::new();
        };
        topic
            .related_topics
            .iter()
            .filter_map(|rid| {
                let resolved = self.lookup_by_id(rid);
                if resolved.is_none() {
                    debug!(topic = %id, related = %rid, "dangling related topic");
                }
                resolved
            })
            .collect()
    }

    /// The "next" topic of `id`, if set and resolvable.
    pub fn next(&self, id: &str) -> Option<&Topic> {
        let next_id = self.lookup_by_id(id)?.next_topic_id.as_deref()?;
        self.lookup_by_id(next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_topic;

    fn sample() -> Vec<Topic> {
        let mut closures = test_topic("closures", "Closures", Difficulty::Intermediate, &["closure", "scope"]);
        closures.related_topics = vec!["scope".into(), "missing".into()];
        closures.next_topic_id = Some("promises".into());
        let mut promises = test_topic("promises", "Promises", Difficulty::Intermediate, &["closure", "async"]);
        promises.next_topic_id = Some("gone".into());
        vec![
            test_topic("scope", "Scope", Difficulty::Beginner, &["scope"]),
            closures,
            promises,
            test_topic("proxies", "Proxies", Difficulty::Advanced, &[]),
        ]
    }

    #[test]
    fn build_empty() {
        let idx = CatalogIndex::build(Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.topics_by_difficulty(Difficulty::Advanced).is_empty());
        assert!(idx.tags().is_empty());
    }

    #[test]
    fn duplicate_id_fails() {
        let mut topics = sample();
        topics.push(test_topic("scope", "Scope again", Difficulty::Advanced, &[]));
        assert_eq!(
            CatalogIndex::build(topics).unwrap_err(),
            CatalogError::DuplicateId { id: "scope".into() }
        );
    }

    #[test]
    fn lookup_returns_original_topic() {
        let topics = sample();
        let idx = CatalogIndex::build(topics.clone()).unwrap();
        for t in &topics {
            assert_eq!(idx.lookup_by_id(&t.id), Some(t));
        }
        assert!(idx.lookup_by_id("nope").is_none());
    }

    #[test]
    fn tag_index_is_total() {
        let idx = CatalogIndex::build(sample()).unwrap();
        let closure = idx.topics_by_tag("closure").unwrap();
        assert_eq!(closure.len(), 2);
        assert!(closure.contains("closures") && closure.contains("promises"));
        assert!(idx.topics_by_tag("unknown").is_none());
        assert_eq!(idx.tags(), ["async", "closure", "scope"]);
    }

    #[test]
    fn difficulty_index_keeps_catalog_order() {
        let idx = CatalogIndex::build(sample()).unwrap();
        assert_eq!(idx.topics_by_difficulty(Difficulty::Intermediate), ["closures", "promises"]);
        assert_eq!(idx.topics_by_difficulty(Difficulty::Beginner), ["scope"]);
        assert_eq!(idx.topics_by_difficulty(Difficulty::Advanced), ["proxies"]);
    }

    #[test]
    fn related_skips_dangling() {
        let idx = CatalogIndex::build(sample()).unwrap();
        let related: Vec<_> = idx.related("closures").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(related, ["scope"]);
        assert!(idx.related("nope").is_empty());
    }

    #[test]
    fn next_resolves_or_none() {
        let idx = CatalogIndex::build(sample()).unwrap();
        assert_eq!(idx.next("closures").map(|t| t.id.as_str()), Some("promises"));
        assert!(idx.next("promises").is_none());
        assert!(idx.next("scope").is_none());
    }
}
