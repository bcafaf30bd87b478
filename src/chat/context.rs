//! Size-bounded projection of a [`Topic`] sent as chat context.
//!
//! At most [`MAX_KEY_POINTS`] key points; examples keep only their titles.

use serde::Serialize;

use crate::catalog::{Difficulty, Topic, TopicId};

pub const MAX_KEY_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleTitle {
    pub title: String,
    /// Always empty.
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContext {
    pub id: TopicId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub key_points: Vec<String>,
    pub tags: Vec<String>,
    pub examples: Vec<ExampleTitle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
    pub additional_description: String,
}

pub fn prepare_article_context(topic: &Topic) -> ArticleContext {
    ArticleContext {
        id: topic.id.clone(),
        title: topic.title.clone(),
        description: topic.description.clone(),
        difficulty: topic.difficulty,
        key_points: topic.key_points.iter().take(MAX_KEY_POINTS).cloned().collect(),
        tags: topic.tags.clone(),
        examples: topic
            .examples
            .iter()
            .map(|e| ExampleTitle { title: e.title.clone(), code: String::new() })
            .collect(),
        fun_fact: topic.fun_fact.clone(),
        additional_description: topic.additional_description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_topic, CodeExample};

    fn big_topic(points: usize) -> Topic {
        let mut t = test_topic("closures", "Closures", Difficulty::Intermediate, &["closure"]);
        t.key_points = (0..points).map(|i| format!("point {i}")).collect();
        t.examples = vec![
            CodeExample { title: "Counter".into(), code: "function counter() { let n = 0; }".into() },
            CodeExample { title: "Once".into(), code: "const once = fn => ...".into() },
        ];
        t.fun_fact = Some("Closures predate JavaScript".into());
        t
    }

    #[test]
    fn key_points_are_capped() {
        for n in [0, 3, 10, 11, 50] {
            let ctx = prepare_article_context(&big_topic(n));
            assert_eq!(ctx.key_points.len(), n.min(MAX_KEY_POINTS));
        }
        let ctx = prepare_article_context(&big_topic(12));
        assert_eq!(ctx.key_points.first().map(String::as_str), Some("point 0"));
        assert_eq!(ctx.key_points.last().map(String::as_str), Some("point 9"));
    }

    #[test]
    fn example_code_is_stripped() {
        let ctx = prepare_article_context(&big_topic(1));
        assert_eq!(ctx.examples.len(), 2);
        assert!(ctx.examples.iter().all(|e| e.code.is_empty()));
        assert_eq!(ctx.examples[1].title, "Once");
    }

    #[test]
    fn serialises_camel_case() {
        let json = serde_json::to_value(prepare_article_context(&big_topic(1))).unwrap();
        assert_eq!(json["difficulty"], "intermediate");
        assert_eq!(json["funFact"], "Closures predate JavaScript");
        assert!(json.get("keyPoints").is_some());
        assert!(json.get("additionalDescription").is_some());
        assert!(json.get("relatedTopics").is_none());
    }
}
