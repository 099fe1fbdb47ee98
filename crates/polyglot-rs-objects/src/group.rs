//! Translation group payloads.
//!
//! A group is a term of the kind's translation taxonomy whose description
//! holds a JSON object mapping language slugs to object ids. Keys that are
//! not language slugs are extra payload owned by other modules; they are
//! carried through every rewrite untouched.

use std::collections::BTreeMap;

use polyglot_rs_core::utils::sanitize::positive_int;
use polyglot_rs_db::Term;
use serde_json::{Map, Value};

/// A stored translation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationGroup {
    pub term: Term,
    /// Language slug → object id, as stored (not yet checked against the
    /// members' actual languages).
    pub members: BTreeMap<String, i64>,
    /// Payload entries under keys that are not language slugs.
    pub extras: Map<String, Value>,
}

impl TranslationGroup {
    /// Parses a group term. `is_language` tells language slugs from extra
    /// keys; entries under a language slug without a valid id are dropped.
    pub fn parse(term: Term, is_language: impl Fn(&str) -> bool) -> Self {
        let payload = if term.description.trim().is_empty() {
            Map::new()
        } else if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&term.description) {
            map
        } else {
            tracing::warn!(group = %term.slug, "unreadable translation group payload");
            Map::new()
        };
        let mut members = BTreeMap::new();
        let mut extras = Map::new();
        for (key, value) in payload {
            if is_language(&key) {
                match positive_int(&value) {
                    Some(id) => {
                        members.insert(key, id);
                    }
                    None => tracing::warn!(group = %term.slug, slug = %key, "invalid id in translation group"),
                }
            } else {
                extras.insert(key, value);
            }
        }
        Self {
            term,
            members,
            extras,
        }
    }

    /// Serializes extras and `members` into a description payload.
    pub fn payload(extras: &Map<String, Value>, members: &BTreeMap<String, i64>) -> String {
        let mut map = extras.clone();
        for (slug, id) in members {
            map.insert(slug.clone(), Value::from(*id));
        }
        Value::Object(map).to_string()
    }

    /// Removes `object_id` from the members, wherever it is keyed.
    pub fn remove_member(&mut self, object_id: i64) {
        self.members.retain(|_, id| *id != object_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(description: &str) -> Term {
        Term {
            term_id: 9,
            term_taxonomy_id: 10,
            taxonomy: "post_translations".into(),
            name: "pll_x".into(),
            slug: "pll_x".into(),
            term_group: 0,
            description: description.into(),
            parent: 0,
            count: 2,
        }
    }

    fn is_language(slug: &str) -> bool {
        matches!(slug, "en" | "fr" | "de")
    }

    #[test]
    fn test_parse_splits_members_and_extras() {
        let group = TranslationGroup::parse(
            term(r#"{"en": 1, "fr": "2", "de": "x", "sync": ["title"]}"#),
            is_language,
        );
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members["fr"], 2);
        assert_eq!(group.extras["sync"], serde_json::json!(["title"]));
    }

    #[test]
    fn test_parse_unreadable_payload() {
        assert!(TranslationGroup::parse(term("a:2:{}"), is_language).members.is_empty());
        assert!(TranslationGroup::parse(term(""), is_language).members.is_empty());
    }

    #[test]
    fn test_payload_keeps_extras() {
        let group = TranslationGroup::parse(term(r#"{"en": 1, "sync": true}"#), is_language);
        let mut members = group.members.clone();
        members.insert("fr".into(), 3);
        let payload: Value = serde_json::from_str(&TranslationGroup::payload(&group.extras, &members)).unwrap();
        assert_eq!(payload, serde_json::json!({"en": 1, "fr": 3, "sync": true}));
    }

    #[test]
    fn test_remove_member() {
        let mut group = TranslationGroup::parse(term(r#"{"en": 1, "fr": 2}"#), is_language);
        group.remove_member(1);
        assert_eq!(group.members.keys().collect::<Vec<_>>(), vec!["fr"]);
    }
}
