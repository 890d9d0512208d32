//! Route parameters extracted from a pattern match
//!
//! Parameters are stored in a `SmallVec` that keeps up to 4 pairs on the
//! stack; most routes have fewer than that.
//!
//! # Keys
//!
//! Named groups (`:id` segments or `(?P<id>...)`) are keyed by name. Unnamed
//! groups are keyed by their 1-based group index, `$1`, `$2`, ... by default.
//! [`PositionalKeys::Numeric`] switches to plain `1`, `2`, ... for code written
//! against that convention.
//!
//! A name repeated in one pattern keeps the value of its last group.
//!
//! Groups that did not take part in the match are left out.

use crate::pattern::Pattern;
use regex::Captures;
use serde::Deserialize;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Maximum number of route parameters to store on the stack.
const STACK_PARAMS_CAPACITY: usize = 4;

/// How unnamed capture groups are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionalKeys {
    /// `$1`, `$2`, ...
    #[default]
    Dollar,
    /// `1`, `2`, ...
    Numeric,
}

impl PositionalKeys {
    /// Key for the capture group at `index` (1-based)
    pub fn key(&self, index: usize) -> String {
        match self {
            PositionalKeys::Dollar => format!("${}", index),
            PositionalKeys::Numeric => index.to_string(),
        }
    }
}

/// Parameters captured by the matched route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    inner: SmallVec<[(String, String); STACK_PARAMS_CAPACITY]>,
}

impl RouteParams {
    /// Create a new empty parameter set.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    /// Build the parameter set for a successful match.
    ///
    /// Group 0 (the whole match) is skipped.
    pub fn from_captures(pattern: &Pattern, captures: &Captures<'_>, keys: PositionalKeys) -> Self {
        let mut params = Self::new();
        for index in 1..pattern.regex().captures_len() {
            let Some(value) = captures.get(index) else {
                continue;
            };
            let key = match pattern.group_name(index) {
                Some(name) => name.to_string(),
                None => keys.key(index),
            };
            params.insert(key, value.as_str().to_string());
        }
        params
    }

    /// Insert a key-value pair, replacing any existing value for the key.
    pub fn insert(&mut self, key: String, value: String) {
        match self.inner.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.inner.push((key, value)),
        }
    }

    /// Get a value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == key)
    }

    /// Check if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterate over key-value pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `inner` on top of `self`; keys from `inner` win.
    pub(crate) fn merged_with(mut self, inner: RouteParams) -> Self {
        for (key, value) in inner.inner {
            self.insert(key, value);
        }
        self
    }

    /// Convert to a HashMap.
    pub fn to_hashmap(&self) -> HashMap<String, String> {
        self.inner.iter().cloned().collect()
    }
}

impl FromIterator<(String, String)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl From<RouteParams> for HashMap<String, String> {
    fn from(params: RouteParams) -> Self {
        params.inner.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extract(pattern: &str, target: &str, keys: PositionalKeys) -> Option<RouteParams> {
        let pattern = Pattern::compile(pattern).unwrap();
        let captures = pattern.captures(target)?;
        Some(RouteParams::from_captures(&pattern, &captures, keys))
    }

    #[test]
    fn test_named_groups_use_names() {
        let params = extract("/posts/:id/comments/:author", "/posts/23/comments/obama", PositionalKeys::Dollar).unwrap();
        assert_eq!(params.get("id"), Some("23"));
        assert_eq!(params.get("author"), Some("obama"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_unnamed_groups_use_dollar_keys() {
        let params = extract("/posts/([0-9]+)/comments$", "/posts/23/comments", PositionalKeys::Dollar).unwrap();
        assert_eq!(params.to_hashmap(), HashMap::from([("$1".to_string(), "23".to_string())]));
    }

    #[test]
    fn test_unnamed_groups_numeric_keys() {
        let params = extract("/posts/([0-9]+)/comments$", "/posts/23/comments", PositionalKeys::Numeric).unwrap();
        assert_eq!(params.get("1"), Some("23"));
        assert!(!params.contains_key("$1"));
    }

    #[test]
    fn test_mixed_groups_keep_group_index() {
        let params = extract(r"/(?P<kind>[a-z]+)/([0-9]+)$", "/posts/7", PositionalKeys::Dollar).unwrap();
        assert_eq!(params.get("kind"), Some("posts"));
        assert_eq!(params.get("$2"), Some("7"));
    }

    #[test]
    fn test_absent_optional_group_is_omitted() {
        let params = extract(r"/posts(/([0-9]+))?$", "/posts", PositionalKeys::Dollar).unwrap();
        assert!(params.is_empty());

        let params = extract(r"/posts(/([0-9]+))?$", "/posts/5", PositionalKeys::Dollar).unwrap();
        assert_eq!(params.get("$1"), Some("/5"));
        assert_eq!(params.get("$2"), Some("5"));
    }

    #[test]
    fn test_repeated_name_takes_last_value() {
        let params = extract("/foo/:id/bar/:id", "/foo/1/bar/2", PositionalKeys::Dollar).unwrap();
        assert_eq!(params.to_hashmap(), HashMap::from([("id".to_string(), "2".to_string())]));
    }

    #[test]
    fn test_static_route_has_no_params() {
        let params = extract("/posts", "/posts", PositionalKeys::Dollar).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_small_params_on_stack() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "123".to_string());
        params.insert("name".to_string(), "test".to_string());
        assert_eq!(params.len(), 2);
        assert!(!params.inner.spilled());
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "1".to_string());
        params.insert("id".to_string(), "2".to_string());
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("2"));
    }

    #[test]
    fn test_merge_prefers_inner_values() {
        let outer: RouteParams = [("id", "1"), ("section", "blog")].into_iter().collect();
        let inner: RouteParams = [("id", "2"), ("slug", "hello")].into_iter().collect();
        let merged = outer.merged_with(inner);
        assert_eq!(merged.get("id"), Some("2"));
        assert_eq!(merged.get("section"), Some("blog"));
        assert_eq!(merged.get("slug"), Some("hello"));
    }

    #[test]
    fn test_positional_keys_deserialize() {
        let keys: PositionalKeys = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(keys, PositionalKeys::Numeric);
        assert_eq!(PositionalKeys::default(), PositionalKeys::Dollar);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_param_value_preservation(
            name in "[a-z][a-z_]{0,8}",
            value in "[A-Za-z0-9_]{1,16}",
        ) {
            let pattern = format!("/items/:{}", name);
            let target = format!("/items/{}", value);
            let params = extract(&pattern, &target, PositionalKeys::Dollar).unwrap();
            prop_assert_eq!(params.len(), 1);
            prop_assert_eq!(params.get(&name), Some(value.as_str()));
        }

        #[test]
        fn prop_positional_keys_follow_group_index(count in 1usize..5) {
            let pattern = format!("/{}$", vec!["([0-9]+)"; count].join("/"));
            let target = format!("/{}", (0..count).map(|i| i.to_string()).collect::<Vec<_>>().join("/"));
            let params = extract(&pattern, &target, PositionalKeys::Dollar).unwrap();
            prop_assert_eq!(params.len(), count);
            for i in 0..count {
                let key = format!("${}", i + 1);
                let expected = i.to_string();
                prop_assert_eq!(params.get(&key), Some(expected.as_str()));
            }
        }
    }
}
