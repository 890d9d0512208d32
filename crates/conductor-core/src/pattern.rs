//! Route pattern compiler
//!
//! Route patterns come in three shapes:
//!
//! - `/posts` - static path
//! - `/posts/:id` - parameterized path, `:id` becomes the named group `(?P<id>\w+)`
//! - `/posts/([0-9]+)` or any pattern not starting with `/` - a regular
//!   expression used as written
//!
//! Patterns starting with `/` get an end anchor unless they already end in
//! `/` or `$`, so `/foo` never matches `/foobar`. A pattern ending in `/`
//! matches every path below it.
//!
//! A `:name` used twice in one pattern captures both segments; the parameter
//! takes the value of the last one.
//!
//! Patterns that do not start with `/` are host-qualified: they are matched
//! against `host + path` (for example `example.com/posts`) and take precedence
//! over path-only patterns. The router lowercases the host first, so write
//! the host part in lowercase.

use crate::error::RouteError;
use regex::{Captures, Regex};
use std::collections::HashSet;

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    host_qualified: bool,
    parameterized: bool,
    /// Unnamed groups standing in for a repeated `:name`, by group index
    repeated: Vec<(usize, String)>,
}

impl Pattern {
    /// Compile a route pattern
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::EmptyPattern`] for `""` and
    /// [`RouteError::InvalidPattern`] when the translated expression is not a
    /// valid regular expression.
    ///
    /// # Example
    ///
    /// ```
    /// use conductor_core::Pattern;
    ///
    /// let pattern = Pattern::compile("/posts/:id").unwrap();
    /// assert_eq!(pattern.regex().as_str(), r"/posts/(?P<id>\w+)$");
    /// assert!(pattern.is_match("/posts/42"));
    /// assert!(!pattern.is_match("/posts/42/comments"));
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::EmptyPattern);
        }

        let translated = translate(pattern);
        let regex = Regex::new(&translated.expression).map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            host_qualified: !pattern.starts_with('/'),
            parameterized: translated.parameterized,
            repeated: translated.repeated,
        })
    }

    /// The pattern exactly as registered
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled expression
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Precedence weight: the length of the raw pattern string.
    /// Longer patterns win over shorter ones when both match.
    pub fn precedence(&self) -> usize {
        self.source.len()
    }

    /// Whether the pattern is matched against `host + path`
    pub fn is_host_qualified(&self) -> bool {
        self.host_qualified
    }

    /// Whether any `:name` segment was rewritten into a named group
    pub fn is_parameterized(&self) -> bool {
        self.parameterized
    }

    /// Names of the named capture groups, in group order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }

    /// Parameter name for the capture group at `index`, if it has one
    ///
    /// A repeated `:name` compiles to an unnamed group that still answers
    /// to `name` here.
    pub fn group_name(&self, index: usize) -> Option<&str> {
        if let Some((_, name)) = self.repeated.iter().find(|(i, _)| *i == index) {
            return Some(name);
        }
        self.regex.capture_names().nth(index).flatten()
    }

    /// Whether the pattern matches `target` starting at its first byte
    pub fn is_match(&self, target: &str) -> bool {
        self.regex
            .find(target)
            .map_or(false, |found| found.start() == 0)
    }

    /// Capture groups for a match starting at the first byte of `target`
    pub fn captures<'t>(&self, target: &'t str) -> Option<Captures<'t>> {
        self.regex
            .captures(target)
            .filter(|caps| caps.get(0).map_or(false, |whole| whole.start() == 0))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Output of [`translate`]
pub(crate) struct Translated {
    pub(crate) expression: String,
    /// Whether a `:name` segment was substituted
    pub(crate) parameterized: bool,
    /// `(group index, name)` for each repeated `:name`
    pub(crate) repeated: Vec<(usize, String)>,
}

/// Translate a route pattern into regex source.
///
/// The first `:name` becomes `(?P<name>\w+)`. The regex engine rejects
/// duplicate group names, so a repeated `:name` becomes `(\w+)` and its
/// group index is recorded instead.
pub(crate) fn translate(pattern: &str) -> Translated {
    if !pattern.starts_with('/') {
        return Translated {
            expression: pattern.to_string(),
            parameterized: false,
            repeated: Vec::new(),
        };
    }

    let mut expression = String::with_capacity(pattern.len() + 16);
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    let mut parameterized = false;

    for (position, segment) in pattern.split('/').enumerate() {
        if position > 0 {
            expression.push('/');
        }
        match segment.strip_prefix(':') {
            Some(name) if seen.contains(name) => {
                parameterized = true;
                repeated.push((count_capture_groups(&expression) + 1, name.to_string()));
                expression.push_str(r"(\w+)");
            }
            Some(name) => {
                parameterized = true;
                seen.insert(name);
                expression.push_str(&format!(r"(?P<{}>\w+)", name));
            }
            None => expression.push_str(segment),
        }
    }

    if !pattern.ends_with('/') && !pattern.ends_with('$') {
        expression.push('$');
    }

    Translated {
        expression,
        parameterized,
        repeated,
    }
}

/// Number of capturing groups opened in `expression`
fn count_capture_groups(expression: &str) -> usize {
    let bytes = expression.as_bytes();
    let mut count = 0;
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => {
                let rest = &bytes[i + 1..];
                if !rest.starts_with(b"?") || rest.starts_with(b"?P<") || rest.starts_with(b"?<") {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_translate_patterns() {
        let cases = [
            ("/", "/"),
            ("/foo", "/foo$"),
            ("/foo/", "/foo/"),
            ("/foo/bar", "/foo/bar$"),
            ("/foo/:bar", r"/foo/(?P<bar>\w+)$"),
            ("/foo/:bar/baz", r"/foo/(?P<bar>\w+)/baz$"),
            (
                "/:foo/:bar/:baz",
                r"/(?P<foo>\w+)/(?P<bar>\w+)/(?P<baz>\w+)$",
            ),
            ("/posts[/]?$", "/posts[/]?$"),
            ("foo", "foo"),
            (":id", ":id"),
        ];

        for (pattern, expected) in cases {
            let compiled = Pattern::compile(pattern).unwrap();
            assert_eq!(
                compiled.regex().as_str(),
                expected,
                "pattern {:?} compiled to {:?}",
                pattern,
                compiled.regex().as_str()
            );
        }
    }

    #[test]
    fn test_substitution_is_tracked() {
        assert!(Pattern::compile("/posts/:id").unwrap().is_parameterized());
        assert!(!Pattern::compile("/posts/([0-9]+)$").unwrap().is_parameterized());
        assert!(!Pattern::compile(":id").unwrap().is_parameterized());
    }

    #[test]
    fn test_end_anchor_prevents_prefix_match() {
        let pattern = Pattern::compile("/foo").unwrap();
        assert!(pattern.is_match("/foo"));
        assert!(!pattern.is_match("/foobar"));
        assert!(!pattern.is_match("/foo/bar"));
    }

    #[test]
    fn test_match_must_start_at_beginning() {
        let pattern = Pattern::compile("/foo").unwrap();
        assert!(!pattern.is_match("/bar/foo"));
        assert!(pattern.captures("/bar/foo").is_none());
    }

    #[test]
    fn test_trailing_slash_matches_subtree() {
        let pattern = Pattern::compile("/static/").unwrap();
        assert!(pattern.is_match("/static/"));
        assert!(pattern.is_match("/static/css/site.css"));
        assert!(!pattern.is_match("/static"));
    }

    #[test]
    fn test_host_qualified_detection() {
        assert!(Pattern::compile("example.com/posts").unwrap().is_host_qualified());
        assert!(Pattern::compile(r"[a-z]+\.example\.com/").unwrap().is_host_qualified());
        assert!(!Pattern::compile("/posts").unwrap().is_host_qualified());
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = Pattern::compile("/posts/([0-9]+$").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { ref pattern, .. } if pattern == "/posts/([0-9]+$"));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        assert!(matches!(Pattern::compile(""), Err(RouteError::EmptyPattern)));
    }

    #[test]
    fn test_repeated_param_name_compiles() {
        let pattern = Pattern::compile("/foo/:id/bar/:id").unwrap();
        assert_eq!(pattern.regex().as_str(), r"/foo/(?P<id>\w+)/bar/(\w+)$");
        assert!(pattern.is_parameterized());
        assert_eq!(pattern.group_name(1), Some("id"));
        assert_eq!(pattern.group_name(2), Some("id"));
        assert!(pattern.is_match("/foo/1/bar/2"));
    }

    #[test]
    fn test_repeated_param_index_counts_earlier_groups() {
        let pattern = Pattern::compile(r"/(?:a|b)/([0-9]+)/:id/[(]x[)]/:id").unwrap();
        assert_eq!(pattern.group_name(1), None);
        assert_eq!(pattern.group_name(2), Some("id"));
        assert_eq!(pattern.group_name(3), Some("id"));
        assert_eq!(pattern.regex().captures_len(), 4);
    }

    #[test]
    fn test_count_capture_groups() {
        assert_eq!(count_capture_groups("/foo"), 0);
        assert_eq!(count_capture_groups(r"/(a)/(?P<b>x)/(?<c>y)"), 3);
        assert_eq!(count_capture_groups(r"/(?:a)/(?i)x/\(/[(]"), 0);
    }

    #[test]
    fn test_param_names_in_order() {
        let pattern = Pattern::compile("/posts/:id/comments/:author").unwrap();
        let names: Vec<&str> = pattern.param_names().collect();
        assert_eq!(names, vec!["id", "author"]);
    }

    #[test]
    fn test_precedence_is_raw_length() {
        let short = Pattern::compile("/foo/:bar").unwrap();
        let long = Pattern::compile("/foo/:bar/baz").unwrap();
        assert_eq!(short.precedence(), "/foo/:bar".len());
        assert!(long.precedence() > short.precedence());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_single_param_yields_single_name(
            prefix in "[a-z]{1,8}",
            name in "[a-z][a-z0-9_]{0,10}",
            suffix in proptest::option::of("[a-z]{1,8}"),
        ) {
            let pattern = match suffix {
                Some(ref suffix) => format!("/{}/:{}/{}", prefix, name, suffix),
                None => format!("/{}/:{}", prefix, name),
            };
            let compiled = Pattern::compile(&pattern).unwrap();
            let names: Vec<&str> = compiled.param_names().collect();
            prop_assert_eq!(names, vec![name.as_str()]);
        }

        #[test]
        fn prop_static_pattern_matches_only_itself(
            segments in proptest::collection::vec("[a-z]{1,8}", 1..4),
            extra in "[a-z0-9]{1,4}",
        ) {
            let path = format!("/{}", segments.join("/"));
            let compiled = Pattern::compile(&path).unwrap();
            prop_assert!(compiled.is_match(&path));
            let longer = format!("{}{}", path, extra);
            prop_assert!(!compiled.is_match(&longer));
            let deeper = format!("{}/{}", path, extra);
            prop_assert!(!compiled.is_match(&deeper));
        }
    }
}
