//! Composite trace names of the form `<app_name>-<tag>`.
//!
//! Android package names never contain `-`, so the first dash after the
//! package name separates it from the capture tag. Both parsers are total:
//! any input yields a (possibly empty) string, so batch code can filter
//! instead of handling errors.

use std::sync::LazyLock;

use regex::Regex;

static APP_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[a-zA-Z]\w*[.]){1,3}[A-Za-z]\w*)").expect("app name pattern")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([\w.-]+)").expect("tag pattern"));

/// Extract the leading package name, e.g. `com.foo.bar` from `com.foo.bar-a.gfxr`.
///
/// Returns an empty string when the name does not start with a package id.
pub fn parse_app_name(name: &str) -> String {
    APP_NAME_RE
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extract the tag following the first `-`, e.g. `test1-tag.gfxr`.
pub fn parse_tag(name: &str) -> String {
    TAG_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Build `<app_name>-<tag>`.
pub fn compose(app_name: &str, tag: &str) -> String {
    format!("{app_name}-{tag}")
}

/// A parsed `<app_name>-<tag>` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeName {
    pub app_name: String,
    pub tag: String,
}

impl CompositeName {
    /// Parse a file name; `None` unless both parts are present.
    pub fn parse(name: &str) -> Option<Self> {
        let app_name = parse_app_name(name);
        if app_name.is_empty() {
            return None;
        }
        let tag = parse_tag(&name[app_name.len()..]);
        if tag.is_empty() {
            return None;
        }
        Some(Self { app_name, tag })
    }
}

impl std::fmt::Display for CompositeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&compose(&self.app_name, &self.tag))
    }
}
