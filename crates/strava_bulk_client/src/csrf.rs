//! Just enough HTML tag scanning to pull the CSRF token out of the login page.
//!
//! This is not an HTML parser. Tags are read in document order. Comments and the
//! bodies of raw-text elements (`script`, `style`, `textarea`, `title`) are
//! skipped, since markup-looking text inside them is not markup. For each tag the
//! attributes are collected into a map keyed by lowercased attribute name, so
//! attribute order on the page does not matter.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::StravaError;

// One alternation so whichever construct opens first wins, as in a tokenizer.
// `regex` has no backreferences, hence a closing tag per element.
static SKIPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<textarea\b[^>]*>.*?</textarea\s*>|<title\b[^>]*>.*?</title\s*>",
    )
    .expect("skipped-content pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("tag pattern")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .expect("attribute pattern")
});

/// A start or self-closing tag with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: HashMap<String, String>,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// All start/self-closing tags of `html` in document order.
pub fn tags(html: &str) -> Vec<Tag> {
    let stripped = SKIPPED.replace_all(html, "");
    TAG.captures_iter(&stripped)
        .map(|cap| {
            let raw_attrs = cap.get(2).map_or("", |m| m.as_str());
            let trimmed = raw_attrs.trim_end();
            Tag {
                name: cap[1].to_ascii_lowercase(),
                attrs: parse_attrs(trimmed.strip_suffix('/').unwrap_or(trimmed)),
            }
        })
        .collect()
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for cap in ATTR.captures_iter(raw) {
        let name = cap[1].to_ascii_lowercase();
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map_or(String::new(), |m| unescape(m.as_str()));
        // First occurrence wins, as in browsers.
        attrs.entry(name).or_insert(value);
    }
    attrs
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Find `<meta name="csrf-token" content="...">` and return its content.
///
/// `meta` is a void element, so both `<meta ... />` and `<meta ...>` count.
pub fn extract_csrf_token(html: &str) -> Result<String, StravaError> {
    tags(html)
        .into_iter()
        .filter(|tag| tag.name == "meta")
        .find(|tag| tag.attr("name") == Some("csrf-token"))
        .and_then(|tag| tag.attrs.get("content").cloned())
        .ok_or(StravaError::TokenNotFound)
}
