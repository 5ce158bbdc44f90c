//! Note parsing: YAML frontmatter and tags

use crate::analysis::normalize;
use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    /// Inline `#tag`; must not follow a word character, `#`, `&` or `/`,
    /// and must contain at least one non-digit.
    static ref INLINE_TAG_RE: Regex =
        Regex::new(r"(?:^|[^\w#&/])#([\w/-]*[\p{L}_/-][\w/-]*)").unwrap();
}

/// Keys whose values are treated as tags
const TAG_KEYS: &[&str] = &["tags", "tag"];

/// A parsed markdown note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNote<'a> {
    /// Flattened frontmatter properties, lowercase key to scalar values
    pub properties: BTreeMap<String, Vec<String>>,
    /// Tag name to byte offsets of its inline occurrences (frontmatter tags
    /// are recorded at offset 0)
    pub tags: BTreeMap<String, Vec<usize>>,
    /// Text after the frontmatter block
    pub body: &'a str,
    /// Byte offset of `body` in the original content
    pub body_offset: usize,
}

impl ParsedNote<'_> {
    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tags.keys().cloned().collect()
    }
}

/// Normalize a tag for storage and comparison: no leading `#`, lowercase.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

/// Normalize a `name: value` property into its stored term
pub fn property_term(name: &str, value: &str) -> String {
    format!("{}:{}", normalize(name.trim()), normalize(value.trim()))
}

/// Parse frontmatter and collect tags
pub fn parse_note(content: &str) -> ParsedNote<'_> {
    let (yaml, body_offset) = split_frontmatter(content);
    let mut note = ParsedNote {
        body: &content[body_offset..],
        body_offset,
        ..Default::default()
    };

    if let Some(yaml) = yaml {
        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(map)) => {
                for (key, value) in map {
                    let Some(key) = scalar_to_string(&key) else {
                        continue;
                    };
                    let key = key.to_lowercase();
                    let values = flatten_values(&value);
                    if TAG_KEYS.contains(&key.as_str()) {
                        for tag in values.iter().flat_map(|v| split_tag_list(v)) {
                            note.tags.entry(tag).or_default().push(0);
                        }
                    } else if !values.is_empty() {
                        note.properties.entry(key).or_default().extend(values);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Ignoring unparseable frontmatter: {}", e),
        }
    }

    for caps in INLINE_TAG_RE.captures_iter(note.body) {
        if let Some(m) = caps.get(1) {
            let tag = normalize_tag(m.as_str());
            // `m.start() - 1` is the `#`
            let offset = body_offset + m.start() - 1;
            note.tags.entry(tag).or_default().push(offset);
        }
    }

    note
}

/// Returns the YAML block (if any) and the byte offset where the body starts.
fn split_frontmatter(content: &str) -> (Option<&str>, usize) {
    let first_line_end = match content.find('\n') {
        Some(idx) => idx,
        None => return (None, 0),
    };
    if content[..first_line_end].trim_end() != "---" {
        return (None, 0);
    }

    let yaml_start = first_line_end + 1;
    let mut cursor = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&content[yaml_start..cursor]), cursor + line.len());
        }
        cursor += line.len();
    }

    (None, 0)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten_values(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `tags: a, b` and `tags: a b` both declare two tags
fn split_tag_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(normalize_tag)
        .filter(|t| !t.is_empty())
        .collect()
}
