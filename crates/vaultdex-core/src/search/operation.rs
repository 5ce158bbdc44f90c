//! Query operations and their compiled matchers

use crate::analysis::normalize;
use crate::config::vault_path::parent_folder;
use crate::error::{Result, VaultdexError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Folder value that matches only documents at the vault root
pub const ROOT_FOLDER: &str = "/";

/// How the stems of one keyword must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every stem of the keyword must occur in the document
    #[default]
    All,
    /// At least one stem must occur
    Any,
}

/// `{name, value}` filter against tags and frontmatter properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub name: String,
    pub value: String,
}

impl PropertyFilter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse `name=value` or `name:value`
    pub fn parse(input: &str) -> Result<Self> {
        let (name, value) = input
            .split_once('=')
            .or_else(|| input.split_once(':'))
            .ok_or_else(|| {
                VaultdexError::InvalidInput(format!(
                    "property filter must look like name=value: {}",
                    input
                ))
            })?;
        let filter = Self::new(name.trim(), value.trim());
        filter.validate()?;
        Ok(filter)
    }

    /// Whether this filter targets tags rather than frontmatter
    pub fn is_tag(&self) -> bool {
        let name = self.name.trim();
        name.eq_ignore_ascii_case("tag") || name.eq_ignore_ascii_case("tags")
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.value.trim().is_empty() {
            return Err(VaultdexError::InvalidInput(format!(
                "property filter needs a name and a value: '{}={}'",
                self.name, self.value
            )));
        }
        Ok(())
    }
}

/// One query: groups are OR-matched internally and AND-combined; empty
/// groups impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub keywords: Vec<String>,
    pub filenames: Vec<String>,
    pub folders: Vec<String>,
    pub properties: Vec<PropertyFilter>,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filenames.push(filename.into());
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folders.push(folder.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(PropertyFilter::new(name, value));
        self
    }

    /// No group carries a value
    pub fn is_empty(&self) -> bool {
        self.keywords.iter().all(|k| k.trim().is_empty())
            && self.filenames.is_empty()
            && self.folders.is_empty()
            && self.properties.is_empty()
    }

    /// Validate and compile patterns. Nothing touches the store before this
    /// succeeds.
    pub(crate) fn compile(&self) -> Result<CompiledOperation> {
        if self.is_empty() {
            return Err(VaultdexError::InvalidInput(
                "operation has no keywords, filenames, folders or properties".to_string(),
            ));
        }

        let filenames = self
            .filenames
            .iter()
            .map(|f| TextMatcher::parse(f))
            .collect::<Result<Vec<_>>>()?;
        let folders = self
            .folders
            .iter()
            .map(|f| FolderMatcher::parse(f))
            .collect::<Result<Vec<_>>>()?;
        for property in &self.properties {
            property.validate()?;
        }

        Ok(CompiledOperation {
            keywords: self
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            filenames,
            folders,
            properties: self.properties.clone(),
        })
    }
}

pub(crate) struct CompiledOperation {
    pub keywords: Vec<String>,
    pub filenames: Vec<TextMatcher>,
    pub folders: Vec<FolderMatcher>,
    pub properties: Vec<PropertyFilter>,
}

impl CompiledOperation {
    /// Filename and folder groups for one document
    pub fn matches_path(&self, path: &str, file_name: &str) -> bool {
        let filename_ok =
            self.filenames.is_empty() || self.filenames.iter().any(|m| m.is_match(file_name));
        let folder_ok = self.folders.is_empty() || self.folders.iter().any(|m| m.is_match(path));
        filename_ok && folder_ok
    }
}

/// `/regex/` when wrapped in slashes, else a case-insensitive pattern
fn parse_regex(pattern: &str) -> Option<Result<Regex>> {
    let inner = pattern.strip_prefix('/')?.strip_suffix('/')?;
    Some(if inner.is_empty() {
        Err(VaultdexError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "empty regular expression".to_string(),
        })
    } else {
        RegexBuilder::new(inner)
            .case_insensitive(true)
            .build()
            .map_err(|e| VaultdexError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    })
}

/// Case-insensitive substring or regex
pub(crate) enum TextMatcher {
    Contains(String),
    Regex(Regex),
}

impl TextMatcher {
    pub fn parse(pattern: &str) -> Result<Self> {
        match parse_regex(pattern.trim()) {
            Some(regex) => Ok(Self::Regex(regex?)),
            None => Ok(Self::Contains(normalize(pattern.trim()))),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Contains(needle) => normalize(text).contains(needle.as_str()),
            Self::Regex(re) => re.is_match(text),
        }
    }
}

/// Folder prefix, folder regex or the vault-root sentinel
pub(crate) enum FolderMatcher {
    Root,
    Prefix(String),
    Regex(Regex),
}

impl FolderMatcher {
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern == ROOT_FOLDER {
            return Ok(Self::Root);
        }
        if let Some(regex) = parse_regex(pattern) {
            return Ok(Self::Regex(regex?));
        }
        let prefix = normalize(pattern.trim_matches('/'));
        if prefix.is_empty() {
            return Err(VaultdexError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "empty folder".to_string(),
            });
        }
        Ok(Self::Prefix(prefix))
    }

    /// Match against a document path
    pub fn is_match(&self, path: &str) -> bool {
        let folder = parent_folder(path);
        match self {
            Self::Root => folder.is_empty(),
            Self::Prefix(prefix) => {
                let folder = normalize(folder);
                folder == *prefix
                    || (folder.starts_with(prefix.as_str())
                        && folder.as_bytes().get(prefix.len()) == Some(&b'/'))
            }
            Self::Regex(re) => re.is_match(folder),
        }
    }
}
