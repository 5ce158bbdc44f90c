//! Exclusion rules
//!
//! A path is excluded when it lives under an excluded folder or matches an
//! excluded glob pattern. Excluded paths are never indexed and never
//! returned from queries.

use super::vault_path::{normalize_vault_path, split_page_path};
use crate::error::Result;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled folder and pattern exclusions
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    folders: Vec<String>,
    patterns: Vec<Pattern>,
}

impl ExclusionRules {
    /// Compile rules. An invalid glob pattern is rejected up front.
    pub fn new(folders: &[String], patterns: &[String]) -> Result<Self> {
        let folders = folders
            .iter()
            .map(|f| normalize_vault_path(f))
            .filter(|f| !f.is_empty())
            .collect();
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { folders, patterns })
    }

    /// No rules configured
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.patterns.is_empty()
    }

    /// Check a vault-relative path (PDF page paths are checked by their file)
    pub fn is_excluded(&self, path: &str) -> bool {
        let (file, _) = split_page_path(path);
        let file = normalize_vault_path(file);

        let in_folder = self.folders.iter().any(|folder| {
            file.as_bytes().get(folder.len()) == Some(&b'/')
                && file
                    .get(..folder.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(folder))
        });

        in_folder
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(&file, MATCH_OPTIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(folders: &[&str], patterns: &[&str]) -> ExclusionRules {
        let folders: Vec<String> = folders.iter().map(|s| s.to_string()).collect();
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        ExclusionRules::new(&folders, &patterns).unwrap()
    }

    #[test]
    fn test_folder_exclusion() {
        let r = rules(&["Templates", "archive/old/"], &[]);
        assert!(r.is_excluded("Templates/daily.md"));
        assert!(r.is_excluded("templates/nested/x.md"));
        assert!(r.is_excluded("archive/old/a.md"));
        assert!(!r.is_excluded("archive/a.md"));
        assert!(!r.is_excluded("TemplatesX/a.md"));
        assert!(!r.is_excluded("Templates.md"));
    }

    #[test]
    fn test_pattern_exclusion() {
        let r = rules(&[], &["**/*.excalidraw.md", "drafts/*"]);
        assert!(r.is_excluded("art/sketch.excalidraw.md"));
        assert!(r.is_excluded("drafts/idea.md"));
        assert!(!r.is_excluded("notes/idea.md"));
    }

    #[test]
    fn test_pdf_page_paths_follow_their_file() {
        let r = rules(&["private"], &[]);
        assert!(r.is_excluded("private/scan.pdf#page=2"));
        assert!(!r.is_excluded("public/scan.pdf#page=2"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = ExclusionRules::new(&[], &["[unclosed".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_rules() {
        let r = ExclusionRules::default();
        assert!(r.is_empty());
        assert!(!r.is_excluded("anything.md"));
    }
}
