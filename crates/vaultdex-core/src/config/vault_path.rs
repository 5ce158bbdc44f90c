//! Vault-relative path utilities
//!
//! Documents are keyed by vault-relative paths with `/` separators. PDF
//! pages are pseudo-documents keyed by `<path>#page=<n>`.

/// Separator between a PDF path and its page number
pub const PAGE_MARKER: &str = "#page=";

/// Normalize a vault-relative path (forward slashes, no empty or `.` segments)
pub fn normalize_vault_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the pseudo-document path for one PDF page
pub fn page_path(path: &str, page: u32) -> String {
    format!("{}{}{}", path, PAGE_MARKER, page)
}

/// Split `file.pdf#page=3` into (`file.pdf`, Some(3)). Plain paths return
/// (`path`, None).
pub fn split_page_path(path: &str) -> (&str, Option<u32>) {
    match path.rfind(PAGE_MARKER) {
        Some(idx) => match path[idx + PAGE_MARKER.len()..].parse::<u32>() {
            Ok(page) => (&path[..idx], Some(page)),
            Err(_) => (path, None),
        },
        None => (path, None),
    }
}

/// Folder part of a path (`""` for files at the vault root)
pub fn parent_folder(path: &str) -> &str {
    let (file, _) = split_page_path(path);
    match file.rfind('/') {
        Some(idx) => &file[..idx],
        None => "",
    }
}

/// Last path segment, including extension
pub fn file_name(path: &str) -> &str {
    let (file, _) = split_page_path(path);
    file.rsplit('/').next().unwrap_or(file)
}

/// File name without its extension
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Lowercase extension without the dot
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vault_path() {
        assert_eq!(normalize_vault_path("notes\\daily//./today.md"), "notes/daily/today.md");
        assert_eq!(normalize_vault_path("/root.md"), "root.md");
    }

    #[test]
    fn test_page_path_round_trip() {
        let path = page_path("papers/paper.pdf", 3);
        assert_eq!(path, "papers/paper.pdf#page=3");
        assert_eq!(split_page_path(&path), ("papers/paper.pdf", Some(3)));
        assert_eq!(split_page_path("a.md"), ("a.md", None));
        assert_eq!(split_page_path("odd#page=x.md"), ("odd#page=x.md", None));
    }

    #[test]
    fn test_parent_folder() {
        assert_eq!(parent_folder("a/b/c.md"), "a/b");
        assert_eq!(parent_folder("c.md"), "");
        assert_eq!(parent_folder("docs/x.pdf#page=2"), "docs");
    }

    #[test]
    fn test_file_name_and_stem() {
        assert_eq!(file_name("a/b/Report 2024.md"), "Report 2024.md");
        assert_eq!(file_stem("a/b/Report 2024.md"), "Report 2024");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_name("x/paper.pdf#page=9"), "paper.pdf");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a/B.PDF"), Some("pdf".to_string()));
        assert_eq!(extension("README"), None);
        assert_eq!(extension("trailing."), None);
    }
}
