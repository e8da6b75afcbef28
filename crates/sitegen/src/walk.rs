// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Glob-driven directory walks.

use crate::error::{Result, SiteError};
use std::path::{Path, PathBuf};
use wax::Glob;

/// All regular files under `root` matching `pattern`, sorted.
///
/// A missing `root` yields no files.
pub fn walk_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let glob = Glob::new(pattern).map_err(|e| SiteError::glob(pattern, e))?;

    let mut files = Vec::new();
    for entry in glob.walk(root) {
        let entry = entry.map_err(|e| SiteError::Walk {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Glob matching every file with one of the given extensions.
pub fn extension_pattern(extensions: &[String]) -> String {
    match extensions {
        [single] => format!("**/*.{}", single),
        _ => format!("**/*.{{{}}}", extensions.join(",")),
    }
}

/// True if any component of `path` starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s.starts_with('.') && s != "." && s != "..")
    })
}

/// Lexically normalize `path` (drop `.` components, resolve `..`).
///
/// A path that normalizes to nothing is the current directory, `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// `path` relative to `base`; a `.` base leaves relative paths unchanged.
pub fn relative_to<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_files_finds_nested_matches() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("ch1/assets")).expect("mkdir");
        std::fs::write(dir.path().join("index.md"), "# Home").expect("write");
        std::fs::write(dir.path().join("ch1/intro.md"), "# Intro").expect("write");
        std::fs::write(dir.path().join("ch1/assets/a.png"), [0u8]).expect("write");

        let files = walk_files(dir.path(), "**/*.md").expect("walk");
        assert_eq!(
            files,
            vec![dir.path().join("ch1/intro.md"), dir.path().join("index.md")]
        );

        let all = walk_files(dir.path(), "**/*").expect("walk");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_walk_missing_root() {
        let files = walk_files(Path::new("/definitely/not/here"), "**/*").expect("walk");
        assert!(files.is_empty());
    }

    #[test]
    fn test_extension_pattern() {
        assert_eq!(extension_pattern(&["md".to_string()]), "**/*.md");
        assert_eq!(
            extension_pattern(&["md".to_string(), "html".to_string()]),
            "**/*.{md,html}"
        );
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new(".git/config")));
        assert!(is_hidden(Path::new("content/.draft.md")));
        assert!(!is_hidden(Path::new("./content/ch1.md")));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./src/css/")), PathBuf::from("src/css"));
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    }

    #[test]
    fn test_normalize_current_dir() {
        assert_eq!(normalize(Path::new("./.")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize(&Path::new(".").join("_site")), PathBuf::from("_site"));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("content/ch1.md"), Path::new(".")),
            Path::new("content/ch1.md")
        );
        assert_eq!(
            relative_to(Path::new("/book/content/ch1.md"), Path::new("/book")),
            Path::new("content/ch1.md")
        );
    }
}
