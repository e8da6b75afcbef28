// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Passthrough copies: source files copied verbatim into the output tree.

use crate::config::SiteConfig;
use crate::error::{Result, SiteError};
use crate::walk::walk_files;
use std::path::Path;

/// Copy every configured passthrough source into `output_dir`.
///
/// Directory sources are copied recursively, keeping relative paths under
/// the mapped destination; a file source is copied to the destination path
/// itself. Missing sources are skipped with a warning. Returns the number
/// of files copied.
pub fn copy_passthrough(config: &SiteConfig, root: &Path, output_dir: &Path) -> Result<usize> {
    let mut copied = 0;

    for (source, dest) in &config.passthrough {
        let src = root.join(source);
        let dst = output_dir.join(dest.trim_start_matches('/'));

        if src.is_file() {
            copy_file(&src, &dst)?;
            copied += 1;
            continue;
        }
        if !src.is_dir() {
            diagnostics::warn!(
                "Passthrough source {from} does not exist, skipping",
                from: source.as_str()
            );
            continue;
        }

        for file in walk_files(&src, "**/*")? {
            let Ok(rel) = file.strip_prefix(&src) else {
                continue;
            };
            copy_file(&file, &dst.join(rel))?;
            copied += 1;
        }
        diagnostics::debug!("Copied {from} to {to}", from: source.as_str(), to: dest.as_str());
    }

    Ok(copied)
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
    }
    std::fs::copy(src, dst).map_err(|e| SiteError::io(src, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_copy_passthrough() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/css/themes")).expect("mkdir");
        std::fs::write(root.join("src/css/style.css"), "body{}").expect("write");
        std::fs::write(root.join("src/css/themes/dark.css"), "html{}").expect("write");
        std::fs::create_dir_all(root.join("content")).expect("mkdir");
        std::fs::write(root.join("content/favicon.ico"), [1u8, 2]).expect("write");

        let mut config = SiteConfig::default_for("Book");
        config.passthrough = BTreeMap::from([
            ("src/css".to_string(), "css".to_string()),
            ("content/favicon.ico".to_string(), "favicon.ico".to_string()),
            ("content/missing".to_string(), "missing".to_string()),
        ]);

        let out = root.join("_site");
        let copied = copy_passthrough(&config, root, &out).expect("copy");
        assert_eq!(copied, 3);
        assert_eq!(
            std::fs::read_to_string(out.join("css/themes/dark.css")).expect("read"),
            "html{}"
        );
        assert!(out.join("css/style.css").is_file());
        assert!(out.join("favicon.ico").is_file());
        assert!(!out.join("missing").exists());
    }
}
