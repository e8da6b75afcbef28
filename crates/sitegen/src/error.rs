// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SiteError>;

/// Errors raised while expanding shortcodes in a single document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcodeError {
    #[error("Empty shortcode")]
    Empty,

    #[error("Unexpected closing tag: {0}")]
    UnexpectedClose(String),

    #[error("Unknown shortcode: '{0}'")]
    Unknown(String),

    #[error(
        "Block shortcode '{0}' missing closing tag. Use '{{{{ {0} /}}}}' for self-closing."
    )]
    Unclosed(String),

    #[error("Unclosed quote in argument value")]
    UnclosedQuote,
}

/// Errors raised while loading configuration or building the site.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid site config: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    #[error("Invalid site config: {0}")]
    Validation(String),

    #[error("Bad frontmatter in '{path}': {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Shortcode error in '{path}': {source}")]
    Shortcode {
        path: PathBuf,
        #[source]
        source: ShortcodeError,
    },

    #[error("Permalink '{permalink}' in '{path}' leaves the output directory")]
    Permalink { path: PathBuf, permalink: String },

    #[error("Bad glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("Directory walk failed under {root}: {message}")]
    Walk { root: PathBuf, message: String },
}

impl SiteError {
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        SiteError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        SiteError::Validation(msg.into())
    }

    pub fn shortcode<P: AsRef<Path>>(path: P, source: ShortcodeError) -> Self {
        SiteError::Shortcode {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn glob<S: Into<String>>(pattern: S, err: impl std::fmt::Display) -> Self {
        SiteError::Glob {
            pattern: pattern.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_message_names_the_shortcode() {
        let msg = ShortcodeError::Unclosed("ahamoment".to_string()).to_string();
        assert_eq!(
            msg,
            "Block shortcode 'ahamoment' missing closing tag. Use '{{ ahamoment /}}' for self-closing."
        );
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = SiteError::io(
            "content/missing.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("content/missing.md"));
    }
}
