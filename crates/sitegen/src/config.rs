// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Site configuration — parsed from `site.yaml` at the project root.

use crate::error::{Result, SiteError};
use crate::images::ImageOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level site configuration.
///
/// ```yaml
/// site:
///   title: "Building RAG Systems"
///   base_url: "/"
///
/// dir:
///   input: "content"
///   output: "_site"
///
/// passthrough:
///   src/css: css
///   content/ch1-rag/assets: ch1-rag/assets
///
/// watch:
///   - src/css/
///
/// images:
///   widths: [300, 600, 800, null]
///   formats: [webp, jpeg]
///   output_dir: "_site/img/"
///   url_path: "/img/"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: SiteMeta,
    #[serde(default)]
    pub dir: DirConfig,
    #[serde(default = "default_template_formats")]
    pub template_formats: Vec<String>,
    /// Source directory → output directory (relative to `dir.output`)
    #[serde(default)]
    pub passthrough: BTreeMap<String, String>,
    /// Extra paths that trigger a rebuild when changed
    #[serde(default)]
    pub watch: Vec<String>,
    #[serde(default)]
    pub images: ImageOptions,
    #[serde(default)]
    pub partials: BTreeMap<String, String>,
}

/// Site-wide metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMeta {
    pub title: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub figure_ids: FigureIdMode,
    /// Emit Open Graph / Twitter card metadata pointing at a per-page
    /// preview image under `images.url_path`
    #[serde(default = "default_social_images")]
    pub social_images: bool,
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_social_images() -> bool {
    true
}

/// How `figure` shortcodes get their element ids when none is passed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FigureIdMode {
    /// `figure-1`, `figure-2`, ... in render order; reproducible builds
    #[default]
    Sequential,
    /// Nine random base-36 characters per figure
    Random,
}

/// Input/output directory mapping, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirConfig {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_includes")]
    pub includes: String,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for DirConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            includes: default_includes(),
            output: default_output(),
        }
    }
}

fn default_input() -> String {
    ".".to_string()
}

fn default_includes() -> String {
    "src/_includes".to_string()
}

fn default_output() -> String {
    "_site".to_string()
}

fn default_template_formats() -> Vec<String> {
    vec!["md".to_string(), "html".to_string()]
}

impl SiteConfig {
    /// The stock configuration for a book site: CSS and chapter assets
    /// copied through, CSS watched, default image pipeline.
    pub fn default_for(title: &str) -> Self {
        Self {
            site: SiteMeta {
                title: title.to_string(),
                base_url: default_base_url(),
                figure_ids: FigureIdMode::default(),
                social_images: default_social_images(),
            },
            dir: DirConfig::default(),
            template_formats: default_template_formats(),
            passthrough: BTreeMap::from([
                ("src/css".to_string(), "css".to_string()),
                (
                    "content/ch1-rag/assets".to_string(),
                    "ch1-rag/assets".to_string(),
                ),
            ]),
            watch: vec!["src/css/".to_string()],
            images: ImageOptions::default(),
            partials: BTreeMap::new(),
        }
    }

    /// Parse and validate a YAML config document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SiteConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate `site.yaml` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| SiteError::io(path, e))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.template_formats.is_empty() {
            return Err(SiteError::validation("template_formats must not be empty"));
        }
        if let Some(bad) = self
            .template_formats
            .iter()
            .find(|f| !matches!(f.as_str(), "md" | "html"))
        {
            return Err(SiteError::validation(format!(
                "unsupported template format '{}'",
                bad
            )));
        }
        if self.dir.output.trim().is_empty() {
            return Err(SiteError::validation("dir.output must not be empty"));
        }
        self.images.validate()
    }

    /// Whether the configured base URL is the site root.
    pub fn is_root_base(&self) -> bool {
        let base = self.site.base_url.trim_end_matches('/');
        base.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageFormat;

    #[test]
    fn parse_minimal_config() {
        let config = SiteConfig::from_yaml("site:\n  title: \"Test Site\"\n").expect("parse");
        assert_eq!(config.site.title, "Test Site");
        assert_eq!(config.site.base_url, "/");
        assert_eq!(config.site.figure_ids, FigureIdMode::Sequential);
        assert!(config.site.social_images);
        assert_eq!(config.dir, DirConfig::default());
        assert_eq!(config.template_formats, vec!["md", "html"]);
        assert!(config.passthrough.is_empty());
        assert!(config.is_root_base());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
site:
  title: "RAG Book"
  base_url: "/book/"
  figure_ids: random
  social_images: false

dir:
  input: "content"
  output: "public"

passthrough:
  src/css: css
  content/ch1-rag/assets: ch1-rag/assets

watch:
  - src/css/

images:
  widths: [300, 600, null]
  formats: [webp, jpeg]
  output_dir: "public/img/"
  url_path: "/img/"

partials:
  sidebar: "src/_includes/sidebar.md"
"#;
        let config = SiteConfig::from_yaml(yaml).expect("parse");
        assert_eq!(config.site.figure_ids, FigureIdMode::Random);
        assert!(!config.site.social_images);
        assert_eq!(config.dir.input, "content");
        assert_eq!(config.dir.includes, "src/_includes");
        assert_eq!(config.passthrough.get("src/css").map(String::as_str), Some("css"));
        assert_eq!(config.watch, vec!["src/css/"]);
        assert_eq!(config.images.widths, vec![Some(300), Some(600), None]);
        assert_eq!(
            config.images.formats,
            vec![ImageFormat::Webp, ImageFormat::Jpeg]
        );
        assert!(!config.is_root_base());
        assert_eq!(config.partials.len(), 1);
    }

    #[test]
    fn reject_unknown_template_format() {
        let err = SiteConfig::from_yaml("site:\n  title: x\ntemplate_formats: [njk]\n")
            .expect_err("njk is not supported");
        assert!(err.to_string().contains("njk"));
    }

    #[test]
    fn default_for_matches_book_layout() {
        let config = SiteConfig::default_for("Book");
        assert_eq!(
            config.passthrough.get("content/ch1-rag/assets").map(String::as_str),
            Some("ch1-rag/assets")
        );
        assert_eq!(config.dir.output, "_site");
        config.validate().expect("stock config is valid");
    }
}
