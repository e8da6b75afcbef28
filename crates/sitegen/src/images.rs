// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Image pipeline options.
//!
//! Resizing and encoding are done by an external tool; this module only
//! holds its settings, plans which variants it should produce, and applies
//! the default `<img>` attributes to rendered pages.

use crate::error::{Result, SiteError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Output format of a resized image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Webp,
    Jpeg,
    Png,
    Avif,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Avif => "avif",
        }
    }
}

/// Settings handed to the image pipeline.
///
/// A `null` width keeps the original size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageOptions {
    #[serde(default = "default_widths")]
    pub widths: Vec<Option<u32>>,
    #[serde(default = "default_formats")]
    pub formats: Vec<ImageFormat>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_url_path")]
    pub url_path: String,
    #[serde(default = "default_attributes")]
    pub default_attributes: BTreeMap<String, String>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            widths: default_widths(),
            formats: default_formats(),
            output_dir: default_output_dir(),
            url_path: default_url_path(),
            default_attributes: default_attributes(),
        }
    }
}

fn default_widths() -> Vec<Option<u32>> {
    vec![Some(300), Some(600), Some(800), None]
}

fn default_formats() -> Vec<ImageFormat> {
    vec![ImageFormat::Webp, ImageFormat::Jpeg]
}

fn default_output_dir() -> String {
    "_site/img/".to_string()
}

fn default_url_path() -> String {
    "/img/".to_string()
}

fn default_attributes() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("loading".to_string(), "lazy".to_string()),
        ("decoding".to_string(), "async".to_string()),
    ])
}

/// One planned output of the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    /// Target width, `None` for the original size
    pub width: Option<u32>,
    pub format: ImageFormat,
    /// File path under `output_dir`
    pub path: String,
    /// Public URL under `url_path`
    pub url: String,
}

impl ImageOptions {
    pub fn validate(&self) -> Result<()> {
        if self.widths.is_empty() {
            return Err(SiteError::validation("images.widths must not be empty"));
        }
        if self.widths.contains(&Some(0)) {
            return Err(SiteError::validation("images.widths must be positive"));
        }
        if self.formats.is_empty() {
            return Err(SiteError::validation("images.formats must not be empty"));
        }
        if !self.url_path.starts_with('/') {
            return Err(SiteError::validation(format!(
                "images.url_path must start with '/': {}",
                self.url_path
            )));
        }
        Ok(())
    }

    /// Plan every (width, format) variant for a source image, widths first.
    pub fn variants(&self, src: &str) -> Vec<ImageVariant> {
        let stem = Path::new(src)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");

        let dir = self.output_dir.trim_end_matches('/');
        let url = self.url_path.trim_end_matches('/');

        let mut out = Vec::with_capacity(self.widths.len() * self.formats.len());
        for width in &self.widths {
            let size = width.map_or_else(|| "full".to_string(), |w| w.to_string());
            for format in &self.formats {
                let name = format!("{}-{}.{}", stem, size, format.extension());
                out.push(ImageVariant {
                    width: *width,
                    format: *format,
                    path: format!("{}/{}", dir, name),
                    url: format!("{}/{}", url, name),
                });
            }
        }
        out
    }

    /// Add each default attribute to every `<img>` tag that does not set it.
    pub fn apply_default_attributes(&self, html: &str) -> String {
        if self.default_attributes.is_empty() {
            return html.to_string();
        }

        IMG_TAG
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let attrs = &caps[1];
                let mut tag = String::from("<img");
                tag.push_str(attrs.trim_end_matches('/').trim_end());
                for (name, value) in &self.default_attributes {
                    if !has_attribute(attrs, name) {
                        tag.push_str(&format!(" {}=\"{}\"", name, value));
                    }
                }
                if attrs.ends_with('/') {
                    tag.push_str(" /");
                }
                tag.push('>');
                tag
            })
            .into_owned()
    }
}

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?s)<img\b([^>]*)>").unwrap()
});

fn has_attribute(attrs: &str, name: &str) -> bool {
    attrs
        .split(|c: char| c.is_whitespace())
        .any(|part| part == name || part.starts_with(&format!("{}=", name)))
}
