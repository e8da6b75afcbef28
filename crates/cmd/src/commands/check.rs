// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use sitegen::images::ImageVariant;
use sitegen::{FigureIdMode, ShortcodeContext};
use std::sync::Arc;

use crate::common::SiteContext;

/// What `site check` found.
#[derive(Debug)]
pub struct CheckReport {
    pub title: String,
    pub base_url: String,
    pub figure_ids: FigureIdMode,
    pub shortcodes: Vec<String>,
    /// Variants planned for a sample image, showing the image settings
    pub image_variants: Vec<ImageVariant>,
    pub pages: usize,
}

/// Validate the configuration and list what a build would use.
pub fn check_command(ctx: &SiteContext) -> Result<CheckReport> {
    ctx.config.validate().context("Invalid site configuration")?;

    let sc = sitegen::register_shortcodes(Arc::new(ShortcodeContext::new(
        ctx.config.site.figure_ids,
    )));
    let pages = sitegen::discover_pages(&ctx.config, &ctx.root)
        .context("Failed to discover pages")?;

    Ok(CheckReport {
        title: ctx.config.site.title.clone(),
        base_url: ctx.config.site.base_url.clone(),
        figure_ids: ctx.config.site.figure_ids,
        shortcodes: sc.names().map(str::to_string).collect(),
        image_variants: ctx.config.images.variants("example.jpg"),
        pages: pages.len(),
    })
}

impl CheckReport {
    /// Human-readable report lines.
    pub fn lines(&self, ctx: &SiteContext) -> Vec<String> {
        let mut lines = vec![
            format!("Site: {}", self.title),
            format!(
                "Base URL: {}{}",
                self.base_url,
                if ctx.config.is_root_base() { " (root)" } else { "" }
            ),
            format!("Figure ids: {:?}", self.figure_ids),
            format!("Pages: {}", self.pages),
            format!("Shortcodes: {}", self.shortcodes.join(", ")),
            "Image variants for example.jpg:".to_string(),
        ];
        for variant in &self.image_variants {
            lines.push(format!("  {} -> {}", variant.path, variant.url));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SiteArgs;

    #[test]
    fn test_check_lists_shortcodes_and_variants() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("site.yaml"),
            "site:\n  title: RAG Book\n  base_url: /book/\nimages:\n  widths: [300, null]\n  formats: [webp]\n",
        )
        .expect("write");
        std::fs::write(dir.path().join("index.md"), "# Home\n").expect("write");

        let ctx = SiteContext::load(&SiteArgs {
            root: dir.path().to_path_buf(),
            ..SiteArgs::default()
        })
        .expect("load");
        let report = check_command(&ctx).expect("check");

        assert_eq!(report.title, "RAG Book");
        assert_eq!(report.pages, 1);
        assert!(report.shortcodes.iter().any(|s| s == "ahamoment"));
        assert!(report.shortcodes.iter().any(|s| s == "stylizedList"));
        assert_eq!(report.shortcodes.len(), 6);
        assert_eq!(report.image_variants.len(), 2);

        let lines = report.lines(&ctx);
        assert!(lines.contains(&"Base URL: /book/".to_string()));
        assert!(lines.iter().any(|l| l.ends_with("/img/example-full.webp")));
    }
}
