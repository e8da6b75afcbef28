// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Site build.
//!
//! 1. Discovers content pages under `dir.input`
//! 2. Renders each page: frontmatter → shortcodes → markdown → layout
//! 3. Writes pages to `dir.output` as `slug/index.html`
//! 4. Runs the passthrough copies

use crate::config::SiteConfig;
use crate::env::SiteEnv;
use crate::error::{Result, SiteError};
use crate::layouts::{self, LayoutContext};
use crate::markdown::{self, Shortcodes};
use crate::passthrough::copy_passthrough;
use crate::shortcodes::{self, ShortcodeContext};
use crate::walk::{extension_pattern, is_hidden, normalize, relative_to, walk_files};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Frontmatter parsed from the top of each page.
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    layout: Option<String>,
    /// Output URL, e.g. `/about/` or `/404.html`
    #[serde(default)]
    permalink: Option<String>,
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Written pages, relative to the output directory
    pub pages: Vec<PathBuf>,
    /// Number of passthrough files copied
    pub copied: usize,
}

/// Generate the complete site for the project rooted at `root`.
pub fn generate_site(config: &SiteConfig, env: &SiteEnv, root: &Path) -> Result<BuildReport> {
    let input_dir = normalize(&root.join(&config.dir.input));
    let output_dir = normalize(&root.join(&config.dir.output));

    let sources = discover_pages(config, root)?;
    diagnostics::info!("Discovered {count} pages", count: sources.len());

    // One context per build keeps figure ids unique across pages
    let sc_ctx = Arc::new(ShortcodeContext::new(config.site.figure_ids));
    let sc = shortcodes::register_shortcodes(sc_ctx);

    let sidebar_html = render_partial(config, root, "sidebar", &sc);

    let mut report = BuildReport::default();
    for source in &sources {
        let rel = relative_to(source, &input_dir);
        let page = render_source(config, env, &sc, source, rel, sidebar_html.as_deref())?;

        let out_path = output_dir.join(&page.output);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
        }
        std::fs::write(&out_path, page.html.as_bytes()).map_err(|e| SiteError::io(&out_path, e))?;

        let written = page.output.display().to_string();
        diagnostics::debug!("wrote {written}", written: written.as_str());
        report.pages.push(page.output);
    }

    report.copied = copy_passthrough(config, root, &output_dir)?;

    let output = output_dir.display().to_string();
    diagnostics::info!(
        "Site generation complete: {pages} pages, {copied} files copied to {output}",
        pages: report.pages.len(),
        copied: report.copied,
        output: output.as_str()
    );
    Ok(report)
}

/// Page source files under the input directory.
///
/// Skips the output tree, the includes directory, passthrough sources,
/// partials and hidden paths.
pub fn discover_pages(config: &SiteConfig, root: &Path) -> Result<Vec<PathBuf>> {
    let input_dir = normalize(&root.join(&config.dir.input));
    let excluded: Vec<PathBuf> = [&config.dir.output, &config.dir.includes]
        .into_iter()
        .chain(config.passthrough.keys())
        .chain(config.partials.values())
        .map(|p| normalize(&root.join(p)))
        .collect();

    let pattern = extension_pattern(&config.template_formats);
    let pages = walk_files(&input_dir, &pattern)?
        .into_iter()
        .map(|p| normalize(&p))
        .filter(|p| {
            let rel = relative_to(p, &input_dir);
            !is_hidden(rel) && !excluded.iter().any(|ex| p.starts_with(ex))
        })
        .collect();
    Ok(pages)
}

struct RenderedPage {
    output: PathBuf,
    html: String,
}

fn render_source(
    config: &SiteConfig,
    env: &SiteEnv,
    sc: &Shortcodes,
    source: &Path,
    rel: &Path,
    sidebar: Option<&str>,
) -> Result<RenderedPage> {
    let raw = std::fs::read_to_string(source).map_err(|e| SiteError::io(source, e))?;

    let (fm_yaml, body) = split_frontmatter(&raw);
    let fm: Frontmatter = if fm_yaml.is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml_ng::from_str(fm_yaml).map_err(|e| SiteError::Frontmatter {
            path: source.to_path_buf(),
            source: e,
        })?
    };

    let source_name = rel.display().to_string();
    let is_markdown = rel.extension().and_then(|e| e.to_str()) == Some("md");
    let expanded = if is_markdown {
        markdown::render_page(body, sc, Some(&source_name))
    } else {
        markdown::preprocess_shortcodes(body, sc, Some(&source_name))
    };
    let content = expanded.map_err(|e| SiteError::shortcode(source, e))?;
    let content = config.images.apply_default_attributes(&content);

    let title = fm.title.unwrap_or_else(|| default_title(rel));
    let layout = fm.layout.as_deref().unwrap_or("default");
    if !layouts::LAYOUTS.contains(&layout) {
        diagnostics::warn!(
            "Unknown layout {layout} in {page}, using default",
            layout: layout,
            page: source_name.as_str()
        );
    }

    let output = match fm.permalink.as_deref() {
        Some(permalink) => permalink_path(permalink).ok_or_else(|| SiteError::Permalink {
            path: source.to_path_buf(),
            permalink: permalink.to_string(),
        })?,
        None => output_path(rel),
    };
    let social_image = config
        .site
        .social_images
        .then(|| layouts::social_image_url(&config.images.url_path, &output));

    let html = layouts::apply_layout(
        layout,
        &LayoutContext {
            title: &title,
            site_title: &config.site.title,
            base_url: &config.site.base_url,
            content: &content,
            sidebar,
            social_image: social_image.as_deref(),
            env,
        },
    );
    Ok(RenderedPage { output, html })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn render_partial(
    config: &SiteConfig,
    root: &Path,
    name: &str,
    sc: &Shortcodes,
) -> Option<String> {
    let path = config.partials.get(name)?;
    let full = root.join(path);
    let md = match std::fs::read_to_string(&full) {
        Ok(md) => md,
        Err(e) => {
            let reason = e.to_string();
            diagnostics::warn!(
                "Cannot read partial {name} from {path}: {reason}",
                name: name,
                path: path.as_str(),
                reason: reason.as_str()
            );
            return None;
        }
    };
    match markdown::render_page(&md, sc, Some(path)) {
        Ok(html) => Some(html),
        Err(e) => {
            let reason = e.to_string();
            diagnostics::warn!(
                "Cannot render partial {name}: {reason}",
                name: name,
                reason: reason.as_str()
            );
            None
        }
    }
}

/// `ch1/intro.md` → `ch1/intro/index.html`; `ch1/index.md` → `ch1/index.html`.
fn output_path(rel: &Path) -> PathBuf {
    let parent = rel.parent().unwrap_or(Path::new(""));
    match rel.file_stem().and_then(|s| s.to_str()) {
        Some("index") | None => parent.join("index.html"),
        Some(stem) => parent.join(stem).join("index.html"),
    }
}

/// `/about/` → `about/index.html`; `/404.html` → `404.html`.
///
/// `None` when a `..` component would leave the output directory.
fn permalink_path(permalink: &str) -> Option<PathBuf> {
    let trimmed = permalink.trim_start_matches('/');
    if trimmed.split(['/', '\\']).any(|part| part == "..") {
        return None;
    }
    if trimmed.is_empty() {
        return Some(PathBuf::from("index.html"));
    }
    if trimmed.ends_with(".html") {
        Some(PathBuf::from(trimmed))
    } else {
        Some(PathBuf::from(trimmed.trim_end_matches('/')).join("index.html"))
    }
}

/// Title from the file name: `02-vector-stores.md` → `02 vector stores`.
fn default_title(rel: &Path) -> String {
    rel.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace(['-', '_'], " "))
        .unwrap_or_default()
}

/// Split a leading `---` YAML block from the body.
fn split_frontmatter(content: &str) -> (&str, &str) {
    let trimmed = content.trim_start();
    let Some(after) = trimmed.strip_prefix("---") else {
        return ("", content);
    };
    match after.find("\n---") {
        Some(end) => {
            let rest = &after[end + 4..];
            let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest);
            (after[..end].trim(), rest)
        }
        None => ("", content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frontmatter() {
        let (fm, body) = split_frontmatter("---\ntitle: Hi\n---\n\n# Body");
        assert_eq!(fm, "title: Hi");
        assert_eq!(body, "\n# Body");
    }

    #[test]
    fn test_split_frontmatter_none() {
        let (fm, body) = split_frontmatter("# Just markdown");
        assert!(fm.is_empty());
        assert_eq!(body, "# Just markdown");
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(Path::new("index.md")), PathBuf::from("index.html"));
        assert_eq!(
            output_path(Path::new("ch1-rag/index.md")),
            PathBuf::from("ch1-rag/index.html")
        );
        assert_eq!(
            output_path(Path::new("ch1-rag/chunking.md")),
            PathBuf::from("ch1-rag/chunking/index.html")
        );
    }

    #[test]
    fn test_permalink_path() {
        let path = |p: &str| permalink_path(p).expect("permalink");
        assert_eq!(path("/"), PathBuf::from("index.html"));
        assert_eq!(path("/about/"), PathBuf::from("about/index.html"));
        assert_eq!(path("/404.html"), PathBuf::from("404.html"));
        assert_eq!(path("/notes..v2/"), PathBuf::from("notes..v2/index.html"));
    }

    #[test]
    fn test_permalink_outside_output_rejected() {
        assert_eq!(permalink_path("../../x.html"), None);
        assert_eq!(permalink_path("/docs/../../etc/"), None);
        assert_eq!(permalink_path("/.."), None);
    }

    #[test]
    fn test_generate_site_rejects_escaping_permalink() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("book");
        write(&root, "index.md", "# Home");
        write(&root, "evil.md", "---\npermalink: ../../escaped.html\n---\n# Evil");

        let config = SiteConfig::default_for("Book");
        let err = generate_site(&config, &SiteEnv::default(), &root).expect_err("escaping permalink");
        let msg = err.to_string();
        assert!(msg.contains("evil.md"), "{}", msg);
        assert!(msg.contains("../../escaped.html"), "{}", msg);
        assert!(!dir.path().join("escaped.html").exists());
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title(Path::new("ch1/02-vector-stores.md")), "02 vector stores");
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, content).expect("write");
    }

    #[test]
    fn test_discover_pages_skips_excluded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "index.md", "# Home");
        write(root, "content/ch1-rag/intro.md", "# Intro");
        write(root, "content/ch1-rag/assets/notes.md", "not a page");
        write(root, "src/_includes/sidebar.md", "- nav");
        write(root, "_site/old.html", "<p>old</p>");
        write(root, ".github/README.md", "hidden");
        write(root, "content/style.css", "body{}");

        let config = SiteConfig::default_for("Book");
        let pages = discover_pages(&config, root).expect("discover");
        let rels: Vec<PathBuf> = pages
            .iter()
            .map(|p| p.strip_prefix(normalize(root)).expect("under root").to_path_buf())
            .collect();
        assert_eq!(
            rels,
            vec![
                PathBuf::from("content/ch1-rag/intro.md"),
                PathBuf::from("index.md")
            ]
        );
    }

    #[test]
    fn test_generate_site() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(
            root,
            "index.md",
            "---\ntitle: Welcome\n---\n\n# Welcome\n\n{{ ahamoment \"Retrieval beats recall.\" /}}\n",
        );
        write(
            root,
            "content/ch1-rag/chunking.md",
            "---\ntitle: Chunking\nlayout: page\n---\n\n\
             {{ codeblock \"python\" }}\nchunks = split(doc)\n\nprint(f\"${len(chunks)}\")\n{{ /codeblock }}\n\n\
             ![Diagram](/img/chunks.png)\n\n\
             {{ figure \"/img/a.png\" \"A\" /}}\n\n\
             {{ contentfooter '{\"url\":\"/\",\"title\":\"Home\"}' null /}}\n",
        );
        write(root, "about.html", "---\npermalink: /about/\n---\n<p>{{ figure \"/img/me.png\" /}}</p>");
        write(root, "src/css/style.css", "body{}");

        let config = SiteConfig::default_for("RAG Book");
        let env = SiteEnv {
            analytics_api_key: "phc_1".to_string(),
            mode: "production".to_string(),
        };
        let report = generate_site(&config, &env, root).expect("build");
        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.copied, 1);

        let out = root.join("_site");
        let index = std::fs::read_to_string(out.join("index.html")).expect("index");
        assert!(index.contains("Welcome — RAG Book"));
        assert!(index.contains("AHA! Moment"));
        assert!(index.contains("posthog.init(\"phc_1\""));

        let chunking =
            std::fs::read_to_string(out.join("content/ch1-rag/chunking/index.html")).expect("chunking");
        assert!(chunking.contains("<article>"));
        assert!(chunking.contains("chunks = split(doc)\n\nprint(f\"${len(chunks)}\")</code>"));
        assert!(chunking.contains(r"\${len(chunks)}"));
        // about.html sorts first and takes the first figure id
        assert!(chunking.contains("id=\"figure-2\""));
        assert!(chunking.contains("content-nav-prev"));
        // Markdown images get the default attributes
        assert!(chunking.contains("<img src=\"/img/chunks.png\" alt=\"Diagram\" decoding=\"async\" loading=\"lazy\""));

        // Social cards point at the per-page preview image
        assert!(chunking.contains(
            r#"<meta property="og:image" content="/img/social/content-ch1-rag-chunking.png">"#
        ));
        assert!(index.contains(r#"<meta property="og:image" content="/img/social/index.png">"#));

        let about = std::fs::read_to_string(out.join("about/index.html")).expect("about");
        assert!(about.contains("id=\"figure-1\""));
        assert!(about.contains(r#"content="/img/social/about.png""#));

        assert!(out.join("css/style.css").is_file());
    }

    #[test]
    fn test_generate_site_reports_shortcode_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "broken.md", "{{ nosuchthing /}}");

        let config = SiteConfig::default_for("Book");
        let err = generate_site(&config, &SiteEnv::default(), root).expect_err("unknown shortcode");
        let msg = err.to_string();
        assert!(msg.contains("broken.md"), "{}", msg);
        assert!(msg.contains("nosuchthing"), "{}", msg);
    }
}
