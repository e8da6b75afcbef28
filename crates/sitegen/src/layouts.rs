// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Maud HTML layouts for book pages.
//!
//! Selected by frontmatter `layout: page|default`. Every layout receives the
//! [`SiteEnv`] globals: the mode lands on `<body data-mode>` and the
//! analytics snippet is included only in production builds with a key.

use crate::env::SiteEnv;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Context passed to layout functions.
pub struct LayoutContext<'a> {
    /// Page title (from frontmatter)
    pub title: &'a str,
    /// Site title (from site.yaml)
    pub site_title: &'a str,
    /// Base URL prefix, used for the stylesheet link
    pub base_url: &'a str,
    /// Rendered HTML content (from markdown + shortcodes)
    pub content: &'a str,
    /// Rendered sidebar HTML (from sidebar partial, if any)
    pub sidebar: Option<&'a str>,
    /// Preview image URL for social cards; no card metadata when `None`
    pub social_image: Option<&'a str>,
    pub env: &'a SiteEnv,
}

/// Names accepted by [`apply_layout`]; anything else renders `default`.
pub const LAYOUTS: &[&str] = &["default", "page"];

/// Apply a named layout to rendered content.
pub fn apply_layout(name: &str, ctx: &LayoutContext) -> String {
    let markup = match name {
        "page" => page_layout(ctx),
        _ => default_layout(ctx),
    };
    markup.into_string()
}

fn stylesheet_href(base_url: &str) -> String {
    format!("{}/css/style.css", base_url.trim_end_matches('/'))
}

fn head(ctx: &LayoutContext) -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="generator" content=(format!("sitegen v{}", VERSION));
            title { (page_title(ctx)) }
            link rel="stylesheet" href=(stylesheet_href(ctx.base_url));
            @if let Some(image) = ctx.social_image {
                (social_meta(&page_title(ctx), image))
            }
            @if ctx.env.analytics_enabled() {
                (analytics_snippet(&ctx.env.analytics_api_key))
            }
        }
    }
}

fn page_title(ctx: &LayoutContext) -> String {
    if ctx.title.is_empty() || ctx.title == ctx.site_title {
        ctx.site_title.to_string()
    } else {
        format!("{} — {}", ctx.title, ctx.site_title)
    }
}

/// Open Graph and Twitter card tags for link previews.
fn social_meta(title: &str, image: &str) -> Markup {
    html! {
        meta property="og:type" content="article";
        meta property="og:title" content=(title);
        meta property="og:image" content=(image);
        meta name="twitter:card" content="summary_large_image";
        meta name="twitter:title" content=(title);
        meta name="twitter:image" content=(image);
    }
}

/// Preview image URL for a page written to `output` (relative to the
/// output directory): `ch1/intro/index.html` → `{url_path}/social/ch1-intro.png`.
pub fn social_image_url(url_path: &str, output: &std::path::Path) -> String {
    let slug = output
        .with_extension("")
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter(|c| *c != "index" && *c != "." && *c != "/")
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "index" } else { slug.as_str() };
    format!("{}/social/{}.png", url_path.trim_end_matches('/'), slug)
}

fn analytics_snippet(api_key: &str) -> Markup {
    // Key is serialized as a JS string literal
    let key = serde_json::to_string(api_key).unwrap_or_else(|_| "\"\"".to_string());
    html! {
        script src="https://us-assets.i.posthog.com/static/array.js" async {}
        script {
            (PreEscaped(format!(
                "window.addEventListener('load', function () {{ if (window.posthog) {{ posthog.init({}, {{ api_host: 'https://us.i.posthog.com' }}); }} }});",
                key
            )))
        }
    }
}

fn sidebar(ctx: &LayoutContext) -> Markup {
    html! {
        @if let Some(sidebar_html) = ctx.sidebar {
            nav class="sidebar" {
                (PreEscaped(sidebar_html))
            }
        }
    }
}

/// Layout for chapters and articles: sidebar plus `<article>` wrapper.
fn page_layout(ctx: &LayoutContext) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            (head(ctx))
            body data-mode=(ctx.env.mode) {
                (sidebar(ctx))
                main class="content-page" {
                    article {
                        (PreEscaped(ctx.content))
                    }
                }
            }
        }
    }
}

/// Default layout for index and listing pages.
fn default_layout(ctx: &LayoutContext) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            (head(ctx))
            body data-mode=(ctx.env.mode) {
                (sidebar(ctx))
                main class="hero" {
                    (PreEscaped(ctx.content))
                }
            }
        }
    }
}
