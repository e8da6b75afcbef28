// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Built-in shortcodes for book pages.
//!
//! Each renderer takes a typed request and returns an HTML fragment. The
//! request types are built from [`ShortcodeArgs`] at the registration
//! boundary, where missing or malformed arguments degrade to defaults.
//! Rendering never fails.
//!
//! Arguments are embedded as given: callout content and captions are
//! trusted HTML, and nothing is entity-escaped.

use crate::config::FigureIdMode;
use crate::markdown::{ShortcodeArgs, Shortcodes};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const CALLOUT: &str = "ahamoment";
pub const CODE_BLOCK: &str = "codeblock";
pub const FIGURE: &str = "figure";
pub const STYLIZED_LIST: &str = "stylizedList";
pub const RESOURCE_LINKS: &str = "resourcelinks";
pub const CONTENT_FOOTER: &str = "contentfooter";

pub const DEFAULT_CALLOUT_LABEL: &str = "AHA! Moment";
pub const DEFAULT_LINK_TITLE: &str = "Link";
pub const DEFAULT_LINK_URL: &str = "#";
pub const DEFAULT_LIST_STYLE: &str = "check";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A labeled callout card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    pub content: String,
    pub label: String,
}

impl Callout {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            label: DEFAULT_CALLOUT_LABEL.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// `{{ ahamoment "content" "label" /}}` or
    /// `{{ ahamoment label="..." }}content{{ /ahamoment }}`.
    pub fn from_args(args: &ShortcodeArgs) -> Self {
        let (content, label) = match args.body() {
            Some(body) => (Some(body), args.named_or("label", 0)),
            None => (args.named_or("content", 0), args.named_or("label", 1)),
        };
        let callout = Self::new(content.unwrap_or(""));
        match label {
            Some(label) => callout.with_label(label),
            None => callout,
        }
    }
}

/// A code listing with a copy button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub code: String,
    /// Empty when unknown; the header then reads `code`
    pub language: String,
}

impl CodeBlock {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
        }
    }

    /// `{{ codeblock "code" "lang" /}}` or
    /// `{{ codeblock "lang" }}\ncode\n{{ /codeblock }}`.
    ///
    /// In the block form one line break directly after the opening tag and
    /// one before the closing tag are not part of the code.
    pub fn from_args(args: &ShortcodeArgs) -> Self {
        match args.body() {
            Some(body) => {
                let body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);
                let body = body.strip_suffix('\n').unwrap_or(body);
                let body = body.strip_suffix('\r').unwrap_or(body);
                Self::new(body, args.named_or("language", 0).unwrap_or(""))
            }
            None => Self::new(
                args.named_or("code", 0).unwrap_or(""),
                args.named_or("language", 1).unwrap_or(""),
            ),
        }
    }
}

/// A captioned image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Figure {
    pub src: String,
    pub alt: String,
    /// Omitted from the output when empty
    pub caption: String,
    /// Element id; assigned from [`FigureIds`] when `None`
    pub id: Option<String>,
}

impl Figure {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// `{{ figure "src" "alt" "caption" /}}`, named `src`/`alt`/`caption`/`id`.
    pub fn from_args(args: &ShortcodeArgs) -> Self {
        Self {
            src: args.named_or("src", 0).unwrap_or("").to_string(),
            alt: args.named_or("alt", 1).unwrap_or("").to_string(),
            caption: args
                .named_or("caption", 2)
                .or_else(|| args.body())
                .unwrap_or("")
                .to_string(),
            id: args.get_str("id").filter(|id| !id.is_empty()).map(str::to_string),
        }
    }
}

/// One entry of a resource-links table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

impl Default for ResourceLink {
    fn default() -> Self {
        Self {
            title: DEFAULT_LINK_TITLE.to_string(),
            url: DEFAULT_LINK_URL.to_string(),
        }
    }
}

impl ResourceLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Read `title` and `url` from a JSON value, each defaulting on its own.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        Self {
            title: non_empty_str(value, "title").unwrap_or(defaults.title),
            url: non_empty_str(value, "url").unwrap_or(defaults.url),
        }
    }

    /// Parse a JSON list; anything that is not an array yields no links.
    pub fn parse_list(json: &str) -> Vec<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Array(items)) => items.iter().map(Self::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// `{{ resourcelinks '[{"title":"Docs","url":"/docs"}]' /}}`, or the
    /// same JSON as `links=` or as the block body.
    pub fn list_from_args(args: &ShortcodeArgs) -> Vec<Self> {
        args.named_or("links", 0)
            .or_else(|| args.body())
            .map(Self::parse_list)
            .unwrap_or_default()
    }
}

/// One side of the previous/next footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub url: String,
    pub title: String,
}

impl NavLink {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// A JSON object becomes a link; `null` and other shapes become `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Some(Self {
            url: non_empty_str(value, "url").unwrap_or_else(|| DEFAULT_LINK_URL.to_string()),
            title: non_empty_str(value, "title").unwrap_or_default(),
        })
    }

    /// One side from `{side}='{"url":..,"title":..}'` (or the positional
    /// slot), or from `{side}_url` / `{side}_title`.
    fn side_from_args(args: &ShortcodeArgs, side: &str, index: usize) -> Option<Self> {
        if let Some(json) = args.named_or(side, index) {
            return serde_json::from_str::<Value>(json)
                .ok()
                .and_then(|v| Self::from_value(&v));
        }
        let url = args.get_str(&format!("{}_url", side));
        let title = args.get_str(&format!("{}_title", side));
        if url.is_none() && title.is_none() {
            return None;
        }
        Some(Self::new(
            url.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_LINK_URL),
            title.unwrap_or(""),
        ))
    }

    /// `(prev, next)` for a `contentfooter` invocation.
    pub fn pair_from_args(args: &ShortcodeArgs) -> (Option<Self>, Option<Self>) {
        (
            Self::side_from_args(args, "prev", 0),
            Self::side_from_args(args, "next", 1),
        )
    }
}

/// A decorated bullet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylizedList {
    pub items: Vec<String>,
    pub style: String,
}

impl StylizedList {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            style: DEFAULT_LIST_STYLE.to_string(),
        }
    }

    /// Items from a JSON array of strings, or one item per non-blank line
    /// (leading `-`/`*` bullets dropped).
    pub fn parse_items(text: &str) -> Vec<String> {
        if let Ok(Value::Array(values)) = serde_json::from_str::<Value>(text) {
            return values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
        }
        text.lines()
            .map(|line| {
                let line = line.trim();
                line.strip_prefix("- ")
                    .or_else(|| line.strip_prefix("* "))
                    .unwrap_or(line)
                    .trim()
            })
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `{{ stylizedList '["a","b"]' "arrow" /}}` or a block body of lines.
    pub fn from_args(args: &ShortcodeArgs) -> Self {
        let (items, style) = match args.body() {
            Some(body) => (
                args.get_str("items").unwrap_or(body),
                args.named_or("style", 0),
            ),
            None => (
                args.named_or("items", 0).unwrap_or(""),
                args.named_or("style", 1),
            ),
        };
        Self {
            items: Self::parse_items(items),
            style: style
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_LIST_STYLE)
                .to_string(),
        }
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Figure ids
// ---------------------------------------------------------------------------

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_ID_LEN: usize = 9;

/// Source of `figure` element ids for one build.
#[derive(Debug)]
pub struct FigureIds {
    mode: FigureIdMode,
    next: AtomicU64,
}

impl FigureIds {
    pub fn new(mode: FigureIdMode) -> Self {
        Self {
            mode,
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> String {
        match self.mode {
            FigureIdMode::Sequential => {
                format!("figure-{}", self.next.fetch_add(1, Ordering::Relaxed))
            }
            FigureIdMode::Random => {
                let mut rng = rand::thread_rng();
                let suffix: String = (0..RANDOM_ID_LEN)
                    .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
                    .collect();
                format!("figure-{}", suffix)
            }
        }
    }
}

impl Default for FigureIds {
    fn default() -> Self {
        Self::new(FigureIdMode::default())
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// State shared by the shortcodes of one build.
#[derive(Debug, Default)]
pub struct ShortcodeContext {
    pub figure_ids: FigureIds,
}

impl ShortcodeContext {
    pub fn new(mode: FigureIdMode) -> Self {
        Self {
            figure_ids: FigureIds::new(mode),
        }
    }
}

/// Build a `Shortcodes` instance with all built-in shortcodes registered.
pub fn register_shortcodes(ctx: Arc<ShortcodeContext>) -> Shortcodes {
    let mut shortcodes = Shortcodes::new();

    shortcodes.register(CALLOUT, |args: &ShortcodeArgs| {
        render_callout(&Callout::from_args(args))
    });

    // Code is shown exactly as written, template braces included
    shortcodes.register_raw(CODE_BLOCK, |args: &ShortcodeArgs| {
        render_code_block(&CodeBlock::from_args(args))
    });

    {
        let c = ctx.clone();
        shortcodes.register(FIGURE, move |args: &ShortcodeArgs| {
            render_figure(&Figure::from_args(args), &c.figure_ids)
        });
    }

    shortcodes.register(STYLIZED_LIST, |args: &ShortcodeArgs| {
        render_stylized_list(&StylizedList::from_args(args))
    });

    shortcodes.register(RESOURCE_LINKS, |args: &ShortcodeArgs| {
        render_resource_links(&ResourceLink::list_from_args(args))
    });

    shortcodes.register(CONTENT_FOOTER, |args: &ShortcodeArgs| {
        let (prev, next) = NavLink::pair_from_args(args);
        render_footer_nav(prev.as_ref(), next.as_ref())
    });

    shortcodes
}

// ---------------------------------------------------------------------------
// Shortcode renderers
// ---------------------------------------------------------------------------

/// Labeled callout card wrapping trusted content.
pub fn render_callout(callout: &Callout) -> String {
    format!(
        "<div class=\"aha-card-container\">\n\
         \x20 <div class=\"aha-card-label-wrapper\">\n\
         \x20   {}\n\
         \x20 </div>\n\
         \x20 <div class=\"aha-card-content\">\n\
         \x20   {}\n\
         \x20 </div>\n\
         </div>\n",
        callout.label, callout.content
    )
}

/// Escape `\`, `` ` `` and `$` with a backslash, for embedding in the
/// single-quoted clipboard string of the copy button.
pub fn escape_for_clipboard(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for ch in code.chars() {
        if matches!(ch, '\\' | '`' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Code listing: language header, copy button, and the code shown verbatim.
pub fn render_code_block(block: &CodeBlock) -> String {
    let label = if block.language.is_empty() {
        "code"
    } else {
        block.language.as_str()
    };
    format!(
        "<div class=\"code-block-container\">\n\
         \x20 <div class=\"code-block-header\">\n\
         \x20   <span class=\"code-block-language\">{label}</span>\n\
         \x20   <button\n\
         \x20     class=\"code-block-copy\"\n\
         \x20     onclick=\"navigator.clipboard.writeText('{escaped}');\n\
         \x20       const btn = this;\n\
         \x20       btn.textContent = 'Copied!';\n\
         \x20       setTimeout(() => {{ btn.textContent = 'Copy'; }}, 2000);\"\n\
         \x20   >\n\
         \x20     Copy\n\
         \x20   </button>\n\
         \x20 </div>\n\
         \x20 <pre><code class=\"language-{language}\">{code}</code></pre>\n\
         </div>\n",
        label = label,
        escaped = escape_for_clipboard(&block.code),
        language = block.language,
        code = block.code,
    )
}

/// Figure with lazy image and optional caption.
pub fn render_figure(figure: &Figure, ids: &FigureIds) -> String {
    let id = figure.id.clone().unwrap_or_else(|| ids.next_id());
    let mut html = format!(
        "<figure id=\"{}\" class=\"figure\">\n\
         \x20 <img\n\
         \x20   src=\"{}\"\n\
         \x20   alt=\"{}\"\n\
         \x20   loading=\"lazy\"\n\
         \x20   decoding=\"async\"\n\
         \x20   class=\"figure-image\"\n\
         \x20 >\n",
        id, figure.src, figure.alt
    );
    if !figure.caption.is_empty() {
        html.push_str(&format!(
            "  <figcaption class=\"figure-caption\">{}</figcaption>\n",
            figure.caption
        ));
    }
    html.push_str("</figure>\n");
    html
}

/// One-row table of link columns; nothing at all for an empty list.
pub fn render_resource_links(links: &[ResourceLink]) -> String {
    if links.is_empty() {
        return String::new();
    }

    let mut html = String::from(
        "<div class=\"resource-links\">\n  <table class=\"resource-links-table\">\n    <tr>\n",
    );
    for link in links {
        html.push_str(&format!(
            "      <td class=\"resource-links-cell\"><a href=\"{}\" class=\"resource-link\">{}</a></td>\n",
            link.url, link.title
        ));
    }
    html.push_str("    </tr>\n  </table>\n</div>\n");
    html
}

/// Previous/next navigation; a missing side is an empty `<div></div>`.
pub fn render_footer_nav(prev: Option<&NavLink>, next: Option<&NavLink>) -> String {
    format!(
        "<nav class=\"content-footer-nav\">\n  {}\n  {}\n</nav>\n",
        nav_side(prev, "prev", "Previous"),
        nav_side(next, "next", "Next")
    )
}

fn nav_side(link: Option<&NavLink>, side: &str, label: &str) -> String {
    match link {
        Some(link) => format!(
            "<a href=\"{}\" class=\"content-nav-link content-nav-{}\">\n\
             \x20   <span class=\"content-nav-label\">{}</span>\n\
             \x20   <span class=\"content-nav-title\">{}</span>\n\
             \x20 </a>",
            link.url, side, label, link.title
        ),
        None => "<div></div>".to_string(),
    }
}

/// Decorated list; nothing at all when there are no items.
pub fn render_stylized_list(list: &StylizedList) -> String {
    if list.items.is_empty() {
        return String::new();
    }

    let mut html = format!(
        "<ul class=\"stylized-list stylized-list-{}\">\n",
        list.style
    );
    for item in &list.items {
        html.push_str(&format!("  <li class=\"stylized-list-item\">{}</li>\n", item));
    }
    html.push_str("</ul>\n");
    html
}
