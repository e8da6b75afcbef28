// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Markdown rendering and shortcode expansion.
//!
//! Shortcodes are `{{ name args /}}` directives (or `{{ name }}…{{ /name }}`
//! blocks) expanded before markdown rendering. Arguments may be named
//! (`label="Note"`) or positional (`"python"`), so authors can write either
//! `{{ figure "/img/a.png" "Alt" "Caption" /}}` or
//! `{{ figure src="/img/a.png" caption="Caption" /}}`.
//!
//! Shortcode output is HTML and must not be re-read as markdown: a code
//! block containing a blank line would otherwise end its HTML block early.
//! [`render_page`] therefore swaps each expansion for a comment placeholder,
//! renders markdown, and puts the fragments back.

use crate::error::ShortcodeError;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html::push_html};
use std::collections::{BTreeMap, HashMap};

// ─── Markdown rendering ──────────────────────────────────────────────────────

const SCRIPT_MARK: &str = "SITEGEN_SCRIPT";
const FRAGMENT_MARK: &str = "SITEGEN_FRAGMENT";

/// Render markdown to HTML.
///
/// GFM tables, strikethrough and task lists are enabled. Headings get `id`
/// anchors. `<script>` blocks are lifted out before parsing so blank lines
/// inside them cannot end the surrounding HTML block.
pub fn render_markdown(content: &str) -> String {
    let (processed, scripts) = extract_scripts(content);

    let options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS | Options::ENABLE_TABLES;
    let events = inject_heading_anchors(Parser::new_ext(&processed, options));

    let mut html = String::with_capacity(content.len() * 2);
    push_html(&mut html, events.into_iter());

    restore_placeholders(&mut html, SCRIPT_MARK, &scripts);
    html
}

/// Expand shortcodes and render the result as markdown.
///
/// `source` names the page in errors and is exposed to shortcodes as the
/// `markdown_path` argument.
pub fn render_page(
    content: &str,
    shortcodes: &Shortcodes,
    source: Option<&str>,
) -> Result<String, ShortcodeError> {
    let mut fragments = Vec::new();
    let shielded = expand(content, shortcodes, source, Some(&mut fragments))?;
    let mut html = render_markdown(&shielded);
    restore_placeholders(&mut html, FRAGMENT_MARK, &fragments);
    Ok(html)
}

/// Lowercase, hyphen-separated slug for heading ids.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    slug
}

/// Rewrite heading start/end events into `<hN id="slug">…</hN>`, adding a
/// `#` anchor link on h2 and below.
fn inject_heading_anchors<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events: Vec<Event<'a>> = Vec::new();
    // Buffered inner events and plain text of the heading being read
    let mut pending: Option<(Vec<Event<'a>>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) if pending.is_none() => {
                pending = Some((Vec::new(), String::new()));
            }
            Event::End(TagEnd::Heading(level)) if pending.is_some() => {
                let Some((inner, text)) = pending.take() else {
                    continue;
                };
                let n = level as usize;
                let slug = slugify(&text);
                if slug.is_empty() {
                    events.push(Event::Html(format!("<h{}>", n).into()));
                } else {
                    events.push(Event::Html(format!("<h{} id=\"{}\">", n, slug).into()));
                }
                events.extend(inner);
                if n >= 2 && !slug.is_empty() {
                    events.push(Event::Html(
                        format!(
                            " <a class=\"anchor\" href=\"#{}\" aria-hidden=\"true\">#</a>",
                            slug
                        )
                        .into(),
                    ));
                }
                events.push(Event::Html(format!("</h{}>\n", n).into()));
            }
            event => match pending.as_mut() {
                Some((inner, text)) => {
                    if let Event::Text(t) | Event::Code(t) = &event {
                        text.push_str(t);
                    }
                    inner.push(event);
                }
                None => events.push(event),
            },
        }
    }

    events
}

/// Replace every `<script …>…</script>` span with a comment placeholder,
/// which pulldown-cmark passes through as a type-2 HTML block.
fn extract_scripts(content: &str) -> (String, Vec<String>) {
    let mut result = String::with_capacity(content.len());
    let mut scripts: Vec<String> = Vec::new();
    let mut remaining = content;

    while let Some(start) = remaining.find("<script") {
        let after = &remaining[start + 7..];
        // "<scripting>" is not a script tag
        if !matches!(after.chars().next(), Some(' ' | '\t' | '\n' | '\r' | '>' | '/')) {
            result.push_str(&remaining[..start + 7]);
            remaining = after;
            continue;
        }

        let Some(end_rel) = remaining[start..].find("</script>") else {
            break;
        };
        let end = start + end_rel + "</script>".len();
        result.push_str(&remaining[..start]);
        result.push_str(&placeholder(SCRIPT_MARK, scripts.len()));
        scripts.push(remaining[start..end].to_string());
        remaining = &remaining[end..];
    }
    result.push_str(remaining);
    (result, scripts)
}

fn placeholder(mark: &str, index: usize) -> String {
    format!("<!-- {}_{} -->", mark, index)
}

/// Put stashed items back in place of their placeholders.
///
/// A placeholder that ended up inside a code span or fenced block was
/// entity-escaped by the renderer; the item is escaped the same way there.
fn restore_placeholders(html: &mut String, mark: &str, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let raw = placeholder(mark, i);
        if let Some(pos) = html.find(&raw) {
            html.replace_range(pos..pos + raw.len(), item);
            continue;
        }
        let escaped = escape_html(&raw);
        if let Some(pos) = html.find(&escaped) {
            html.replace_range(pos..pos + escaped.len(), &escape_html(item));
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

// ─── Shortcodes ──────────────────────────────────────────────────────────────

/// A registered shortcode function.
pub type ShortcodeFn = Box<dyn Fn(&ShortcodeArgs) -> String + Send + Sync>;

struct Registered {
    func: ShortcodeFn,
    /// Block body is passed through without shortcode expansion
    raw_body: bool,
}

/// Registry of named shortcode functions.
#[derive(Default)]
pub struct Shortcodes(BTreeMap<String, Registered>);

impl Shortcodes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&ShortcodeArgs) -> String + Send + Sync + 'static,
    {
        self.insert(name, Box::new(func), false);
    }

    /// Register a block shortcode whose body is handed over verbatim:
    /// inner `{{ ... }}` and `\{{` are left as written.
    pub fn register_raw<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&ShortcodeArgs) -> String + Send + Sync + 'static,
    {
        self.insert(name, Box::new(func), true);
    }

    fn insert(&mut self, name: &str, func: ShortcodeFn, raw_body: bool) {
        self.0
            .insert(name.to_string(), Registered { func, raw_body });
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&Registered> {
        self.0.get(name)
    }
}

/// Arguments of one shortcode invocation.
#[derive(Debug, Default, Clone)]
pub struct ShortcodeArgs {
    named: HashMap<String, String>,
    positional: Vec<String>,
    body: Option<String>,
    markdown_path: String,
}

impl ShortcodeArgs {
    /// Named argument as raw string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Positional argument by index.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Named argument, falling back to a positional slot.
    pub fn named_or(&self, key: &str, index: usize) -> Option<&str> {
        self.get_str(key).or_else(|| self.positional(index))
    }

    /// Expanded body of a block shortcode.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Source page of the invocation, empty if unknown.
    pub fn markdown_path(&self) -> &str {
        &self.markdown_path
    }

    pub fn with_named<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    pub fn with_positional<V: Into<String>>(mut self, value: V) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_body<V: Into<String>>(mut self, body: V) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Expand `{{ name args /}}` shortcodes in a document, inline.
///
/// Supports:
/// - Self-closing: `{{ figure "/img/a.png" /}}`
/// - Named args: `{{ codeblock language="rust" code="fn main() {}" /}}`
/// - Block: `{{ ahamoment label="Note" }}...{{ /ahamoment }}`
/// - Escaped: `\{{ literal }}`
pub fn preprocess_shortcodes(
    content: &str,
    shortcodes: &Shortcodes,
    markdown_path: Option<&str>,
) -> Result<String, ShortcodeError> {
    expand(content, shortcodes, markdown_path, None)
}

/// Expansion core. With a stash, each top-level expansion is stored there
/// and a placeholder is written instead.
fn expand(
    content: &str,
    shortcodes: &Shortcodes,
    markdown_path: Option<&str>,
    mut stash: Option<&mut Vec<String>>,
) -> Result<String, ShortcodeError> {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        if start > 0 && rest.as_bytes()[start - 1] == b'\\' {
            output.push_str(&rest[..start - 1]);
            output.push_str("{{");
            rest = &rest[start + 2..];
            continue;
        }

        output.push_str(&rest[..start]);

        let remaining = &rest[start + 2..];
        // An unbalanced quote falls back to the first "}}" so the argument
        // parser can report it.
        let Some(tag_end) = find_tag_end(remaining).or_else(|| remaining.find("}}")) else {
            output.push_str("{{");
            rest = remaining;
            continue;
        };

        let tag = remaining[..tag_end].trim();
        let (tag, is_self_closing) = match tag.strip_suffix('/') {
            Some(inner) => (inner.trim_end(), true),
            None => (tag, false),
        };

        let (name, args_str) = match tag.find(char::is_whitespace) {
            Some(pos) => (&tag[..pos], tag[pos..].trim()),
            None => (tag, ""),
        };
        if name.is_empty() {
            return Err(ShortcodeError::Empty);
        }
        if name.starts_with('/') {
            return Err(ShortcodeError::UnexpectedClose(name.to_string()));
        }
        if !is_valid_name(name) {
            output.push_str("{{");
            rest = remaining;
            continue;
        }

        let (named, positional) = parse_args(args_str)?;
        let mut args = ShortcodeArgs {
            named,
            positional,
            body: None,
            markdown_path: markdown_path.unwrap_or("").to_string(),
        };

        let registered = shortcodes
            .get(name)
            .ok_or_else(|| ShortcodeError::Unknown(name.to_string()))?;

        let after_tag = &remaining[tag_end + 2..];
        if is_self_closing {
            rest = after_tag;
        } else {
            let (body_end, close_len) =
                find_close(after_tag, name).ok_or_else(|| ShortcodeError::Unclosed(name.to_string()))?;
            let body = &after_tag[..body_end];
            args.body = Some(if registered.raw_body {
                body.to_string()
            } else {
                expand(body, shortcodes, markdown_path, None)?
            });
            rest = &after_tag[body_end + close_len..];
        }

        let rendered = (registered.func)(&args);
        match stash.as_deref_mut() {
            Some(stash) => {
                output.push_str(&placeholder(FRAGMENT_MARK, stash.len()));
                stash.push(rendered);
            }
            None => output.push_str(&rendered),
        }
    }

    output.push_str(rest);
    Ok(output)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Position of the `}}` closing a tag, ignoring braces inside quoted values.
fn find_tag_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

/// Locate `{{ /name }}` (any inner spacing); returns (offset, length).
fn find_close(s: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(rel) = s[from..].find("{{") {
        let open = from + rel;
        let inner_start = open + 2;
        if let Some(end_rel) = s[inner_start..].find("}}") {
            let inner = s[inner_start..inner_start + end_rel].trim();
            if inner.strip_prefix('/').map(str::trim) == Some(name) {
                return Some((open, end_rel + 4));
            }
        }
        from = inner_start;
    }
    None
}

/// Valid shortcode name: `[A-Za-z_][A-Za-z0-9_]+`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() >= 2
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

type ParsedArgs = (HashMap<String, String>, Vec<String>);

/// Parse `key="value"`, `key=value` and positional `"value"` arguments.
///
/// Commas between arguments are accepted and ignored.
fn parse_args(input: &str) -> Result<ParsedArgs, ShortcodeError> {
    let mut named = HashMap::new();
    let mut positional = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        let Some(&ch) = chars.peek() else {
            break;
        };

        if ch == '"' || ch == '\'' {
            chars.next();
            positional.push(read_quoted(&mut chars, ch)?);
            continue;
        }

        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != ',') {
            word.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            positional.push(word);
            continue;
        }

        let value = match chars.peek() {
            Some(&q) if q == '"' || q == '\'' => {
                chars.next();
                read_quoted(&mut chars, q)?
            }
            _ => {
                let mut bare = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ',') {
                    bare.push(c);
                }
                bare
            }
        };
        named.insert(word, value);
    }

    Ok((named, positional))
}

/// Read up to the closing `quote`, resolving backslash escapes.
fn read_quoted<I>(chars: &mut std::iter::Peekable<I>, quote: char) -> Result<String, ShortcodeError>
where
    I: Iterator<Item = char>,
{
    let mut value = String::new();
    loop {
        match chars.next() {
            None => return Err(ShortcodeError::UnclosedQuote),
            Some(c) if c == quote => return Ok(value),
            Some('\\') => match chars.next() {
                Some(esc @ ('"' | '\'' | '\\')) => value.push(esc),
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return Err(ShortcodeError::UnclosedQuote),
            },
            Some(c) => value.push(c),
        }
    }
}
