// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! # Sitegen: static site generator for a markdown book
//!
//! Markdown pages are expanded through a set of shortcodes (callouts,
//! copyable code blocks, figures, resource links, chapter navigation and
//! stylized lists), rendered with pulldown-cmark and wrapped in Maud
//! layouts.
//!
//! ## Usage
//!
//! ```bash
//! site build --config site.yaml --root ./book
//! ```

pub mod build;
pub mod config;
pub mod env;
pub mod error;
pub mod images;
pub mod layouts;
pub mod markdown;
pub mod passthrough;
pub mod shortcodes;
pub mod walk;
pub mod watch;

pub use build::{BuildReport, discover_pages, generate_site};
pub use config::{FigureIdMode, SiteConfig};
pub use env::SiteEnv;
pub use error::{Result, ShortcodeError, SiteError};
pub use markdown::{Shortcodes, render_page};
pub use shortcodes::{ShortcodeContext, register_shortcodes};
pub use watch::{Changes, Snapshot, WatchSet, changed};
