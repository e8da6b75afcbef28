// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use sitegen::SiteConfig;

/// Config file looked up under the project root when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "site.yaml";

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    /// Path to site.yaml (default: <root>/site.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root; config-relative paths resolve against it
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Override `dir.output` from the config
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Resolved project: root, loaded config and where it came from.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub root: PathBuf,
    pub config: SiteConfig,
    /// `None` when the stock configuration is in use
    pub config_path: Option<PathBuf>,
}

impl SiteContext {
    /// Load the project described by `args`.
    ///
    /// An explicit `--config` must exist. Without it, `<root>/site.yaml` is
    /// used when present and the stock configuration otherwise.
    pub fn load(args: &SiteArgs) -> Result<Self> {
        let root = args.root.clone();
        let (mut config, config_path) = match &args.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => {
                let path = root.join(DEFAULT_CONFIG);
                if path.is_file() {
                    (load_config(&path)?, Some(path))
                } else {
                    let title = default_title(&root);
                    diagnostics::info!(
                        "No {file} found, using stock configuration for {title}",
                        file: DEFAULT_CONFIG,
                        title: title.as_str()
                    );
                    (SiteConfig::default_for(&title), None)
                }
            }
        };

        if let Some(output) = &args.output {
            config.dir.output = output.clone();
            config.validate().context("Invalid --output")?;
        }

        Ok(Self {
            root,
            config,
            config_path,
        })
    }

    /// Absolute-or-root-relative output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.dir.output)
    }
}

fn load_config(path: &Path) -> Result<SiteConfig> {
    SiteConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Site title derived from the root directory name.
fn default_title(root: &Path) -> String {
    std::fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Site".to_string())
}

/// Load `.env` from the working directory or one of its parents.
///
/// A missing file is fine; unreadable or malformed ones are reported.
pub fn load_dotenv() -> std::result::Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::dotenv().map(|_| ()))
}

/// Load the env file at `path`, tolerating its absence.
pub fn load_dotenv_from(path: &Path) -> std::result::Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::from_path(path))
}

fn ignore_missing(
    result: std::result::Result<(), dotenvy::Error>,
) -> std::result::Result<(), dotenvy::Error> {
    match result {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_config_uses_stock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = SiteArgs {
            root: dir.path().to_path_buf(),
            ..SiteArgs::default()
        };
        let ctx = SiteContext::load(&args).expect("load");
        assert!(ctx.config_path.is_none());
        assert_eq!(ctx.config.passthrough.get("src/css").map(String::as_str), Some("css"));
    }

    #[test]
    fn test_output_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("site.yaml"), "site:\n  title: Book\n").expect("write");
        let args = SiteArgs {
            root: dir.path().to_path_buf(),
            output: Some("public".to_string()),
            ..SiteArgs::default()
        };
        let ctx = SiteContext::load(&args).expect("load");
        assert_eq!(ctx.config.site.title, "Book");
        assert_eq!(ctx.output_dir(), dir.path().join("public"));
        assert_eq!(ctx.config_path, Some(dir.path().join("site.yaml")));
    }

    #[test]
    fn test_dotenv_missing_file_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        load_dotenv_from(&dir.path().join(".env")).expect("missing .env is fine");
    }

    #[test]
    fn test_dotenv_malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "POSTHOG_API_KEY phc_missing_equals\n").expect("write");
        let err = load_dotenv_from(&path).expect_err("malformed .env");
        assert!(!err.not_found());
    }

    #[test]
    fn test_dotenv_loads_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "SITEGEN_DOTENV_TEST_MODE=production\n").expect("write");
        load_dotenv_from(&path).expect("valid .env");
        assert_eq!(
            std::env::var("SITEGEN_DOTENV_TEST_MODE").as_deref(),
            Ok("production")
        );
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = SiteArgs {
            config: Some(dir.path().join("nope.yaml")),
            root: dir.path().to_path_buf(),
            output: None,
        };
        let err = SiteContext::load(&args).expect_err("missing config");
        assert!(err.to_string().contains("nope.yaml"));
    }
}
