// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::{Context, Result};
use sitegen::{Changes, SiteEnv, Snapshot, WatchSet};

use super::build::{build_command, summary};
use crate::common::SiteContext;

/// Polls the files a build reads and reports what changed since last time.
pub struct Watcher {
    watch: WatchSet,
    snapshot: Snapshot,
}

impl Watcher {
    pub fn new(ctx: &SiteContext) -> Result<Self> {
        let watch = WatchSet::for_site(&ctx.config, &ctx.root, ctx.config_path.as_deref());
        let snapshot = watch.snapshot().context("Failed to scan watched files")?;
        Ok(Self { watch, snapshot })
    }

    /// Files currently watched.
    pub fn file_count(&self) -> usize {
        self.snapshot.len()
    }

    /// Rescan and return the changes since the previous scan.
    pub fn poll(&mut self) -> Result<Changes> {
        let next = self.watch.snapshot().context("Failed to scan watched files")?;
        let changes = sitegen::changed(&self.snapshot, &next);
        self.snapshot = next;
        Ok(changes)
    }
}

/// Build, then rebuild whenever a watched file changes.
///
/// Build failures are reported and the watch continues. Runs until the
/// process is interrupted.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn watch_command(ctx: &SiteContext, env: &SiteEnv, interval: Duration) -> Result<()> {
    rebuild(ctx, env);

    let mut watcher = Watcher::new(ctx)?;
    println!(
        "Watching {} files (every {} ms), press Ctrl-C to stop",
        watcher.file_count(),
        interval.as_millis()
    );

    loop {
        std::thread::sleep(interval);
        let changes = match watcher.poll() {
            Ok(changes) => changes,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                continue;
            }
        };
        if changes.is_empty() {
            continue;
        }

        for path in changes.added.iter().chain(&changes.modified).chain(&changes.removed) {
            let changed = path.display().to_string();
            diagnostics::debug!("changed: {changed}", changed: changed.as_str());
        }
        println!("{} file(s) changed, rebuilding", changes.len());
        rebuild(ctx, env);
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn rebuild(ctx: &SiteContext, env: &SiteEnv) {
    match build_command(ctx, env) {
        Ok(report) => println!("{}", summary(ctx, &report)),
        Err(e) => {
            let message = format!("{:#}", e);
            diagnostics::error!("Build failed: {message}", message: message.as_str());
            eprintln!("Error: {}", message);
        }
    }
}
