// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use sitegen::{BuildReport, SiteEnv};

use crate::common::SiteContext;

/// Build the whole site once.
pub fn build_command(ctx: &SiteContext, env: &SiteEnv) -> Result<BuildReport> {
    diagnostics::debug!(
        "Building in {mode} mode, analytics {analytics}",
        mode: env.mode.as_str(),
        analytics: env.analytics_enabled()
    );
    sitegen::generate_site(&ctx.config, env, &ctx.root)
        .with_context(|| format!("Failed to build site in {}", ctx.root.display()))
}

/// One-line summary printed after a build.
pub fn summary(ctx: &SiteContext, report: &BuildReport) -> String {
    format!(
        "Wrote {} pages and copied {} files to {}",
        report.pages.len(),
        report.copied,
        ctx.output_dir().display()
    )
}
