// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Change detection for incremental rebuilds.
//!
//! A [`WatchSet`] lists the paths a build reads; a [`Snapshot`] records their
//! modification times. Comparing two snapshots tells the caller whether to
//! rebuild.

use crate::config::SiteConfig;
use crate::error::{Result, SiteError};
use crate::walk::{is_hidden, normalize, relative_to, walk_files};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Modification time of every watched file.
pub type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Paths that feed a build.
#[derive(Debug, Clone)]
pub struct WatchSet {
    targets: Vec<PathBuf>,
    /// The output tree is never watched
    exclude: PathBuf,
}

/// Difference between two snapshots.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

impl WatchSet {
    /// Input directory, includes, partials, passthrough sources, the config
    /// file and the extra `watch` targets, all relative to `root`.
    pub fn for_site(config: &SiteConfig, root: &Path, config_path: Option<&Path>) -> Self {
        let mut targets: Vec<PathBuf> = Vec::new();
        let mut add = |p: &str| {
            let path = normalize(&root.join(p));
            if !targets.contains(&path) {
                targets.push(path);
            }
        };

        add(&config.dir.input);
        add(&config.dir.includes);
        config.partials.values().for_each(|p| add(p));
        config.passthrough.keys().for_each(|p| add(p));
        config.watch.iter().for_each(|p| add(p));

        if let Some(cfg) = config_path {
            let cfg = normalize(cfg);
            if !targets.contains(&cfg) {
                targets.push(cfg);
            }
        }

        Self {
            targets,
            exclude: normalize(&root.join(&config.dir.output)),
        }
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Record modification times of all watched files.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut snap = Snapshot::new();
        for target in &self.targets {
            let files = if target.is_file() {
                vec![target.clone()]
            } else {
                walk_files(target, "**/*")?
            };
            for file in files {
                let file = normalize(&file);
                let rel = relative_to(&file, target);
                if file.starts_with(&self.exclude) || is_hidden(rel) {
                    continue;
                }
                let modified = std::fs::metadata(&file)
                    .and_then(|m| m.modified())
                    .map_err(|e| SiteError::io(&file, e))?;
                snap.insert(file, modified);
            }
        }
        Ok(snap)
    }
}

/// Compare two snapshots.
pub fn changed(old: &Snapshot, new: &Snapshot) -> Changes {
    let mut changes = Changes::default();
    for (path, time) in new {
        match old.get(path) {
            None => changes.added.push(path.clone()),
            Some(prev) if prev != time => changes.modified.push(path.clone()),
            Some(_) => {}
        }
    }
    changes.removed = old
        .keys()
        .filter(|p| !new.contains_key(*p))
        .cloned()
        .collect();
    changes
}
