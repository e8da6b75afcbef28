// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Process-wide page globals, captured once at startup.

use serde::Serialize;

/// Environment variable holding the analytics API key.
pub const ANALYTICS_KEY_ENV: &str = "POSTHOG_API_KEY";
/// Environment variable holding the runtime mode.
pub const MODE_ENV: &str = "NODE_ENV";

/// Globals injected into every rendered page.
///
/// Built once (usually via [`SiteEnv::from_env`]) and passed down to the
/// layouts; nothing else in the crate reads the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteEnv {
    /// Analytics API key; empty disables the analytics snippet
    pub analytics_api_key: String,
    /// Runtime mode, `development` unless set
    pub mode: String,
}

impl Default for SiteEnv {
    fn default() -> Self {
        Self {
            analytics_api_key: String::new(),
            mode: "development".to_string(),
        }
    }
}

impl SiteEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            analytics_api_key: non_empty(ANALYTICS_KEY_ENV).unwrap_or(defaults.analytics_api_key),
            mode: non_empty(MODE_ENV).unwrap_or(defaults.mode),
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode == "production"
    }

    /// Analytics runs only in production builds that carry a key.
    pub fn analytics_enabled(&self) -> bool {
        self.is_production() && !self.analytics_api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let env = SiteEnv::from_lookup(|_| None);
        assert_eq!(env, SiteEnv::default());
        assert_eq!(env.mode, "development");
        assert!(!env.analytics_enabled());
    }

    #[test]
    fn test_empty_values_fall_back() {
        let env = SiteEnv::from_lookup(|_| Some(String::new()));
        assert_eq!(env.mode, "development");
    }

    #[test]
    fn test_production_with_key() {
        let vars = HashMap::from([
            (ANALYTICS_KEY_ENV, "phc_123"),
            (MODE_ENV, "production"),
        ]);
        let env = SiteEnv::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert!(env.is_production());
        assert!(env.analytics_enabled());
        assert_eq!(env.analytics_api_key, "phc_123");
    }
}
