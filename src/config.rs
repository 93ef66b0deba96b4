//! Service-level configuration for the conventions.
//!
//! Values come from the manifest's `service` block (every field optional) and
//! can be overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CONVENTIONS_NAME` | `name` |
//! | `CONVENTIONS_VERSION` | `version` |
//! | `CONVENTIONS_BASE_PATH` | `base_path` |
//! | `CONVENTIONS_URL_ROOT` | `url_root` |
//! | `CONVENTIONS_INCLUDE_BUILD_INFO` | `include_build_info` |
//! | `BUILD_NUM` | `build_num` |
//! | `SHA1` | `sha1` |

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::namespace::DEFAULT_PREFIX;

/// Service configuration shared by Swagger, health, and discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionConfig {
    /// Service name, reported by health and used as the Swagger title.
    pub name: String,
    /// API version reported in the Swagger `info` block.
    pub version: String,
    /// Path prefix shared by all routes (Swagger `basePath`).
    pub base_path: String,
    /// Scheme and host used to expand hrefs outside a live request.
    pub url_root: String,
    /// Report `build_num` and `sha1` as health checks.
    pub include_build_info: bool,
    pub build_num: Option<String>,
    pub sha1: Option<String>,
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            version: "v1".to_string(),
            base_path: DEFAULT_PREFIX.to_string(),
            url_root: "http://localhost/".to_string(),
            include_build_info: true,
            build_num: None,
            sha1: None,
        }
    }
}

impl ConventionConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Apply environment variable overrides on top of `self`.
    pub fn overlay_env(self) -> Self {
        self.overlay_with(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment, in production).
    pub fn overlay_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup("CONVENTIONS_NAME") {
            self.name = name;
        }
        if let Some(version) = lookup("CONVENTIONS_VERSION") {
            self.version = version;
        }
        if let Some(base_path) = lookup("CONVENTIONS_BASE_PATH") {
            self.base_path = base_path.trim_end_matches('/').to_string();
        }
        if let Some(url_root) = lookup("CONVENTIONS_URL_ROOT") {
            self.url_root = url_root;
        }
        if let Some(raw) = lookup("CONVENTIONS_INCLUDE_BUILD_INFO") {
            match parse_flag(&raw) {
                Some(flag) => self.include_build_info = flag,
                None => warn!(
                    value = %raw,
                    "Ignoring unrecognized CONVENTIONS_INCLUDE_BUILD_INFO"
                ),
            }
        }
        if let Some(build_num) = lookup("BUILD_NUM") {
            self.build_num = Some(build_num);
        }
        if let Some(sha1) = lookup("SHA1") {
            self.sha1 = Some(sha1);
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
