//! Health check convention.
//!
//! Reports service liveness as `{"name", "ok", "checks"}`. Each check is a
//! closure producing a message; a failing check flips `ok` and the status to 503.
//!
//! # Example
//!
//! ```
//! use rest_conventions::{ConventionConfig, HealthConvention};
//!
//! let config = ConventionConfig {
//!     name: "example".into(),
//!     include_build_info: false,
//!     ..ConventionConfig::default()
//! };
//! let mut health = HealthConvention::from_config(&config);
//! health.add_check("db", || Ok("connected".to_string()));
//!
//! let report = health.check();
//! assert!(report.ok);
//! assert_eq!(report.status_code(), 200);
//! ```

use std::error::Error;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::config::ConventionConfig;
use crate::error::ConventionError;
use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::routing::{Route, RouteTable};

pub type CheckError = Box<dyn Error + Send + Sync>;

type CheckFn = Box<dyn Fn() -> Result<String, CheckError> + Send + Sync>;

const UNDEFINED: &str = "undefined";

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub message: String,
    pub ok: bool,
}

/// Health response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub name: String,
    pub ok: bool,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_checks"
    )]
    pub checks: Vec<(String, CheckResult)>,
}

impl HealthReport {
    /// 200 when every check passed, 503 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.ok {
            200
        } else {
            503
        }
    }
}

fn serialize_checks<S: Serializer>(
    checks: &[(String, CheckResult)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(checks.len()))?;
    for (name, result) in checks {
        map.serialize_entry(name, result)?;
    }
    map.end()
}

/// Named health checks for a service.
pub struct HealthConvention {
    pub name: String,
    pub include_build_info: bool,
    pub build_num: Option<String>,
    pub sha1: Option<String>,
    checks: Vec<(String, CheckFn)>,
}

impl fmt::Debug for HealthConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthConvention")
            .field("name", &self.name)
            .field("include_build_info", &self.include_build_info)
            .field("build_num", &self.build_num)
            .field("sha1", &self.sha1)
            .field(
                "checks",
                &self.checks.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl HealthConvention {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_build_info: true,
            build_num: None,
            sha1: None,
            checks: Vec::new(),
        }
    }

    pub fn from_config(config: &ConventionConfig) -> Self {
        Self {
            include_build_info: config.include_build_info,
            build_num: config.build_num.clone(),
            sha1: config.sha1.clone(),
            ..Self::new(config.name.clone())
        }
    }

    /// Add a check. A check with the same name replaces the earlier one.
    pub fn add_check<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn() -> Result<String, CheckError> + Send + Sync + 'static,
    {
        let name = name.into();
        let check: CheckFn = Box::new(check);
        match self.checks.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = check,
            None => self.checks.push((name, check)),
        }
    }

    /// Run every check in order; build info comes first when enabled.
    pub fn check(&self) -> HealthReport {
        let mut checks = Vec::new();

        if self.include_build_info {
            for (name, value) in [("build_num", &self.build_num), ("sha1", &self.sha1)] {
                checks.push((
                    name.to_string(),
                    CheckResult {
                        message: value.clone().unwrap_or_else(|| UNDEFINED.to_string()),
                        ok: true,
                    },
                ));
            }
        }

        for (name, check) in &self.checks {
            let result = match check() {
                Ok(message) => CheckResult { message, ok: true },
                Err(error) => {
                    warn!(check = %name, error = %error, "Health check failed");
                    CheckResult {
                        message: error.to_string(),
                        ok: false,
                    }
                }
            };
            checks.push((name.clone(), result));
        }

        HealthReport {
            name: self.name.clone(),
            ok: checks.iter().all(|(_, result)| result.ok),
            checks,
        }
    }

    /// Namespace the health endpoint is registered under.
    pub fn namespace(prefix: &str) -> Namespace {
        Namespace::new("health").with_prefix(prefix)
    }

    /// Register `health.retrieve` at `{prefix}/health`.
    pub fn register<'a>(
        routes: &'a mut RouteTable,
        prefix: &str,
    ) -> Result<&'a Route, ConventionError> {
        let ns = Self::namespace(prefix);
        routes.register(&ns.singleton_path(), Operation::Retrieve, &ns)
    }
}
