//! Manifest loading from various sources.
//!
//! Handles loading service manifests from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;
use crate::manifest::Manifest;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a manifest from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't a valid manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest, LoadError> {
    let content = read_file(path)?;
    debug!(path = %path.display(), "Loaded manifest");
    load_manifest_str(&content)
}

/// Load an arbitrary JSON document (e.g. a payload to validate).
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a manifest from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't a valid manifest.
pub fn load_manifest_str(content: &str) -> Result<Manifest, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a manifest from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or returns an
/// error status, or `LoadError::InvalidJson` if the body isn't a valid manifest.
#[cfg(feature = "remote")]
pub fn load_manifest_url(url: &str) -> Result<Manifest, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network)?;

    debug!(url, bytes = body.len(), "Fetched manifest");
    load_manifest_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a manifest from a file path or URL.
pub fn load_manifest_auto(source: &str) -> Result<Manifest, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_manifest_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_manifest(Path::new(source))
    }
}
