//! Manifest linting - static analysis of service manifest files.
//!
//! Validates manifest files for:
//! - JSON syntax and structure errors (E001)
//! - Schemas that fail to build or clash by type name (E002)
//! - Routes that fail to register (E003)
//! - References to unregistered schemas (E004)
//! - Routes registered away from their conventional path (W001)
//! - A missing service name (W002)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ConventionConfig;
use crate::error::ConventionError;
use crate::health::HealthConvention;
use crate::loader::load_manifest;
use crate::manifest::{ConventionKind, Manifest};
use crate::routing::RouteTable;
use crate::schema::SchemaRegistry;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/routes/1/path")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_manifest_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Collects diagnostics for one file.
struct Report<'a> {
    file: &'a Path,
    diagnostics: Vec<Diagnostic>,
}

impl Report<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }

    fn error(&mut self, code: &str, path: String, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: String, message: String) {
        self.push(Severity::Warning, code, path, message);
    }
}

/// Lint a single manifest file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut report = Report {
        file,
        diagnostics: Vec::new(),
    };

    match load_manifest(file) {
        Ok(manifest) => lint_manifest(&manifest, &mut report),
        Err(e) => report.error("E001", "/".to_string(), format!("syntax error: {}", e)),
    }

    let diagnostics = report.diagnostics;
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

fn lint_manifest(manifest: &Manifest, report: &mut Report<'_>) {
    if manifest.service.name == ConventionConfig::default().name {
        report.warning(
            "W002",
            "/service/name".to_string(),
            format!(
                "service name not set, defaulting to \"{}\"",
                manifest.service.name
            ),
        );
    }

    let registry = check_schemas(manifest, report);
    check_routes(manifest, &registry, report);
}

/// Build every schema on its own so one bad schema doesn't hide the rest.
fn check_schemas(manifest: &Manifest, report: &mut Report<'_>) -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for (i, spec) in manifest.schemas.iter().enumerate() {
        let built = spec
            .to_schema()
            .and_then(|schema| registry.register(schema));
        if let Err(e) = built {
            report.error("E002", format!("/schemas/{}", i), e.to_string());
        }
    }

    for (i, spec) in manifest.schemas.iter().enumerate() {
        for (j, field) in spec.fields.iter().enumerate() {
            for reference in field.field_type.references() {
                if !registry.contains(reference) {
                    report.error(
                        "E004",
                        format!("/schemas/{}/fields/{}", i, j),
                        unresolved(reference),
                    );
                }
            }
        }
    }

    registry
}

fn check_routes(manifest: &Manifest, registry: &SchemaRegistry, report: &mut Report<'_>) {
    let prefix = manifest.service.base_path.as_str();
    let mut routes = RouteTable::new();

    for (i, convention) in manifest.conventions.iter().enumerate() {
        let registered = match convention {
            ConventionKind::Health => HealthConvention::register(&mut routes, prefix).map(|_| ()),
            ConventionKind::Discovery => manifest.discovery().register(&mut routes).map(|_| ()),
        };
        if let Err(e) = registered {
            report.error("E003", format!("/conventions/{}", i), e.to_string());
        }
    }

    for (i, spec) in manifest.routes.iter().enumerate() {
        if let Err(e) = spec.register(&mut routes, prefix) {
            report.error("E003", format!("/routes/{}", i), e.to_string());
            continue;
        }

        if let Some(path) = &spec.path {
            if let Ok(conventional) = spec.namespace(prefix).path_for(spec.operation) {
                if *path != conventional {
                    report.warning(
                        "W001",
                        format!("/routes/{}/path", i),
                        format!(
                            "path {} differs from conventional path {}",
                            path, conventional
                        ),
                    );
                }
            }
        }

        for (key, schema) in [
            ("request_schema", &spec.request_schema),
            ("response_schema", &spec.response_schema),
        ] {
            if let Some(name) = schema {
                if !registry.contains(name) {
                    report.error("E004", format!("/routes/{}/{}", i, key), unresolved(name));
                }
            }
        }
    }
}

fn unresolved(name: &str) -> String {
    ConventionError::UnknownSchema {
        name: name.to_string(),
    }
    .to_string()
}

/// Collect all .json files in a path (file or directory).
fn collect_manifest_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    #[test]
    fn lint_valid_manifest() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "conventions": ["health"],
            "schemas": [{
                "name": "person_schema",
                "fields": [{ "name": "name", "type": "string", "required": true }]
            }],
            "routes": [
                { "operation": "search", "subject": "person", "response_schema": "person_schema" },
                { "operation": "retrieve", "subject": "person", "path": "/api/persons/{person_id}" }
            ]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_str("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_unknown_operation_is_structure_error() {
        let result = lint_str(
            r#"{"service": {"name": "x"}, "routes": [{"operation": "frobnicate", "subject": "foo"}]}"#,
        );
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_bad_association() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "schemas": [{
                "name": "person_schema",
                "fields": [{ "name": "name", "type": "string" }],
                "associated": [{ "name": "Summary", "fields": ["missing"] }]
            }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.code, "E002");
        assert_eq!(diagnostic.path, "/schemas/0");
    }

    #[test]
    fn lint_duplicate_schema() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "schemas": [
                { "name": "person_schema", "fields": [{ "name": "a", "type": "string" }] },
                { "name": "Person", "fields": [{ "name": "b", "type": "string" }] }
            ]
        }"#,
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E002" && d.path == "/schemas/1"));
    }

    #[test]
    fn lint_unknown_nested_schema() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "schemas": [{
                "name": "person_schema",
                "fields": [
                    { "name": "name", "type": "string" },
                    { "name": "friends", "type": "list", "items": { "type": "nested", "schema": "friend_schema" } }
                ]
            }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.code, "E004");
        assert_eq!(diagnostic.path, "/schemas/0/fields/1");
    }

    #[test]
    fn lint_self_reference_resolves() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "schemas": [{
                "name": "recursive_schema",
                "fields": [{ "name": "children", "type": "list", "items": { "type": "nested", "schema": "recursive_schema" } }]
            }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_unknown_route_schema() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "routes": [{ "operation": "create", "subject": "person", "request_schema": "new_person_schema" }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E004");
        assert_eq!(result.diagnostics[0].path, "/routes/0/request_schema");
    }

    #[test]
    fn lint_duplicate_route() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "routes": [
                { "operation": "search", "subject": "person" },
                { "operation": "search", "subject": "person", "path": "/api/people" }
            ]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E003");
        assert_eq!(result.diagnostics[0].path, "/routes/1");
    }

    #[test]
    fn lint_non_conventional_path_warning() {
        let result = lint_str(
            r#"{
            "service": { "name": "example" },
            "routes": [{ "operation": "search", "subject": "person", "path": "/api/people" }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert_eq!(result.diagnostics[0].code, "W001");
        assert_eq!(result.diagnostics[0].path, "/routes/0/path");
    }

    #[test]
    fn lint_missing_service_name_warning() {
        let result = lint_str(r#"{"routes": []}"#);
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W002"));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        let valid_path = dir.path().join("valid.json");
        std::fs::write(&valid_path, r#"{"service": {"name": "example"}}"#).unwrap();

        let invalid_path = dir.path().join("invalid.json");
        std::fs::write(&invalid_path, "{ not json }").unwrap();

        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("manifest.json");
        // Warning only (missing service name)
        std::fs::write(&file_path, r#"{"routes": []}"#).unwrap();

        // Non-strict: warnings don't cause failure
        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        // Strict: warnings cause failure
        let result = lint(&file_path, true);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
