//! CLI integration tests for the rest-conventions binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rest-conventions"))
}

// Helper to create a temp manifest or payload file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const MANIFEST: &str = r#"{
    "service": { "name": "example", "version": "v2" },
    "conventions": ["health"],
    "schemas": [
        {
            "name": "person_schema",
            "fields": [
                { "name": "id", "type": "uuid", "dump_only": true },
                { "name": "first_name", "data_key": "firstName", "type": "string", "required": true },
                { "name": "age", "type": "integer" }
            ]
        }
    ],
    "routes": [
        { "operation": "search", "subject": "person", "response_schema": "person_schema" },
        { "operation": "create", "subject": "person", "request_schema": "person_schema", "response_schema": "person_schema" },
        { "operation": "retrieve", "subject": "person", "response_schema": "person_schema" },
        { "operation": "search_for", "subject": "person", "object": "address" }
    ]
}"#;

fn manifest(dir: &TempDir) -> String {
    write_temp_file(dir, "manifest.json", MANIFEST)
        .to_str()
        .unwrap()
        .to_string()
}

mod swagger_command {
    use super::*;

    #[test]
    fn prints_swagger_document() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["swagger", &manifest(&dir)])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""swagger":"2.0""#))
            .stdout(predicate::str::contains(r#""operationId":"search_for_addresses""#))
            .stdout(predicate::str::contains(r##""$ref":"#/definitions/Person""##));
    }

    #[test]
    fn swagger_with_pretty() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["swagger", &manifest(&dir), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn swagger_with_output_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("swagger.json");

        cmd()
            .args([
                "swagger",
                &manifest(&dir),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        let swagger: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(swagger["info"]["title"], "example");
        assert_eq!(swagger["info"]["version"], "v2");
        assert_eq!(swagger["paths"]["/persons"]["post"]["operationId"], "create");
    }

    #[test]
    fn swagger_env_overrides_service_name() {
        let dir = TempDir::new().unwrap();

        cmd()
            .env("CONVENTIONS_NAME", "renamed")
            .args(["swagger", &manifest(&dir)])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""title":"renamed""#));
    }

    #[test]
    fn swagger_file_not_found() {
        cmd()
            .args(["swagger", "/nonexistent/manifest.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn swagger_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_temp_file(&dir, "bad.json", "not json");

        cmd()
            .args(["swagger", path.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn swagger_unknown_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_temp_file(
            &dir,
            "manifest.json",
            r#"{"routes": [{"operation": "create", "subject": "person", "request_schema": "missing_schema"}]}"#,
        );

        cmd()
            .args(["swagger", path.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("missing_schema"));
    }
}

mod routes_command {
    use super::*;

    #[test]
    fn lists_routes() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["routes", &manifest(&dir)])
            .assert()
            .success()
            .stdout(predicate::str::contains("/api/health"))
            .stdout(predicate::str::contains("person.retrieve"))
            .stdout(predicate::str::contains("/api/persons/{person_id}/addresses"));
    }

    #[test]
    fn lists_routes_as_json() {
        let dir = TempDir::new().unwrap();

        let output = cmd()
            .args(["routes", &manifest(&dir), "--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let routes: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(routes.as_array().unwrap().len(), 5);
        assert_eq!(routes[2]["endpoint"], "person.create");
        assert_eq!(routes[2]["method"], "POST");
    }

    #[test]
    fn duplicate_route_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_temp_file(
            &dir,
            "manifest.json",
            r#"{"routes": [
                {"operation": "search", "subject": "person"},
                {"operation": "search", "subject": "person"}
            ]}"#,
        );

        cmd()
            .args(["routes", path.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("person.search"));
    }
}

mod endpoint_command {
    use super::*;

    #[test]
    fn parses_relation_endpoint() {
        cmd()
            .args(["endpoint", "person.search_for.address"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""operation":"search_for""#))
            .stdout(predicate::str::contains(r#""object":"address""#))
            .stdout(predicate::str::contains(
                r#""path":"/api/persons/{person_id}/addresses""#,
            ))
            .stdout(predicate::str::contains(
                r#""operation_name":"search_for_addresses""#,
            ));
    }

    #[test]
    fn parses_with_prefix() {
        cmd()
            .args(["endpoint", "person.retrieve", "--prefix", "/v2"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""path":"/v2/persons/{person_id}""#))
            .stdout(predicate::str::contains(r#""method":"GET""#));
    }

    #[test]
    fn rejects_unknown_operation() {
        cmd()
            .args(["endpoint", "person.frobnicate"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("frobnicate"));
    }

    #[test]
    fn rejects_relation_without_object() {
        cmd()
            .args(["endpoint", "person.search_for"])
            .assert()
            .code(2);
    }
}

mod href_command {
    use super::*;

    #[test]
    fn resolves_instance_href() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["href", &manifest(&dir), "person.retrieve", "--param", "person_id=42"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"href":"http://localhost/api/persons/42"}"#,
            ));
    }

    #[test]
    fn resolves_with_query_string_and_root() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args([
                "href",
                &manifest(&dir),
                "person.search",
                "--qs",
                "offset=10",
                "--qs",
                "limit=20",
                "--url-root",
                "https://example.com",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "https://example.com/api/persons?offset=10&limit=20",
            ));
    }

    #[test]
    fn resolves_templated_href() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["href", &manifest(&dir), "person.retrieve", "--allow-templates"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"href":"http://localhost/api/persons/{person_id}","templated":true}"#,
            ));
    }

    #[test]
    fn missing_parameter_fails() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["href", &manifest(&dir), "person.retrieve"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("person_id"));
    }

    #[test]
    fn unregistered_endpoint_fails() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["href", &manifest(&dir), "person.delete"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("person.delete"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_payload() {
        let dir = TempDir::new().unwrap();
        let payload = write_temp_file(&dir, "payload.json", r#"{"firstName": "Alice", "age": 30}"#);

        cmd()
            .args(["validate", &manifest(&dir), "Person", payload.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload() {
        let dir = TempDir::new().unwrap();
        let payload = write_temp_file(&dir, "payload.json", r#"{"first_name": "Alice"}"#);

        cmd()
            .args([
                "validate",
                &manifest(&dir),
                "person_schema",
                payload.to_str().unwrap(),
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"));
    }

    #[test]
    fn invalid_payload_json_output() {
        let dir = TempDir::new().unwrap();
        let payload = write_temp_file(&dir, "payload.json", r#"{"firstName": "Alice", "age": "old"}"#);

        cmd()
            .args([
                "validate",
                &manifest(&dir),
                "Person",
                payload.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains(r#""path":"/age""#));
    }

    #[test]
    fn unknown_schema() {
        let dir = TempDir::new().unwrap();
        let payload = write_temp_file(&dir, "payload.json", "{}");

        cmd()
            .args(["validate", &manifest(&dir), "Address", payload.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Address"));
    }

    #[test]
    fn payload_not_found() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args([
                "validate",
                &manifest(&dir),
                "Person",
                "/nonexistent/payload.json",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("loading payload"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_valid_manifest() {
        let dir = TempDir::new().unwrap();
        manifest(&dir);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn lint_broken_manifest() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "manifest.json",
            r#"{
                "service": { "name": "example" },
                "schemas": [{
                    "name": "person_schema",
                    "fields": [{ "name": "address", "type": "nested", "schema": "address_schema" }]
                }]
            }"#,
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E004"));
    }

    #[test]
    fn lint_json_format() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "bad.json", "{ not json }");

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""code":"E001""#));
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "manifest.json", r#"{"routes": []}"#);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("W002"));
    }

    #[test]
    fn lint_path_not_found() {
        cmd()
            .args(["lint", "/nonexistent/dir"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("path not found"));
    }
}
