//! REST Conventions CLI
//!
//! Command-line interface for inspecting service manifests: Swagger output,
//! route listings, endpoint parsing, href resolution, payload validation and linting.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rest_conventions::{
    lint, load_json, load_manifest_auto, operation_name, ConventionError, FileStatus, Link,
    LinkOptions, Manifest, Namespace, Params, Service, Severity, ValidateError,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rest-conventions")]
#[command(about = "Inspect REST convention manifests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Swagger 2.0 document for a manifest
    Swagger {
        /// Manifest source: file path or URL (http:// or https://)
        manifest: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List registered routes
    Routes {
        /// Manifest source: file path or URL
        manifest: String,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Parse an endpoint identifier (e.g. person.search_for.address)
    Endpoint {
        endpoint: String,

        /// Path prefix for the conventional path
        #[arg(long, default_value = rest_conventions::DEFAULT_PREFIX)]
        prefix: String,
    },

    /// Resolve an endpoint into an absolute href
    Href {
        /// Manifest source: file path or URL
        manifest: String,

        /// Endpoint identifier (e.g. person.retrieve)
        endpoint: String,

        /// Path parameter as name=value (repeatable)
        #[arg(long = "param", short, value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Query string pair as name=value (repeatable)
        #[arg(long = "qs", value_parser = parse_pair)]
        qs: Vec<(String, String)>,

        /// Scheme and host (defaults to the manifest's url_root)
        #[arg(long)]
        url_root: Option<String>,

        /// Render missing path parameters as URI templates
        #[arg(long)]
        allow_templates: bool,
    },

    /// Validate a payload against a manifest schema
    Validate {
        /// Manifest source: file path or URL
        manifest: String,

        /// Schema identifier or type name (e.g. person_schema or Person)
        schema: String,

        /// Payload file to validate
        payload: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint manifest files for errors (syntax, bad schemas, broken references)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Swagger {
            manifest,
            output,
            pretty,
        } => run_swagger(&manifest, output, pretty),

        Commands::Routes { manifest, format } => run_routes(&manifest, &format),

        Commands::Endpoint { endpoint, prefix } => run_endpoint(&endpoint, &prefix),

        Commands::Href {
            manifest,
            endpoint,
            params,
            qs,
            url_root,
            allow_templates,
        } => run_href(HrefArgs {
            manifest,
            endpoint,
            params: params.into_iter().collect(),
            qs: qs.into_iter().collect(),
            url_root,
            allow_templates,
        }),

        Commands::Validate {
            manifest,
            schema,
            payload,
            json,
        } => run_validate(&manifest, &schema, &payload, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays machine-readable; filter with `RUST_LOG`.
fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got \"{}\"", s))
}

fn load(source: &str) -> Result<Manifest, u8> {
    let mut manifest = load_manifest_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    manifest.service = manifest.service.overlay_env();
    Ok(manifest)
}

fn build(source: &str) -> Result<Service, u8> {
    load(source)?.build().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_swagger(source: &str, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let service = build(source)?;
    let swagger = service.swagger().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&swagger)
    } else {
        serde_json::to_string(&swagger)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_routes(source: &str, format: &str) -> Result<(), u8> {
    let service = build(source)?;

    if format == "json" {
        let routes: Vec<_> = service
            .routes
            .iter()
            .map(|route| {
                json!({
                    "endpoint": route.endpoint,
                    "method": route.method().as_str(),
                    "path": route.path.as_str(),
                    "operation": route.operation,
                })
            })
            .collect();
        println!("{}", json!(routes));
    } else {
        for route in service.routes.iter() {
            println!(
                "{:<7} {:<40} {}",
                route.method().as_str(),
                route.path.as_str(),
                route.endpoint
            );
        }
    }

    Ok(())
}

fn run_endpoint(endpoint: &str, prefix: &str) -> Result<(), u8> {
    let described = Namespace::parse_endpoint(endpoint).and_then(|(operation, ns)| {
        let ns = ns.with_prefix(prefix);
        Ok(json!({
            "operation": operation,
            "subject": ns.subject(),
            "object": ns.object(),
            "method": operation.method().as_str(),
            "path": ns.path_for(operation)?,
            "operation_name": operation_name(operation, &ns)?,
        }))
    });

    match described {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

struct HrefArgs {
    manifest: String,
    endpoint: String,
    params: Params,
    qs: Params,
    url_root: Option<String>,
    allow_templates: bool,
}

fn run_href(args: HrefArgs) -> Result<(), u8> {
    let service = build(&args.manifest)?;

    let link = service
        .request_context(args.url_root.as_deref())
        .and_then(|ctx| {
            let route = service.routes.get(&args.endpoint).ok_or_else(|| {
                ConventionError::RouteNotRegistered {
                    endpoint: args.endpoint.clone(),
                }
            })?;
            let mut options = LinkOptions::new().allow_templates(args.allow_templates);
            if !args.qs.is_empty() {
                options = options.qs(args.qs.clone());
            }
            Link::for_with(&ctx, route.operation, &route.namespace, &args.params, &options)
        })
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    println!("{}", link.to_dict());
    Ok(())
}

fn run_validate(source: &str, schema: &str, payload_path: &Path, json_output: bool) -> Result<(), u8> {
    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let service = build(source)?;

    match service.validate(schema, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);

    if format == "json" {
        println!("{}", json!(result));
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
