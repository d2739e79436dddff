#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Service Client Binary
//!
//! Performs one resilient invocation against a configured service and
//! prints the JSON result.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin service-client -- GET orders /v1/orders/42
//! cargo run --bin service-client -- POST orders /v1/orders '{"qty": 3}'
//! ```
//!
//! # Environment Variables
//!
//! Variables may also come from a `.env` file in the working directory or
//! any ancestor; it is loaded before arguments are parsed.
//!
//! - `SERVICE_CLIENT_CONFIG`: Config file path (default: service-client.yaml)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: service-client)
//! - `RUST_LOG`: Log level (default: info)

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use serde::de::IgnoredAny;
use service_client::application::decode_json;
use service_client::infrastructure::config::{
    ClientConfig, DEFAULT_CONFIG_PATH, load_config_or_default,
};
use service_client::infrastructure::telemetry;
use service_client::observability::{MetricsConfig, init_metrics};
use service_client::{HttpMethod, InvocationRequest, build_client};

#[derive(Debug, Parser)]
#[command(name = "service-client")]
#[command(about = "Call an internal service through retry and circuit breaking", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "SERVICE_CLIENT_CONFIG")]
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// HTTP method: GET, POST, PUT or DELETE.
    #[arg(value_parser = parse_method)]
    method: HttpMethod,

    /// Logical service id.
    service: String,

    /// Path relative to the service base address.
    path: String,

    /// JSON request body (POST/PUT).
    body: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let telemetry_guard = telemetry::init()?;
    tracing::debug!(
        exporting = telemetry_guard.is_exporting(),
        "Telemetry initialized"
    );

    let config = load_config_or_default(Some(&cli.config))?;
    log_config(&config);

    if config.observability.metrics_enabled {
        init_metrics(&MetricsConfig::with_addr(
            config.observability.metrics_socket_addr()?,
        ))?;
    }

    let client = build_client(&config)?;

    if cli.method == HttpMethod::Delete {
        let deleted = client.delete(cli.service.as_str(), &cli.path).await?;
        println!("{}", serde_json::json!({ "deleted": deleted }));
        return Ok(());
    }

    let mut request = InvocationRequest::new(cli.method, cli.service.as_str(), cli.path.as_str());
    if let Some(raw) = cli.body {
        serde_json::from_str::<IgnoredAny>(&raw)?;
        request = request.with_raw_body(raw.into_bytes());
    }

    let response = client
        .send(&request, decode_json::<serde_json::Value>)
        .await;

    for metrics in client.invoker().breakers().all_metrics() {
        tracing::debug!(
            service = %metrics.name,
            state = %metrics.state,
            total_calls = metrics.total_calls,
            total_failures = metrics.total_failures,
            "Circuit breaker summary"
        );
    }

    println!("{}", serde_json::to_string_pretty(&response?)?);
    Ok(())
}

/// Load `.env`, then parse `args`.
///
/// `.env` must be loaded first so its values back the `env` arguments.
fn parse_cli<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    load_dotenv();

    let cli = Cli::try_parse_from(args)?;
    if cli.method == HttpMethod::Delete && cli.body.is_some() {
        return Err(Cli::command().error(
            ErrorKind::ArgumentConflict,
            "DELETE does not take a request body",
        ));
    }

    Ok(cli)
}

fn parse_method(value: &str) -> Result<HttpMethod, String> {
    HttpMethod::parse(value).ok_or_else(|| format!("unsupported method '{value}'"))
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ClientConfig) {
    tracing::info!(
        services = config.services.len(),
        timeout_secs = config.transport.timeout_secs,
        max_retries = config.retry.max_retries,
        failure_threshold = config.circuit_breaker.failure_threshold,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );
    for (service, address) in &config.services {
        tracing::debug!(service = %service, address = %address, "Service registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_from_dotenv_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "SERVICE_CLIENT_CONFIG=from-dotenv.yaml\n",
        )
        .unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let cli = parse_cli(["service-client", "GET", "orders", "/v1"]).unwrap();

        assert_eq!(cli.config, "from-dotenv.yaml");
    }

    #[test]
    fn delete_with_body_is_rejected() {
        let args = ["service-client", "DELETE", "orders", "/v1/orders/1", "{}"];

        let err = parse_cli(args).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn post_with_body_is_accepted() {
        let args = ["service-client", "post", "orders", "/v1", r#"{"qty":3}"#];

        let cli = parse_cli(args).unwrap();

        assert_eq!(cli.method, HttpMethod::Post);
        assert_eq!(cli.body.as_deref(), Some(r#"{"qty":3}"#));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = parse_cli(["service-client", "PATCH", "orders", "/v1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
