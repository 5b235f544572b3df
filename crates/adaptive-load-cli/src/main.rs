//! `adaptive-load` — drives one adaptive load session against a load
//! generator reachable over gRPC, from a session spec file on disk.

mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use adaptive_load_core::{Code, SessionSpec};
use adaptive_load_dispatch::TonicBenchmarkDispatchClient;
use adaptive_load_orchestrator::{run_adaptive_load_session, SystemClock};
use adaptive_load_registry::Registry;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::{error, info};

use crate::error::CliError;

/// Run one adaptive load session against a load generator.
#[derive(Parser)]
#[command(name = "adaptive-load")]
#[command(about = "Runs one adaptive load session against a gRPC load generator")]
#[command(version)]
struct Cli {
    /// Path to the session spec, as JSON (.json) or YAML (.yaml/.yml).
    #[arg(long)]
    session: PathBuf,

    /// Load generator endpoint, e.g. `http://127.0.0.1:9090`.
    #[arg(long)]
    endpoint: String,
}

fn read_session_spec(path: &Path) -> Result<SessionSpec, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadSessionSpec {
        path: path.display().to_string(),
        source,
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|source| CliError::InvalidJsonSpec {
            path: path.display().to_string(),
            source,
        }),
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&contents).map_err(|source| CliError::InvalidYamlSpec {
                path: path.display().to_string(),
                source,
            })
        }
        _ => Err(CliError::UnknownSpecFormat {
            path: path.display().to_string(),
        }),
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    adaptive_load_scoring::register_all(&mut registry);
    adaptive_load_stepcontrol::register_all(&mut registry);
    registry
}

/// Maps a terminal status code to a process exit code. Kept as a plain
/// `u8` (rather than `std::process::ExitCode`, which has no `PartialEq`)
/// so the mapping itself stays unit-testable.
fn exit_code_for(code: Code) -> u8 {
    match code {
        Code::Ok => 0,
        Code::InvalidArgument | Code::NotFound => 2,
        Code::DeadlineExceeded => 3,
        Code::FailedPrecondition => 4,
        Code::Cancelled => 5,
        Code::Unavailable => 6,
        Code::Internal | Code::Unknown => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let session = match read_session_spec(&cli.session) {
        Ok(session) => session,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    let channel = match Channel::from_shared(cli.endpoint.clone()) {
        Ok(endpoint) => match endpoint.connect().await {
            Ok(channel) => channel,
            Err(source) => {
                let err = CliError::Connect {
                    endpoint: cli.endpoint.clone(),
                    source,
                };
                error!("{err}");
                return ExitCode::from(6);
            }
        },
        Err(source) => {
            error!("invalid load generator endpoint {}: {source}", cli.endpoint);
            return ExitCode::from(2);
        }
    };

    info!(endpoint = %cli.endpoint, session = %cli.session.display(), "starting adaptive load session");

    let registry = registry();
    let dispatcher = Arc::new(TonicBenchmarkDispatchClient::new(channel));
    let clock = SystemClock;
    let cancellation = CancellationToken::new();

    let shutdown = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, cancelling session");
            shutdown.cancel();
        }
    });

    let output =
        run_adaptive_load_session(session, &registry, dispatcher, &clock, cancellation).await;

    let code = output.status.code();
    match serde_json::to_string_pretty(&output) {
        Ok(rendered) => println!("{rendered}"),
        Err(source) => error!("{}", CliError::SerializeOutput(source)),
    }

    if code != Code::Ok {
        error!("session ended with non-OK status: {}", output.status);
    }

    ExitCode::from(exit_code_for(code))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn reads_json_session_spec_by_extension() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"traffic_template":{{"requests_per_second":0}},"step_controller":{{"plugin_name":"x","config":null}}}}"#
        )
        .unwrap();
        let session = read_session_spec(file.path()).unwrap();
        assert_eq!(session.step_controller.plugin_name, "x");
    }

    #[test]
    fn reads_yaml_session_spec_by_extension() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "traffic_template:\n  requests_per_second: 0\nstep_controller:\n  plugin_name: x\n"
        )
        .unwrap();
        let session = read_session_spec(file.path()).unwrap();
        assert_eq!(session.step_controller.plugin_name, "x");
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = Builder::new().suffix(".toml").tempfile().unwrap();
        let err = read_session_spec(file.path()).unwrap_err();
        assert!(matches!(err, CliError::UnknownSpecFormat { .. }));
    }

    #[test]
    fn exit_code_maps_ok_to_zero() {
        assert_eq!(exit_code_for(Code::Ok), 0);
    }

    #[test]
    fn exit_code_distinguishes_non_ok_codes() {
        assert_ne!(exit_code_for(Code::InvalidArgument), exit_code_for(Code::DeadlineExceeded));
        assert_ne!(exit_code_for(Code::Cancelled), exit_code_for(Code::Unavailable));
    }
}
