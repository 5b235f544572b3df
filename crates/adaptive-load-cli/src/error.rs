//! Error type for the command-line driver.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("cannot read session spec file {path}: {source}")]
    ReadSessionSpec {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session spec file {path} has no recognized extension (expected .json, .yaml, or .yml)")]
    UnknownSpecFormat { path: String },

    #[error("invalid JSON session spec in {path}: {source}")]
    InvalidJsonSpec {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML session spec in {path}: {source}")]
    InvalidYamlSpec {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot connect to load generator endpoint {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("cannot serialize session output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
}
