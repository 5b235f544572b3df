//! A small gRPC-flavored status type shared by every layer of the controller.
//!
//! `spec.md`'s error-handling table (§7) is already a gRPC status-code
//! vocabulary, so this mirrors `tonic::Status`/`tonic::Code` in shape without
//! pulling `tonic` into every crate that only needs to return or inspect a
//! status. `adaptive-load-dispatch` is the single place that converts a real
//! `tonic::Status` into this type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status codes used across the controller, named after the subset of
/// `tonic::Code` that spec.md's error table actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    /// The operation completed successfully.
    Ok,
    /// The caller supplied an invalid argument (bad spec, bad config, bad plugin name).
    InvalidArgument,
    /// A referenced entity (metric, plugin) does not exist.
    NotFound,
    /// The operation did not complete before its deadline.
    DeadlineExceeded,
    /// The system is not in a state required for the operation to proceed.
    FailedPrecondition,
    /// The operation was cancelled, typically by the caller.
    Cancelled,
    /// An internal invariant was violated; a programming error, not caller error.
    Internal,
    /// The transport is temporarily unavailable.
    Unavailable,
    /// Unrecoverable situation with no better-fitting code.
    Unknown,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::Ok => "OK",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Cancelled => "CANCELLED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A status: a code plus a human-readable message.
///
/// `Status::ok()` carries an empty message. Every other constructor takes a
/// message because spec.md requires diagnostic information to live in the
/// returned status rather than in stderr logging (§7).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    /// Build a status from a code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The successful status.
    pub fn ok() -> Self {
        Self::new(Code::Ok, "")
    }

    /// Shorthand for `Code::InvalidArgument`.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// Shorthand for `Code::NotFound`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Shorthand for `Code::DeadlineExceeded`.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(Code::DeadlineExceeded, message)
    }

    /// Shorthand for `Code::FailedPrecondition`.
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    /// Shorthand for `Code::Cancelled`.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(Code::Cancelled, message)
    }

    /// Shorthand for `Code::Internal`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// Shorthand for `Code::Unavailable`.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    /// Shorthand for `Code::Unknown`.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Code::Unknown, message)
    }

    /// The status code.
    pub fn code(&self) -> Code {
        self.code
    }

    /// The human-readable message. Empty for `ok()`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True iff this status is `Code::Ok`.
    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// Join this status's message with another's under a single code,
    /// used by the metrics evaluator and the orchestrator's validation pass
    /// to aggregate multiple failures into one status (spec.md §4.6, §4.8).
    pub fn join(messages: impl IntoIterator<Item = String>, code: Code) -> Self {
        let joined = messages.into_iter().collect::<Vec<_>>().join("\n");
        Self::new(code, joined)
    }
}

/// A `Result` alias used throughout the controller.
pub type StatusResult<T> = Result<T, Status>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;

    #[test]
    fn ok_has_ok_code_and_empty_message() {
        let s = Status::ok();
        assert!(s.is_ok());
        assert_eq!(s.message(), "");
    }

    #[test]
    fn shorthand_constructors_set_expected_code() {
        assert_eq!(Status::invalid_argument("x").code(), Code::InvalidArgument);
        assert_eq!(Status::not_found("x").code(), Code::NotFound);
        assert_eq!(Status::deadline_exceeded("x").code(), Code::DeadlineExceeded);
        assert_eq!(
            Status::failed_precondition("x").code(),
            Code::FailedPrecondition
        );
        assert_eq!(Status::cancelled("x").code(), Code::Cancelled);
        assert_eq!(Status::internal("x").code(), Code::Internal);
        assert_eq!(Status::unavailable("x").code(), Code::Unavailable);
        assert_eq!(Status::unknown("x").code(), Code::Unknown);
    }

    #[test]
    fn join_concatenates_with_newlines() {
        let s = Status::join(
            vec!["first failure".to_string(), "second failure".to_string()],
            Code::Internal,
        );
        assert_eq!(s.code(), Code::Internal);
        assert_eq!(s.message(), "first failure\nsecond failure");
    }

    #[test]
    fn join_of_empty_iterator_is_empty_message() {
        let s = Status::join(Vec::<String>::new(), Code::InvalidArgument);
        assert_eq!(s.message(), "");
    }
}
