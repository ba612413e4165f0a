// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for IPoPS.

use thiserror::Error;

/// Top-level error type for all IPoPS operations.
#[derive(Debug, Error)]
pub enum IpopsError {
    // -- Startup errors --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("the '{0}' executable could not be found on PATH")]
    MissingExecutable(String),

    // -- Wire format errors --
    #[error("malformed input stream: {0}")]
    MalformedStream(String),

    // -- External process errors --
    #[error("subprocess '{command}' failed: {detail}")]
    Subprocess { command: String, detail: String },

    // -- Scan errors --
    #[error("page decode failed: {0}")]
    Decode(String),

    // -- Persistence --
    #[error("invalid persistent state: {0}")]
    InvalidState(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IpopsError>;

impl IpopsError {
    /// Process exit code for an error that unwinds to the top of a binary.
    ///
    /// Missing executables exit 1, subprocess failures exit 3, everything
    /// else is a configuration or value error and exits 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingExecutable(_) => 1,
            Self::Subprocess { .. } => 3,
            Self::Config(_)
            | Self::MalformedStream(_)
            | Self::Decode(_)
            | Self::InvalidState(_)
            | Self::Io(_)
            | Self::Serialization(_) => 2,
        }
    }

    /// Whether the scanner loop may swallow this error and let the operator
    /// retry the scan. Only decode failures and capture subprocess failures
    /// qualify; everything else unwinds.
    pub fn is_recoverable_scan_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Subprocess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_exits_one() {
        assert_eq!(IpopsError::MissingExecutable("lp".into()).exit_code(), 1);
    }

    #[test]
    fn subprocess_failure_exits_three() {
        let err = IpopsError::Subprocess {
            command: "lp".into(),
            detail: "exit status: 1".into(),
        };
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn config_and_stream_errors_exit_two() {
        assert_eq!(IpopsError::Config("bad".into()).exit_code(), 2);
        assert_eq!(IpopsError::MalformedStream("truncated".into()).exit_code(), 2);
    }

    #[test]
    fn only_decode_and_subprocess_recoverable() {
        assert!(IpopsError::Decode("no symbol".into()).is_recoverable_scan_error());
        assert!(
            IpopsError::Subprocess {
                command: "scanimage".into(),
                detail: "exit status: 1".into(),
            }
            .is_recoverable_scan_error()
        );
        assert!(!IpopsError::Config("bad".into()).is_recoverable_scan_error());
        assert!(!IpopsError::InvalidState("bad".into()).is_recoverable_scan_error());
    }
}
