// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a mount or unmount request.
///
/// Closed set: every failure, local or reported by the disk management service,
/// resolves to exactly one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Ok,
    TransportError,
    Busy,
    OperationFailed,
    Cancelled,
    NotAuthorized,
    UnknownFileSystem,
    InvalidRequest,
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Ok => "Success.",
            Self::TransportError => "D-Bus error occurred.",
            Self::Busy => "Device is busy.",
            Self::OperationFailed => "Operation failed.",
            Self::Cancelled => "Request cancelled.",
            Self::NotAuthorized => "User is not authorized to perform this operation.",
            Self::UnknownFileSystem => "Unknown file system.",
            Self::InvalidRequest => "Unknown error.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ok_is_ok() {
        assert!(ErrorCode::Ok.is_ok());
        assert!(!ErrorCode::Busy.is_ok());
        assert!(!ErrorCode::TransportError.is_ok());
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::UnknownFileSystem).expect("serialize code");
        assert_eq!(json, "\"unknown_file_system\"");
    }
}
