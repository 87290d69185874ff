// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use storage_types::ErrorCode;
use thiserror::Error;

/// Failure reported by the disk management service gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ServiceError {
    /// Bus-level failure: no connection, marshalling error, standard D-Bus error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The queried object does not exist (anymore).
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Error raised by the disk management service itself. `id` is the stable
    /// identifier without the service's error namespace (e.g. "Busy").
    #[error("{id}: {message}")]
    Domain { id: String, message: String },
}

impl ServiceError {
    pub fn domain(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Domain {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }
}

const DOMAIN_ERRORS: &[(&str, ErrorCode)] = &[
    ("NotAuthorized", ErrorCode::NotAuthorized),
    ("Busy", ErrorCode::Busy),
    ("Failed", ErrorCode::OperationFailed),
    ("Cancelled", ErrorCode::Cancelled),
    ("FilesystemDriverMissing", ErrorCode::UnknownFileSystem),
];

/// Translate the outcome of a service call into the local error taxonomy.
///
/// Total: unknown domain identifiers become [`ErrorCode::InvalidRequest`] and
/// every non-domain failure is a [`ErrorCode::TransportError`].
pub fn map_error(error: Option<&ServiceError>) -> ErrorCode {
    match error {
        None => ErrorCode::Ok,
        Some(ServiceError::Domain { id, .. }) => DOMAIN_ERRORS
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, code)| *code)
            .unwrap_or(ErrorCode::InvalidRequest),
        // A vanished object surfaces as a bus error (UnknownObject), not a service one.
        Some(ServiceError::NotFound(_)) | Some(ServiceError::Transport(_)) => {
            ErrorCode::TransportError
        }
    }
}
