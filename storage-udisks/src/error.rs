// SPDX-License-Identifier: GPL-3.0-only

//! Conversion of UDisks2 and zbus failures into the gateway error contract

use storage_contracts::ServiceError;
use udisks2::{Error as UDisksError, Iscsi};

const UDISKS2_ERROR_PREFIX: &str = "org.freedesktop.UDisks2.Error.";
const UDISKS_ERROR_PREFIX: &str = "org.freedesktop.UDisks.Error.";
const DBUS_ERROR_PREFIX: &str = "org.freedesktop.DBus.Error.";
const UNKNOWN_OBJECT: &str = "org.freedesktop.DBus.Error.UnknownObject";

/// Split a udisks2 failure into a transport error or a domain error.
///
/// The udisks2 crate already decodes the error names it knows into typed variants;
/// names it does not know stay wrapped zbus errors and go through
/// [`service_error_from_zbus`].
pub fn service_error_from_udisks(err: UDisksError) -> ServiceError {
    match domain_id(&err) {
        Some(id) => ServiceError::domain(id, err.to_string()),
        None => match err {
            UDisksError::Zbus(inner) => service_error_from_zbus(inner),
            other => ServiceError::Transport(other.to_string()),
        },
    }
}

// Several UDisks2 errors share one outcome (three polkit refusals, for example).
fn domain_id(err: &UDisksError) -> Option<&'static str> {
    let id = match err {
        UDisksError::Zbus(_) => return None,
        UDisksError::Failed => "Failed",
        UDisksError::Cancelled | UDisksError::AlreadyCancelled => "Cancelled",
        UDisksError::NotAuthorized
        | UDisksError::NotAuthorizedCanObtain
        | UDisksError::NotAuthorizedDismissed => "NotAuthorized",
        UDisksError::DeviceBusy => "Busy",
        UDisksError::AlreadyMounted => "AlreadyMounted",
        UDisksError::NotMounted => "NotMounted",
        UDisksError::OptionNotPermitted => "OptionNotPermitted",
        UDisksError::MountedByOtherUser => "MountedByOtherUser",
        UDisksError::AlreadyUnmounting => "AlreadyUnmounting",
        UDisksError::NotSupported => "NotSupported",
        UDisksError::TimedOut => "TimedOut",
        UDisksError::WouldWakeup => "WouldWakeup",
        UDisksError::Iscsi(Iscsi::LoginAuthFailed) => "ISCSI.LoginAuthFailed",
        UDisksError::Iscsi(_) => "ISCSI",
    };
    Some(id)
}

/// Split a zbus failure into a transport error or a UDisks domain error.
pub fn service_error_from_zbus(err: zbus::Error) -> ServiceError {
    match err {
        zbus::Error::MethodError(name, description, _) => {
            error_from_name(name.as_str(), description.unwrap_or_default())
        }
        other => ServiceError::Transport(other.to_string()),
    }
}

/// Standard D-Bus errors belong to the bus; every other error name was raised by
/// the service. The UDisks namespace is stripped so the identifier is stable
/// across UDisks versions.
pub(crate) fn error_from_name(name: &str, message: String) -> ServiceError {
    if name.starts_with(DBUS_ERROR_PREFIX) {
        return ServiceError::Transport(format!("{name}: {message}"));
    }

    let id = name
        .strip_prefix(UDISKS2_ERROR_PREFIX)
        .or_else(|| name.strip_prefix(UDISKS_ERROR_PREFIX))
        .unwrap_or(name);

    ServiceError::domain(canonical_id(id), message)
}

// Names the legacy daemon or a newer one may send without the udisks2 crate
// knowing them.
fn canonical_id(id: &str) -> &str {
    match id {
        "DeviceBusy" => "Busy",
        "NotAuthorizedCanObtain" | "NotAuthorizedDismissed" => "NotAuthorized",
        other => other,
    }
}

/// True when the failure says the object path does not exist on the bus.
pub(crate) fn is_unknown_object(err: &UDisksError) -> bool {
    match err {
        UDisksError::Zbus(zbus::Error::MethodError(name, _, _)) => {
            name.as_str() == UNKNOWN_OBJECT
        }
        UDisksError::Zbus(zbus::Error::FDO(fdo)) => {
            matches!(**fdo, zbus::fdo::Error::UnknownObject(_))
        }
        _ => false,
    }
}
