//! Error types for devinfo-core.
//!
//! This module defines all error types that can occur when talking to a
//! peripheral over Bluetooth Low Energy.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::Timeout`] | Retry | Transient BLE congestion |
//! | [`Error::Bluetooth`] | Retry, then reconnect | May be transient or connection lost |
//! | [`Error::NotConnected`] | Reconnect | Connection was lost |
//! | [`Error::ReadFailed`] | Retry | Reads can fail transiently |
//! | [`Error::Decode`] | Do not retry | The peripheral sent a malformed value |
//! | [`Error::DeviceNotFound`] | Do not retry | Device not in range or wrong name |
//! | [`Error::ServiceNotFound`] | Do not retry | Peripheral does not expose the service |
//! | [`Error::CharacteristicNotFound`] | Do not retry | Peripheral does not expose the value |
//!
//! Retry behaviour is opt-in through [`crate::RetryConfig`] on
//! [`crate::device::ConnectionConfig`]; by default every read is attempted once.

use std::time::Duration;

use thiserror::Error;

use devinfo_types::DecodeError;

/// Errors that can occur when communicating with a peripheral.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Operation attempted while not connected to device.
    #[error("Not connected to device")]
    NotConnected,

    /// Required GATT service not exposed by the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The service UUID that was not found.
        uuid: String,
    },

    /// Required characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// A characteristic read was rejected or failed mid-flight.
    #[error("Read failed for characteristic {uuid}: {reason}")]
    ReadFailed {
        /// The characteristic UUID.
        uuid: String,
        /// The reason for the failure.
        reason: String,
    },

    /// A value read from the device could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// Device with specified name/address not found.
    NotFound { identifier: String },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a service not found error.
    pub fn service_not_found(uuid: impl Into<String>) -> Self {
        Self::ServiceNotFound { uuid: uuid.into() }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }

    /// Create a read failure error.
    pub fn read_failed(uuid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReadFailed {
            uuid: uuid.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using devinfo-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
