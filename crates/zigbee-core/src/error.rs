//! Error types for the Zigbee device model

use thiserror::Error;

/// Errors raised by cluster implementations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// Consumption reading that can't be represented as a summation value
    #[error("Invalid consumption reading: {0}")]
    InvalidReading(f64),
}

/// ZCL frame decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZclError {
    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("Unsupported data type: {0:#04X}")]
    UnsupportedDataType(u8),

    #[error("Character string is not valid UTF-8")]
    InvalidString,
}

/// Errors raised while dispatching to a device instance
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(u8),

    #[error("Cluster {cluster:#06x} not found on endpoint {endpoint}")]
    ClusterNotFound { endpoint: u8, cluster: u16 },

    #[error("ZCL error: {0}")]
    Zcl(#[from] ZclError),
}
