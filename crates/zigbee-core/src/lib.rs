//! Zigbee device model
//!
//! This crate provides the device, cluster and quirk abstractions that
//! device-specific adapters plug into: discovered-device records, cluster
//! instances with attribute caches, the per-device consumption bus, and the
//! registry that matches devices to quirks.

pub mod attribute;
pub mod bus;
pub mod capability;
pub mod cluster;
pub mod device;
pub mod error;
pub mod instance;
pub mod persistence;
pub mod quirk;
pub mod zcl;

pub use attribute::{AttributeCache, AttributeValue, ReadAttributeRecord};
pub use bus::{ConsumptionBus, ConsumptionListener};
pub use capability::{Cluster, ClusterContext, ClusterType, GenericCluster};
pub use device::{Endpoint, ZigbeeDevice};
pub use error::{ClusterError, DeviceError, ZclError};
pub use instance::{Device, DeviceEvent, EndpointInstance};
pub use quirk::{
    ClusterSpec, ModelInfo, QuirkDefinition, QuirkRegistry, Replacement, ReplacementEndpoint,
    Signature, SignatureEndpoint,
};
pub use zcl::ZclHeader;
