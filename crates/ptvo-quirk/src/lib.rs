//! Quirk for smart plugs running PTVO custom firmware
//!
//! The firmware reports on a vendor cluster that consumers don't understand.
//! This quirk presents the plug as a standard smart plug with a Metering
//! cluster whose current summation follows the device's consumption bus.

pub mod device;
pub mod metering;
pub mod uart;

pub use device::PtvoUartDevice;
pub use metering::{kwh_to_summation, PtvoMeteringCluster};
pub use uart::PtvoUartCluster;

use zigbee_core::QuirkRegistry;

/// Register this crate's quirks
pub fn register(registry: &mut QuirkRegistry) {
    registry.register(PtvoUartDevice::definition());
}
