//! Discovered Zigbee device representation
//!
//! This is the device as it advertised itself on the network (Basic cluster
//! identity plus ZDO simple descriptors), before any quirk is applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A Zigbee device as discovered on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZigbeeDevice {
    /// IEEE address (EUI-64)
    pub ieee_address: [u8; 8],
    /// Network short address
    pub nwk_address: u16,
    /// Manufacturer name (from Basic cluster)
    pub manufacturer: Option<String>,
    /// Model identifier (from Basic cluster)
    pub model: Option<String>,
    /// User-assigned friendly name
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Device endpoints
    pub endpoints: Vec<Endpoint>,
}

impl ZigbeeDevice {
    /// Create a new device with just address info
    #[must_use]
    pub fn new(ieee_address: [u8; 8], nwk_address: u16) -> Self {
        Self {
            ieee_address,
            nwk_address,
            manufacturer: None,
            model: None,
            friendly_name: None,
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Get IEEE address as hex string
    #[must_use]
    pub fn ieee_address_string(&self) -> String {
        format_ieee(&self.ieee_address)
    }

    /// Get a display name (friendly name, model, or IEEE address)
    #[must_use]
    pub fn display_name(&self) -> String {
        self.friendly_name
            .clone()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| self.ieee_address_string())
    }

    /// Look up an endpoint by id
    #[must_use]
    pub fn endpoint(&self, id: u8) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }
}

/// Format an IEEE address as colon-separated hex, most significant byte first
#[must_use]
pub fn format_ieee(ieee: &[u8; 8]) -> String {
    ieee.iter()
        .rev()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// A device endpoint, as reported by its simple descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint ID (1-240)
    pub id: u8,
    /// Profile ID (e.g., 0x0104 for Home Automation)
    pub profile_id: u16,
    /// Device type within the profile
    pub device_type: u16,
    /// Input (server) clusters
    pub in_clusters: Vec<u16>,
    /// Output (client) clusters
    pub out_clusters: Vec<u16>,
}

impl Endpoint {
    /// Check if endpoint has a specific cluster
    #[must_use]
    pub fn has_cluster(&self, cluster_id: u16) -> bool {
        self.in_clusters.contains(&cluster_id) || self.out_clusters.contains(&cluster_id)
    }

    #[must_use]
    pub fn in_cluster_set(&self) -> BTreeSet<u16> {
        self.in_clusters.iter().copied().collect()
    }

    #[must_use]
    pub fn out_cluster_set(&self) -> BTreeSet<u16> {
        self.out_clusters.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ieee_address_string() {
        let device = ZigbeeDevice::new([0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00], 0x1234);
        assert_eq!(device.ieee_address_string(), "00:11:22:33:44:55:66:77");
        assert_eq!(device.display_name(), "00:11:22:33:44:55:66:77");
    }

    #[test]
    fn test_display_name_prefers_friendly_then_model() {
        let mut device = ZigbeeDevice::new([0; 8], 0).with_model("ptvo.info", "ptvo.switch");
        assert_eq!(device.display_name(), "ptvo.switch");
        device.friendly_name = Some("Washer plug".into());
        assert_eq!(device.display_name(), "Washer plug");
    }

    #[test]
    fn test_endpoint_lookup() {
        let device = ZigbeeDevice::new([0; 8], 0).with_endpoint(Endpoint {
            id: 1,
            profile_id: 0x0104,
            device_type: 0xFFFE,
            in_clusters: vec![0x0014, 0x0000, 0x0014],
            out_clusters: vec![0x0000],
        });

        let ep = device.endpoint(1).unwrap();
        assert!(ep.has_cluster(0x0014));
        assert_eq!(ep.in_cluster_set().into_iter().collect::<Vec<_>>(), vec![0x0000, 0x0014]);
        assert!(device.endpoint(2).is_none());
    }
}
