//! Cluster capability interface
//!
//! Every cluster instance on a device implements [`Cluster`]. The trait
//! carries the host's generic behaviour as default methods (attribute reads,
//! report handling) so custom clusters only override what they change.

use crate::attribute::{AttributeCache, AttributeValue, ReadAttributeRecord};
use crate::bus::ConsumptionBus;
use crate::cluster::{self, GlobalCommand, Status};
use crate::instance::DeviceEvent;
use crate::zcl::{self, ZclHeader};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything a cluster receives from its device at construction time
#[derive(Debug, Clone)]
pub struct ClusterContext {
    pub ieee_address: [u8; 8],
    pub endpoint_id: u8,
    pub consumption_bus: Arc<ConsumptionBus>,
    pub event_tx: broadcast::Sender<DeviceEvent>,
}

impl ClusterContext {
    /// Fresh, empty attribute cache for a cluster on this endpoint
    #[must_use]
    pub fn attribute_cache(&self, cluster_id: u16) -> AttributeCache {
        AttributeCache::new(
            self.ieee_address,
            self.endpoint_id,
            cluster_id,
            self.event_tx.clone(),
        )
    }
}

/// A cluster instance
pub trait Cluster: Send + Sync {
    fn cluster_id(&self) -> u16;

    fn name(&self) -> &'static str {
        cluster::name(self.cluster_id())
    }

    /// Attribute store backing this cluster
    fn attributes(&self) -> &AttributeCache;

    /// Values that never change, served ahead of the cache
    fn constant_attributes(&self) -> &[(u16, AttributeValue)] {
        &[]
    }

    fn read_attribute(&self, attribute_id: u16) -> Option<AttributeValue> {
        self.constant_attributes()
            .iter()
            .find(|(id, _)| *id == attribute_id)
            .map(|(_, value)| value.clone())
            .or_else(|| self.attributes().get(attribute_id))
    }

    fn read_attributes(&self, attribute_ids: &[u16]) -> Vec<ReadAttributeRecord> {
        attribute_ids
            .iter()
            .map(|&attribute_id| match self.read_attribute(attribute_id) {
                Some(value) => ReadAttributeRecord {
                    attribute_id,
                    status: Status::Success,
                    value: Some(value),
                },
                None => ReadAttributeRecord {
                    attribute_id,
                    status: Status::UnsupportedAttribute,
                    value: None,
                },
            })
            .collect()
    }

    /// Cluster-specific command addressed to this cluster
    fn handle_cluster_request(&self, header: &ZclHeader, payload: &[u8]) {
        tracing::debug!(
            "No handler on {} for {} payload={:02x?}",
            self.name(),
            header,
            payload
        );
    }

    /// Global (profile-wide) command addressed to this cluster
    fn handle_general_request(&self, header: &ZclHeader, payload: &[u8]) {
        apply_general_request(self.attributes(), header, payload);
    }
}

/// Default handling of global commands: attribute reports and read responses
/// land in the cache, anything else is only logged.
pub fn apply_general_request(cache: &AttributeCache, header: &ZclHeader, payload: &[u8]) {
    let records = match header.general_command() {
        Some(GlobalCommand::ReportAttributes) => zcl::parse_attribute_reports(payload),
        Some(GlobalCommand::ReadAttributesResponse) => zcl::parse_read_attributes_response(payload),
        _ => {
            tracing::debug!("Ignoring general command {}", header);
            return;
        }
    };

    match records {
        Ok(records) => {
            for (attribute_id, value) in records {
                cache.update(attribute_id, value);
            }
        }
        Err(e) => tracing::warn!("Failed to decode attribute records in {}: {}", header, e),
    }
}

/// Factory for a custom cluster type
#[derive(Clone, Copy)]
pub struct ClusterType {
    pub cluster_id: u16,
    pub name: &'static str,
    pub build: fn(&ClusterContext) -> Arc<dyn Cluster>,
}

impl std::fmt::Debug for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterType")
            .field("cluster_id", &format_args!("{:#06x}", self.cluster_id))
            .field("name", &self.name)
            .finish()
    }
}

/// Cluster with no custom behaviour
#[derive(Debug)]
pub struct GenericCluster {
    cluster_id: u16,
    attributes: AttributeCache,
}

impl GenericCluster {
    #[must_use]
    pub fn new(ctx: &ClusterContext, cluster_id: u16) -> Self {
        Self {
            cluster_id,
            attributes: ctx.attribute_cache(cluster_id),
        }
    }
}

impl Cluster for GenericCluster {
    fn cluster_id(&self) -> u16 {
        self.cluster_id
    }

    fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{basic_attrs, id};

    fn context() -> ClusterContext {
        let (event_tx, _) = broadcast::channel(16);
        ClusterContext {
            ieee_address: [0x11; 8],
            endpoint_id: 1,
            consumption_bus: Arc::new(ConsumptionBus::new()),
            event_tx,
        }
    }

    struct Fixed {
        attributes: AttributeCache,
    }

    static FIXED: [(u16, AttributeValue); 1] = [(0x0001, AttributeValue::Uint8(9))];

    impl Cluster for Fixed {
        fn cluster_id(&self) -> u16 {
            0xFC00
        }

        fn attributes(&self) -> &AttributeCache {
            &self.attributes
        }

        fn constant_attributes(&self) -> &[(u16, AttributeValue)] {
            &FIXED
        }
    }

    #[test]
    fn test_report_updates_generic_cache() {
        let cluster = GenericCluster::new(&context(), id::BASIC);
        let (hdr, payload) = ZclHeader::parse(&[
            0x18, 0x01, 0x0A, 0x04, 0x00, 0x42, 0x09, b'p', b't', b'v', b'o', b'.', b'i', b'n',
            b'f', b'o',
        ])
        .unwrap();

        cluster.handle_general_request(&hdr, payload);

        assert_eq!(
            cluster.read_attribute(basic_attrs::MANUFACTURER_NAME),
            Some(AttributeValue::String("ptvo.info".into()))
        );
    }

    #[test]
    fn test_malformed_report_leaves_cache() {
        let cluster = GenericCluster::new(&context(), id::BASIC);
        let (hdr, payload) = ZclHeader::parse(&[0x18, 0x01, 0x0A, 0x04, 0x00, 0x21]).unwrap();
        cluster.handle_general_request(&hdr, payload);
        assert!(cluster.attributes().is_empty());
    }

    #[test]
    fn test_constants_shadow_cache() {
        let cluster = Fixed {
            attributes: context().attribute_cache(0xFC00),
        };
        cluster.attributes().update(0x0001, AttributeValue::Uint8(1));
        cluster.attributes().update(0x0002, AttributeValue::Uint8(2));

        let records = cluster.read_attributes(&[0x0001, 0x0002, 0x0003]);
        assert_eq!(records[0].value, Some(AttributeValue::Uint8(9)));
        assert_eq!(records[1].value, Some(AttributeValue::Uint8(2)));
        assert_eq!(records[2].status, Status::UnsupportedAttribute);
        assert_eq!(records[2].value, None);
    }
}
