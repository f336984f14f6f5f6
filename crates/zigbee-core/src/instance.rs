//! Runtime device instance
//!
//! Built from a discovered [`ZigbeeDevice`], optionally reshaped by a quirk.
//! Owns the cluster instances, the consumption bus shared by them, and the
//! broadcast channel carrying attribute changes to consumers.

use crate::attribute::AttributeValue;
use crate::bus::ConsumptionBus;
use crate::capability::{Cluster, ClusterContext, GenericCluster};
use crate::cluster::profile;
use crate::device::{Endpoint, ZigbeeDevice};
use crate::error::DeviceError;
use crate::quirk::{ClusterSpec, QuirkDefinition, QuirkRegistry, ReplacementEndpoint};
use crate::zcl::ZclHeader;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events emitted by a device instance
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A cached attribute changed
    AttributeUpdated {
        ieee_address: [u8; 8],
        endpoint: u8,
        cluster_id: u16,
        attribute_id: u16,
        value: AttributeValue,
    },
}

/// An endpoint with instantiated clusters
pub struct EndpointInstance {
    pub id: u8,
    pub profile_id: u16,
    pub device_type: u16,
    in_clusters: Vec<Arc<dyn Cluster>>,
    out_clusters: Vec<Arc<dyn Cluster>>,
}

impl EndpointInstance {
    /// Input (server) cluster by id
    #[must_use]
    pub fn in_cluster(&self, cluster_id: u16) -> Option<&Arc<dyn Cluster>> {
        self.in_clusters.iter().find(|c| c.cluster_id() == cluster_id)
    }

    /// Output (client) cluster by id
    #[must_use]
    pub fn out_cluster(&self, cluster_id: u16) -> Option<&Arc<dyn Cluster>> {
        self.out_clusters.iter().find(|c| c.cluster_id() == cluster_id)
    }

    #[must_use]
    pub fn in_cluster_ids(&self) -> Vec<u16> {
        self.in_clusters.iter().map(|c| c.cluster_id()).collect()
    }

    #[must_use]
    pub fn out_cluster_ids(&self) -> Vec<u16> {
        self.out_clusters.iter().map(|c| c.cluster_id()).collect()
    }
}

impl std::fmt::Debug for EndpointInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointInstance")
            .field("id", &self.id)
            .field("profile_id", &format_args!("{:#06x}", self.profile_id))
            .field("device_type", &format_args!("{:#06x}", self.device_type))
            .field("in_clusters", &format_args!("{:04x?}", self.in_cluster_ids()))
            .field("out_clusters", &format_args!("{:04x?}", self.out_cluster_ids()))
            .finish()
    }
}

/// A device ready to receive traffic
#[derive(Debug)]
pub struct Device {
    info: ZigbeeDevice,
    quirk: Option<&'static str>,
    endpoints: BTreeMap<u8, EndpointInstance>,
    consumption_bus: Arc<ConsumptionBus>,
    event_tx: broadcast::Sender<DeviceEvent>,
}

impl Device {
    /// Build a device, applying the first matching quirk from the registry
    #[must_use]
    pub fn from_discovered(info: ZigbeeDevice, registry: &QuirkRegistry) -> Self {
        let quirk = registry.find(&info).cloned();
        Self::build(info, quirk.as_ref())
    }

    /// Build a device with an explicit quirk, or from its discovered layout
    #[must_use]
    pub fn build(info: ZigbeeDevice, quirk: Option<&QuirkDefinition>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let mut device = Self {
            info,
            quirk: quirk.map(|q| q.name),
            endpoints: BTreeMap::new(),
            consumption_bus: Arc::new(ConsumptionBus::new()),
            event_tx,
        };

        let replacement = quirk.map(|q| &q.replacement.endpoints);
        let mut ids: Vec<u8> = device.info.endpoints.iter().map(|e| e.id).collect();
        if let Some(replaced) = replacement {
            ids.extend(replaced.keys().copied());
        }
        ids.sort_unstable();
        ids.dedup();

        for id in ids {
            let discovered = device.info.endpoint(id).cloned();
            let replaced = replacement.and_then(|r| r.get(&id));
            let endpoint = match (replaced, discovered) {
                (Some(spec), discovered) => {
                    device.replaced_endpoint(id, spec, discovered.as_ref(), quirk)
                }
                (None, Some(discovered)) => device.discovered_endpoint(&discovered, quirk),
                (None, None) => continue,
            };
            device.endpoints.insert(id, endpoint);
        }

        tracing::info!(
            "Initialized device {} ({}) with {} endpoints, quirk={:?}",
            device.info.display_name(),
            device.info.ieee_address_string(),
            device.endpoints.len(),
            device.quirk
        );

        if let Some(q) = quirk {
            (q.init)(&device);
        }
        device
    }

    fn context(&self, endpoint_id: u8) -> ClusterContext {
        ClusterContext {
            ieee_address: self.info.ieee_address,
            endpoint_id,
            consumption_bus: Arc::clone(&self.consumption_bus),
            event_tx: self.event_tx.clone(),
        }
    }

    fn instantiate(
        ctx: &ClusterContext,
        spec: ClusterSpec,
        quirk: Option<&QuirkDefinition>,
    ) -> Arc<dyn Cluster> {
        let custom = match spec {
            ClusterSpec::Custom(ty) => Some(ty),
            ClusterSpec::Id(id) => quirk.and_then(|q| q.cluster_type(id)),
        };
        match custom {
            Some(ty) => {
                tracing::debug!(
                    "Building {} for cluster {:#06x} on EP{}",
                    ty.name,
                    ty.cluster_id,
                    ctx.endpoint_id
                );
                (ty.build)(ctx)
            }
            None => Arc::new(GenericCluster::new(ctx, spec.cluster_id())),
        }
    }

    fn replaced_endpoint(
        &self,
        id: u8,
        spec: &ReplacementEndpoint,
        discovered: Option<&Endpoint>,
        quirk: Option<&QuirkDefinition>,
    ) -> EndpointInstance {
        let ctx = self.context(id);
        let profile_id = spec
            .profile_id
            .or_else(|| discovered.map(|e| e.profile_id))
            .unwrap_or(profile::HOME_AUTOMATION);

        EndpointInstance {
            id,
            profile_id,
            device_type: spec.device_type,
            in_clusters: spec
                .input_clusters
                .iter()
                .map(|c| Self::instantiate(&ctx, *c, quirk))
                .collect(),
            out_clusters: spec
                .output_clusters
                .iter()
                .map(|c| Self::instantiate(&ctx, *c, quirk))
                .collect(),
        }
    }

    fn discovered_endpoint(
        &self,
        endpoint: &Endpoint,
        quirk: Option<&QuirkDefinition>,
    ) -> EndpointInstance {
        let ctx = self.context(endpoint.id);
        EndpointInstance {
            id: endpoint.id,
            profile_id: endpoint.profile_id,
            device_type: endpoint.device_type,
            in_clusters: endpoint
                .in_clusters
                .iter()
                .map(|id| Self::instantiate(&ctx, ClusterSpec::Id(*id), quirk))
                .collect(),
            out_clusters: endpoint
                .out_clusters
                .iter()
                .map(|id| Self::instantiate(&ctx, ClusterSpec::Id(*id), quirk))
                .collect(),
        }
    }

    /// Discovered device info
    #[must_use]
    pub fn info(&self) -> &ZigbeeDevice {
        &self.info
    }

    #[must_use]
    pub fn ieee_address(&self) -> [u8; 8] {
        self.info.ieee_address
    }

    /// Name of the applied quirk, if any
    #[must_use]
    pub fn quirk_name(&self) -> Option<&'static str> {
        self.quirk
    }

    #[must_use]
    pub fn endpoint(&self, id: u8) -> Option<&EndpointInstance> {
        self.endpoints.get(&id)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointInstance> {
        self.endpoints.values()
    }

    /// Consumption bus shared by this device's clusters
    #[must_use]
    pub fn consumption_bus(&self) -> &Arc<ConsumptionBus> {
        &self.consumption_bus
    }

    /// Subscribe to device events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_tx.subscribe()
    }

    /// Input cluster on an endpoint
    pub fn cluster(&self, endpoint: u8, cluster_id: u16) -> Result<&Arc<dyn Cluster>, DeviceError> {
        self.endpoints
            .get(&endpoint)
            .ok_or(DeviceError::EndpointNotFound(endpoint))?
            .in_cluster(cluster_id)
            .ok_or(DeviceError::ClusterNotFound {
                endpoint,
                cluster: cluster_id,
            })
    }

    /// Read an attribute through the cluster's read path
    pub fn read_attribute(
        &self,
        endpoint: u8,
        cluster_id: u16,
        attribute_id: u16,
    ) -> Result<Option<AttributeValue>, DeviceError> {
        Ok(self.cluster(endpoint, cluster_id)?.read_attribute(attribute_id))
    }

    /// Dispatch an incoming ZCL frame to the addressed cluster
    pub fn handle_message(
        &self,
        endpoint: u8,
        cluster_id: u16,
        asdu: &[u8],
    ) -> Result<(), DeviceError> {
        let (header, payload) = ZclHeader::parse(asdu)?;
        let ep = self
            .endpoints
            .get(&endpoint)
            .ok_or(DeviceError::EndpointNotFound(endpoint))?;

        // Reports from a client cluster still land on it
        let cluster = ep
            .in_cluster(cluster_id)
            .or_else(|| ep.out_cluster(cluster_id))
            .ok_or(DeviceError::ClusterNotFound {
                endpoint,
                cluster: cluster_id,
            })?;

        tracing::debug!(
            "Dispatching {} to {} EP{} of {}",
            header,
            cluster.name(),
            endpoint,
            self.info.display_name()
        );

        if header.is_cluster_specific() {
            cluster.handle_cluster_request(&header, payload);
        } else {
            cluster.handle_general_request(&header, payload);
        }
        Ok(())
    }
}
