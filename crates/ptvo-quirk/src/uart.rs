//! Placeholder for the PTVO firmware's proprietary cluster

use std::collections::HashMap;
use std::sync::Arc;
use zigbee_core::cluster::id;
use zigbee_core::{AttributeCache, AttributeValue, Cluster, ClusterContext, ClusterType};

/// Vendor cluster on id 0x0014.
///
/// Only present so traffic on this id has somewhere to land; it translates
/// nothing and relies entirely on the default cluster behaviour.
#[derive(Debug)]
pub struct PtvoUartCluster {
    attributes: AttributeCache,
    current_state: HashMap<u16, AttributeValue>,
}

impl PtvoUartCluster {
    pub const CLUSTER_ID: u16 = id::MULTISTATE_VALUE;
    pub const NAME: &'static str = "PtvoUartCluster";

    #[must_use]
    pub fn new(ctx: &ClusterContext) -> Self {
        tracing::info!("PtvoUartCluster init on EP{}", ctx.endpoint_id);
        Self {
            attributes: ctx.attribute_cache(Self::CLUSTER_ID),
            current_state: HashMap::new(),
        }
    }

    #[must_use]
    pub fn cluster_type() -> ClusterType {
        ClusterType {
            cluster_id: Self::CLUSTER_ID,
            name: Self::NAME,
            build: build_uart,
        }
    }

    /// Per-attribute state slot, currently unused
    #[must_use]
    pub fn current_state(&self) -> &HashMap<u16, AttributeValue> {
        &self.current_state
    }
}

fn build_uart(ctx: &ClusterContext) -> Arc<dyn Cluster> {
    Arc::new(PtvoUartCluster::new(ctx))
}

impl Cluster for PtvoUartCluster {
    fn cluster_id(&self) -> u16 {
        Self::CLUSTER_ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }
}
