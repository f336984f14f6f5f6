//! Device quirks: signatures to recognize a device, replacements to present
//! it differently.

use crate::capability::ClusterType;
use crate::device::ZigbeeDevice;
use crate::instance::Device;
use std::collections::{BTreeMap, BTreeSet};

/// Manufacturer/model pair from the Basic cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub manufacturer: String,
    pub model: String,
}

impl ModelInfo {
    #[must_use]
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }
}

/// Expected layout of one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEndpoint {
    pub profile_id: u16,
    pub device_type: u16,
    pub input_clusters: Vec<u16>,
    pub output_clusters: Vec<u16>,
}

/// How a device looks on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub models: Vec<ModelInfo>,
    pub endpoints: BTreeMap<u8, SignatureEndpoint>,
}

impl Signature {
    /// Check a discovered device against this signature.
    ///
    /// Identity strings must be equal, the endpoint ids must be the same set,
    /// and every endpoint must have the same profile, device type and
    /// cluster sets.
    #[must_use]
    pub fn matches(&self, device: &ZigbeeDevice) -> bool {
        let identity_ok = self.models.iter().any(|m| {
            device.manufacturer.as_deref() == Some(m.manufacturer.as_str())
                && device.model.as_deref() == Some(m.model.as_str())
        });
        if !identity_ok {
            return false;
        }

        let discovered: BTreeSet<u8> = device.endpoints.iter().map(|e| e.id).collect();
        let expected: BTreeSet<u8> = self.endpoints.keys().copied().collect();
        if discovered != expected {
            return false;
        }

        self.endpoints.iter().all(|(id, sig)| {
            device.endpoint(*id).is_some_and(|ep| {
                ep.profile_id == sig.profile_id
                    && ep.device_type == sig.device_type
                    && ep.in_cluster_set()
                        == sig.input_clusters.iter().copied().collect::<BTreeSet<_>>()
                    && ep.out_cluster_set()
                        == sig.output_clusters.iter().copied().collect::<BTreeSet<_>>()
            })
        })
    }
}

/// A cluster slot in a replacement layout
#[derive(Debug, Clone, Copy)]
pub enum ClusterSpec {
    /// Plain cluster id, instantiated by the host
    Id(u16),
    /// Custom cluster type, instantiated through its factory
    Custom(ClusterType),
}

impl ClusterSpec {
    #[must_use]
    pub fn cluster_id(&self) -> u16 {
        match self {
            Self::Id(id) => *id,
            Self::Custom(ty) => ty.cluster_id,
        }
    }
}

/// Replacement layout of one endpoint
#[derive(Debug, Clone)]
pub struct ReplacementEndpoint {
    /// Profile to present; the discovered profile is kept when unset
    pub profile_id: Option<u16>,
    pub device_type: u16,
    pub input_clusters: Vec<ClusterSpec>,
    pub output_clusters: Vec<ClusterSpec>,
}

/// How a device should be presented to consumers
#[derive(Debug, Clone, Default)]
pub struct Replacement {
    pub endpoints: BTreeMap<u8, ReplacementEndpoint>,
}

/// A registered quirk
#[derive(Clone)]
pub struct QuirkDefinition {
    pub name: &'static str,
    pub signature: Signature,
    pub replacement: Replacement,
    /// Custom types used when a replacement names a cluster by id
    pub custom_clusters: Vec<ClusterType>,
    /// Runs once the device instance is built
    pub init: fn(&Device),
}

impl QuirkDefinition {
    /// Custom cluster type registered for an id
    #[must_use]
    pub fn cluster_type(&self, cluster_id: u16) -> Option<ClusterType> {
        self.custom_clusters
            .iter()
            .find(|ty| ty.cluster_id == cluster_id)
            .copied()
    }
}

impl std::fmt::Debug for QuirkDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuirkDefinition")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("replacement", &self.replacement)
            .field("custom_clusters", &self.custom_clusters)
            .finish_non_exhaustive()
    }
}

/// Ordered set of quirks; the first matching quirk wins
#[derive(Debug, Default)]
pub struct QuirkRegistry {
    quirks: Vec<QuirkDefinition>,
}

impl QuirkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, quirk: QuirkDefinition) {
        tracing::debug!("Registered quirk {}", quirk.name);
        self.quirks.push(quirk);
    }

    /// Find the quirk matching a discovered device
    #[must_use]
    pub fn find(&self, device: &ZigbeeDevice) -> Option<&QuirkDefinition> {
        let found = self.quirks.iter().find(|q| q.signature.matches(device));
        match found {
            Some(q) => tracing::info!("Device {} matches quirk {}", device.display_name(), q.name),
            None => tracing::debug!("No quirk for device {}", device.display_name()),
        }
        found
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quirks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quirks.is_empty()
    }
}
