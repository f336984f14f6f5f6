//! PTVO switch firmware descriptor

use crate::metering::PtvoMeteringCluster;
use crate::uart::PtvoUartCluster;
use std::collections::BTreeMap;
use zigbee_core::cluster::{device_type, id, profile};
use zigbee_core::{
    ClusterSpec, Device, ModelInfo, QuirkDefinition, Replacement, ReplacementEndpoint, Signature,
    SignatureEndpoint,
};

/// Smart plug running PTVO custom firmware
pub struct PtvoUartDevice;

impl PtvoUartDevice {
    pub const MANUFACTURER: &'static str = "ptvo.info";
    pub const MODEL: &'static str = "ptvo.switch";

    /// Layout as advertised by the firmware
    #[must_use]
    pub fn signature() -> Signature {
        // <SimpleDescriptor endpoint=1 profile=260 device_type=65534
        //  input_clusters=[0, 20] output_clusters=[0]>
        Signature {
            models: vec![ModelInfo::new(Self::MANUFACTURER, Self::MODEL)],
            endpoints: BTreeMap::from([(
                1,
                SignatureEndpoint {
                    profile_id: profile::HOME_AUTOMATION,
                    device_type: device_type::UNSPECIFIED,
                    input_clusters: vec![id::BASIC, PtvoUartCluster::CLUSTER_ID],
                    output_clusters: vec![id::BASIC],
                },
            )]),
        }
    }

    /// Layout presented to consumers
    #[must_use]
    pub fn replacement() -> Replacement {
        Replacement {
            endpoints: BTreeMap::from([(
                1,
                ReplacementEndpoint {
                    profile_id: None,
                    device_type: device_type::SMART_PLUG,
                    input_clusters: vec![
                        ClusterSpec::Id(id::BASIC),
                        ClusterSpec::Id(id::IDENTIFY),
                        ClusterSpec::Custom(PtvoMeteringCluster::cluster_type()),
                        ClusterSpec::Id(PtvoUartCluster::CLUSTER_ID),
                    ],
                    output_clusters: vec![],
                },
            )]),
        }
    }

    #[must_use]
    pub fn definition() -> QuirkDefinition {
        QuirkDefinition {
            name: "PtvoUartDevice",
            signature: Self::signature(),
            replacement: Self::replacement(),
            custom_clusters: vec![PtvoUartCluster::cluster_type()],
            init: Self::init,
        }
    }

    fn init(device: &Device) {
        tracing::info!("PtvoUartDevice init for {}", device.info().display_name());
    }
}
