//! Synthesized Metering cluster fed from the consumption bus

use std::sync::Arc;
use zigbee_core::cluster::{id, metering_attrs};
use zigbee_core::{
    AttributeCache, AttributeValue, Cluster, ClusterContext, ClusterError, ClusterType,
    ConsumptionListener, ZclHeader,
};

/// Summation multiplier advertised to consumers
pub const MULTIPLIER: u32 = 1;
/// Summation divisor advertised to consumers; readings arrive in kWh
pub const DIVISOR: u32 = 1000;

static CONSTANT_ATTRIBUTES: [(u16, AttributeValue); 5] = [
    // kWh
    (metering_attrs::UNIT_OF_MEASURE, AttributeValue::Enum8(0)),
    (metering_attrs::MULTIPLIER, AttributeValue::Uint24(MULTIPLIER)),
    (metering_attrs::DIVISOR, AttributeValue::Uint24(DIVISOR)),
    // Read from the plug: 4 digits left of the point, 3 right
    (
        metering_attrs::SUMMATION_FORMATTING,
        AttributeValue::Bitmap8(0b0_0100_011),
    ),
    // Electric metering
    (metering_attrs::METERING_DEVICE_TYPE, AttributeValue::Bitmap8(0)),
];

/// Convert a kWh reading into the raw current-summation value.
///
/// Consumers compute `raw * MULTIPLIER / DIVISOR`, so the raw value is
/// `kwh * DIVISOR / MULTIPLIER`, rounded half to even. Readings that are
/// negative, not finite, or beyond uint48 are rejected.
pub fn kwh_to_summation(kwh: f64) -> Result<u64, ClusterError> {
    if !kwh.is_finite() || kwh < 0.0 {
        return Err(ClusterError::InvalidReading(kwh));
    }

    let raw = (kwh * f64::from(DIVISOR) / f64::from(MULTIPLIER)).round_ties_even();
    if raw > AttributeValue::UINT48_MAX as f64 {
        return Err(ClusterError::InvalidReading(kwh));
    }
    Ok(raw as u64)
}

/// Metering cluster whose current summation mirrors the device's consumption bus
#[derive(Debug)]
pub struct PtvoMeteringCluster {
    attributes: AttributeCache,
}

impl PtvoMeteringCluster {
    pub const CLUSTER_ID: u16 = id::METERING;
    pub const NAME: &'static str = "PtvoMeteringCluster";
    pub const CURRENT_SUMM_DELIVERED_ID: u16 = metering_attrs::CURRENT_SUMM_DELIVERED;

    /// Create the cluster and subscribe it to the device's consumption bus
    #[must_use]
    pub fn new(ctx: &ClusterContext) -> Arc<Self> {
        tracing::info!("PtvoMeteringCluster init on EP{}", ctx.endpoint_id);

        let cluster = Arc::new(Self {
            attributes: ctx.attribute_cache(Self::CLUSTER_ID),
        });
        let listener = Arc::downgrade(&cluster);
        ctx.consumption_bus.subscribe(listener);

        // Default value so the sensor entity can be created before the first reading
        cluster
            .attributes
            .update(Self::CURRENT_SUMM_DELIVERED_ID, AttributeValue::Uint48(0));
        cluster
    }

    #[must_use]
    pub fn cluster_type() -> ClusterType {
        ClusterType {
            cluster_id: Self::CLUSTER_ID,
            name: Self::NAME,
            build: build_metering,
        }
    }

    /// Raw current summation delivered
    #[must_use]
    pub fn current_summation(&self) -> Option<u64> {
        self.attributes
            .get(Self::CURRENT_SUMM_DELIVERED_ID)
            .and_then(|v| v.as_u64())
    }
}

fn build_metering(ctx: &ClusterContext) -> Arc<dyn Cluster> {
    PtvoMeteringCluster::new(ctx)
}

impl ConsumptionListener for PtvoMeteringCluster {
    fn consumption_reported(&self, value: f64) -> Result<(), ClusterError> {
        tracing::info!("PtvoMeteringCluster consumption_reported: {} kWh", value);

        let raw = kwh_to_summation(value)?;
        self.attributes
            .update(Self::CURRENT_SUMM_DELIVERED_ID, AttributeValue::Uint48(raw));
        Ok(())
    }
}

impl Cluster for PtvoMeteringCluster {
    fn cluster_id(&self) -> u16 {
        Self::CLUSTER_ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }

    fn constant_attributes(&self) -> &[(u16, AttributeValue)] {
        &CONSTANT_ATTRIBUTES
    }

    // State only changes through the consumption bus, never through traffic on this cluster

    fn handle_cluster_request(&self, header: &ZclHeader, payload: &[u8]) {
        tracing::info!(
            "PtvoMeteringCluster handle_cluster_request: header: {} - payload: {:02x?}",
            header,
            payload
        );
    }

    fn handle_general_request(&self, header: &ZclHeader, payload: &[u8]) {
        tracing::info!(
            "PtvoMeteringCluster handle_general_request: header: {} - payload: {:02x?}",
            header,
            payload
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;
    use zigbee_core::ConsumptionBus;

    fn context() -> ClusterContext {
        let (event_tx, _) = broadcast::channel(16);
        ClusterContext {
            ieee_address: [0x42; 8],
            endpoint_id: 1,
            consumption_bus: Arc::new(ConsumptionBus::new()),
            event_tx,
        }
    }

    fn constants(cluster: &PtvoMeteringCluster) -> Vec<Option<AttributeValue>> {
        [0x0300, 0x0301, 0x0302, 0x0303, 0x0306]
            .iter()
            .map(|id| cluster.read_attribute(*id))
            .collect()
    }

    #[test]
    fn test_summation_defaults_to_zero() {
        let cluster = PtvoMeteringCluster::new(&context());
        assert_eq!(
            cluster.read_attribute(PtvoMeteringCluster::CURRENT_SUMM_DELIVERED_ID),
            Some(AttributeValue::Uint48(0))
        );
    }

    #[test]
    fn test_reading_scaled_by_divisor() {
        let cluster = PtvoMeteringCluster::new(&context());
        for (kwh, raw) in [(0.0, 0), (1.234, 1234), (0.0004, 0), (12.3456, 12346), (250.0, 250_000)] {
            cluster.consumption_reported(kwh).unwrap();
            assert_eq!(cluster.current_summation(), Some(raw), "reading {kwh}");
        }
    }

    #[test]
    fn test_last_write_wins() {
        let cluster = PtvoMeteringCluster::new(&context());
        cluster.consumption_reported(9.5).unwrap();
        cluster.consumption_reported(0.75).unwrap();
        assert_eq!(cluster.current_summation(), Some(750));
    }

    #[test]
    fn test_half_rounds_to_even() {
        assert_eq!(kwh_to_summation(0.0005), Ok(0));
        assert_eq!(kwh_to_summation(0.0025), Ok(2));
        assert_eq!(kwh_to_summation(2.5), Ok(2500));
    }

    #[test]
    fn test_invalid_readings_rejected() {
        let cluster = PtvoMeteringCluster::new(&context());
        cluster.consumption_reported(3.0).unwrap();

        for bad in [-0.001, f64::NAN, f64::INFINITY, 1e15] {
            assert!(cluster.consumption_reported(bad).is_err());
        }
        assert_eq!(cluster.current_summation(), Some(3000));
    }

    #[test]
    fn test_constants_survive_updates() {
        let cluster = PtvoMeteringCluster::new(&context());
        let before = constants(&cluster);
        assert_eq!(
            before,
            vec![
                Some(AttributeValue::Enum8(0)),
                Some(AttributeValue::Uint24(1)),
                Some(AttributeValue::Uint24(1000)),
                Some(AttributeValue::Bitmap8(0b0010_0011)),
                Some(AttributeValue::Bitmap8(0)),
            ]
        );

        for v in [1.0, 2.0, 0.5] {
            cluster.consumption_reported(v).unwrap();
        }
        // A cache write can't shadow a constant
        cluster
            .attributes()
            .update(metering_attrs::DIVISOR, AttributeValue::Uint24(1));
        assert_eq!(constants(&cluster), before);
    }

    #[test]
    fn test_registers_once_per_construction() {
        let ctx = context();
        let first = PtvoMeteringCluster::new(&ctx);
        assert_eq!(ctx.consumption_bus.listener_count(), 1);
        let second = PtvoMeteringCluster::new(&ctx);
        assert_eq!(ctx.consumption_bus.listener_count(), 2);

        assert_eq!(ctx.consumption_bus.publish(0.1), 2);
        assert_eq!(first.current_summation(), Some(100));
        assert_eq!(second.current_summation(), Some(100));
    }

    #[test]
    fn test_requests_do_not_touch_state() {
        let cluster = PtvoMeteringCluster::new(&context());
        cluster.consumption_reported(1.0).unwrap();

        // Report attributes carrying current summation = 5
        let report = [0x18, 0x01, 0x0A, 0x00, 0x00, 0x25, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
        let (hdr, payload) = ZclHeader::parse(&report).unwrap();
        cluster.handle_general_request(&hdr, payload);

        let (hdr, payload) = ZclHeader::parse(&[0x01, 0x02, 0x00, 0xFF]).unwrap();
        cluster.handle_cluster_request(&hdr, payload);

        assert_eq!(cluster.current_summation(), Some(1000));
        assert_eq!(cluster.attributes().len(), 1);
    }
}
