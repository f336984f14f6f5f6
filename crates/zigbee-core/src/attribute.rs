//! Attribute values and the per-cluster attribute cache

use crate::cluster::{DataType, Status};
use crate::instance::DeviceEvent;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A typed ZCL attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Bool(bool),
    Bitmap8(u8),
    Bitmap16(u16),
    Uint8(u8),
    Uint16(u16),
    Uint24(u32),
    Uint32(u32),
    Uint48(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Enum8(u8),
    Float32(f32),
    String(String),
}

impl AttributeValue {
    /// Largest value representable by a uint48 attribute
    pub const UINT48_MAX: u64 = (1 << 48) - 1;

    /// ZCL data type this value is encoded as
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Boolean,
            Self::Bitmap8(_) => DataType::Bitmap8,
            Self::Bitmap16(_) => DataType::Bitmap16,
            Self::Uint8(_) => DataType::Uint8,
            Self::Uint16(_) => DataType::Uint16,
            Self::Uint24(_) => DataType::Uint24,
            Self::Uint32(_) => DataType::Uint32,
            Self::Uint48(_) => DataType::Uint48,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Enum8(_) => DataType::Enum8,
            Self::Float32(_) => DataType::Float32,
            Self::String(_) => DataType::String,
        }
    }

    /// Numeric view of unsigned integer, bitmap and enum values
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Bitmap8(v) | Self::Uint8(v) | Self::Enum8(v) => Some(u64::from(v)),
            Self::Bitmap16(v) | Self::Uint16(v) => Some(u64::from(v)),
            Self::Uint24(v) | Self::Uint32(v) => Some(u64::from(v)),
            Self::Uint48(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of reading a single attribute
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAttributeRecord {
    pub attribute_id: u16,
    pub status: Status,
    pub value: Option<AttributeValue>,
}

/// Cached attribute state of one cluster instance.
///
/// Writes go through [`AttributeCache::update`], which also announces the
/// change on the owning device's event channel.
#[derive(Debug)]
pub struct AttributeCache {
    ieee_address: [u8; 8],
    endpoint: u8,
    cluster_id: u16,
    values: DashMap<u16, AttributeValue>,
    event_tx: broadcast::Sender<DeviceEvent>,
}

impl AttributeCache {
    #[must_use]
    pub fn new(
        ieee_address: [u8; 8],
        endpoint: u8,
        cluster_id: u16,
        event_tx: broadcast::Sender<DeviceEvent>,
    ) -> Self {
        Self {
            ieee_address,
            endpoint,
            cluster_id,
            values: DashMap::new(),
            event_tx,
        }
    }

    /// Get a cached value
    #[must_use]
    pub fn get(&self, attribute_id: u16) -> Option<AttributeValue> {
        self.values.get(&attribute_id).map(|r| r.value().clone())
    }

    #[must_use]
    pub fn contains(&self, attribute_id: u16) -> bool {
        self.values.contains_key(&attribute_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store a value and notify listeners
    pub fn update(&self, attribute_id: u16, value: AttributeValue) {
        tracing::debug!(
            "Attribute update {:#06x}/{:#06x} EP{}: {:?}",
            self.cluster_id,
            attribute_id,
            self.endpoint,
            value
        );
        self.values.insert(attribute_id, value.clone());

        // No receivers is fine
        let _ = self.event_tx.send(DeviceEvent::AttributeUpdated {
            ieee_address: self.ieee_address,
            endpoint: self.endpoint,
            cluster_id: self.cluster_id,
            attribute_id,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (AttributeCache, broadcast::Receiver<DeviceEvent>) {
        let (tx, rx) = broadcast::channel(8);
        (AttributeCache::new([1; 8], 1, 0x0702, tx), rx)
    }

    #[test]
    fn test_update_overwrites_and_notifies() {
        let (cache, mut rx) = cache();
        assert!(cache.is_empty());

        cache.update(0x0000, AttributeValue::Uint48(5));
        cache.update(0x0000, AttributeValue::Uint48(7));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(0x0000), Some(AttributeValue::Uint48(7)));

        let first = rx.try_recv().unwrap();
        assert!(matches!(
            first,
            DeviceEvent::AttributeUpdated { value: AttributeValue::Uint48(5), .. }
        ));
        let second = rx.try_recv().unwrap();
        assert!(matches!(
            second,
            DeviceEvent::AttributeUpdated {
                endpoint: 1,
                cluster_id: 0x0702,
                value: AttributeValue::Uint48(7),
                ..
            }
        ));
    }

    #[test]
    fn test_update_without_receivers() {
        let (tx, _) = broadcast::channel(8);
        let cache = AttributeCache::new([0; 8], 1, 0x0000, tx);
        cache.update(0x0004, AttributeValue::String("ptvo.info".into()));
        assert!(cache.contains(0x0004));
    }

    #[test]
    fn test_value_views() {
        assert_eq!(AttributeValue::Bitmap8(0b0010_0011).as_u64(), Some(0x23));
        assert_eq!(AttributeValue::Uint48(1234).data_type(), DataType::Uint48);
        assert_eq!(AttributeValue::Int8(-1).as_u64(), None);
    }
}
