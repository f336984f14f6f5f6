//! ZCL frame header and attribute record decoding

use crate::attribute::AttributeValue;
use crate::cluster::{DataType, Direction, FrameType, GlobalCommand};
use crate::error::ZclError;

/// Parsed ZCL frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZclHeader {
    pub frame_control: u8,
    pub manufacturer_code: Option<u16>,
    pub transaction_seq: u8,
    pub command_id: u8,
}

impl ZclHeader {
    /// Parse a ZCL header from raw ASDU bytes, returning it with the payload
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), ZclError> {
        if data.len() < 3 {
            return Err(ZclError::FrameTooShort(data.len()));
        }

        let frame_control = data[0];
        let mut idx = 1;

        // Manufacturer-specific (bit 2)
        let manufacturer_code = if (frame_control & 0x04) != 0 {
            if data.len() < idx + 4 {
                return Err(ZclError::FrameTooShort(data.len()));
            }
            let code = u16::from_le_bytes([data[idx], data[idx + 1]]);
            idx += 2;
            Some(code)
        } else {
            None
        };

        let transaction_seq = data[idx];
        let command_id = data[idx + 1];
        idx += 2;

        let header = Self {
            frame_control,
            manufacturer_code,
            transaction_seq,
            command_id,
        };
        Ok((header, &data[idx..]))
    }

    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        if (self.frame_control & 0x03) == 0x01 {
            FrameType::ClusterSpecific
        } else {
            FrameType::Global
        }
    }

    #[must_use]
    pub fn is_cluster_specific(&self) -> bool {
        self.frame_type() == FrameType::ClusterSpecific
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        if (self.frame_control & 0x08) != 0 {
            Direction::ServerToClient
        } else {
            Direction::ClientToServer
        }
    }

    #[must_use]
    pub fn disable_default_response(&self) -> bool {
        (self.frame_control & 0x10) != 0
    }

    /// The global command, for non cluster-specific frames
    #[must_use]
    pub fn general_command(&self) -> Option<GlobalCommand> {
        if self.is_cluster_specific() {
            return None;
        }
        GlobalCommand::try_from(self.command_id).ok()
    }
}

impl std::fmt::Display for ZclHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<ZCLHeader frame_type={:?} direction={:?} tsn={} command_id={:#04x}",
            self.frame_type(),
            self.direction(),
            self.transaction_seq,
            self.command_id
        )?;
        if let Some(code) = self.manufacturer_code {
            write!(f, " manufacturer={code:#06x}")?;
        }
        write!(f, ">")
    }
}

/// Decode a single typed value, returning it and the number of bytes consumed
pub fn read_value(type_id: u8, data: &[u8]) -> Result<(AttributeValue, usize), ZclError> {
    let data_type = DataType::try_from(type_id).map_err(ZclError::UnsupportedDataType)?;

    if data_type == DataType::String {
        let len = *data.first().ok_or(ZclError::FrameTooShort(data.len()))? as usize;
        // 0xFF marks an invalid string
        if len == 0xFF {
            return Ok((AttributeValue::String(String::new()), 1));
        }
        let bytes = data
            .get(1..1 + len)
            .ok_or(ZclError::FrameTooShort(data.len()))?;
        let text = std::str::from_utf8(bytes).map_err(|_| ZclError::InvalidString)?;
        return Ok((AttributeValue::String(text.to_string()), 1 + len));
    }

    let width = data_type.fixed_len().unwrap_or(0);
    let raw = data.get(..width).ok_or(ZclError::FrameTooShort(data.len()))?;
    let mut wide = [0u8; 8];
    wide[..width].copy_from_slice(raw);
    let unsigned = u64::from_le_bytes(wide);

    let value = match data_type {
        DataType::NoData => return Err(ZclError::UnsupportedDataType(type_id)),
        DataType::Boolean => AttributeValue::Bool(raw[0] != 0),
        DataType::Bitmap8 => AttributeValue::Bitmap8(raw[0]),
        DataType::Bitmap16 => AttributeValue::Bitmap16(unsigned as u16),
        DataType::Uint8 => AttributeValue::Uint8(raw[0]),
        DataType::Uint16 => AttributeValue::Uint16(unsigned as u16),
        DataType::Uint24 => AttributeValue::Uint24(unsigned as u32),
        DataType::Uint32 => AttributeValue::Uint32(unsigned as u32),
        DataType::Uint48 => AttributeValue::Uint48(unsigned),
        DataType::Int8 => AttributeValue::Int8(raw[0] as i8),
        DataType::Int16 => AttributeValue::Int16(unsigned as u16 as i16),
        DataType::Int32 => AttributeValue::Int32(unsigned as u32 as i32),
        DataType::Enum8 => AttributeValue::Enum8(raw[0]),
        DataType::Float32 => AttributeValue::Float32(f32::from_bits(unsigned as u32)),
        DataType::String => unreachable!(),
    };
    Ok((value, width))
}

/// Decode the records of a Report Attributes (0x0A) payload
pub fn parse_attribute_reports(payload: &[u8]) -> Result<Vec<(u16, AttributeValue)>, ZclError> {
    let mut records = Vec::new();
    let mut idx = 0;

    while idx < payload.len() {
        if payload.len() < idx + 3 {
            return Err(ZclError::FrameTooShort(payload.len()));
        }
        let attribute_id = u16::from_le_bytes([payload[idx], payload[idx + 1]]);
        let type_id = payload[idx + 2];
        idx += 3;

        let (value, used) = read_value(type_id, &payload[idx..])?;
        idx += used;
        records.push((attribute_id, value));
    }

    Ok(records)
}

/// Decode the successful records of a Read Attributes Response (0x01) payload
pub fn parse_read_attributes_response(
    payload: &[u8],
) -> Result<Vec<(u16, AttributeValue)>, ZclError> {
    let mut records = Vec::new();
    let mut idx = 0;

    while idx < payload.len() {
        if payload.len() < idx + 3 {
            return Err(ZclError::FrameTooShort(payload.len()));
        }
        let attribute_id = u16::from_le_bytes([payload[idx], payload[idx + 1]]);
        let status = payload[idx + 2];
        idx += 3;

        // Failed records carry no type or value
        if status != 0 {
            continue;
        }

        let type_id = *payload
            .get(idx)
            .ok_or(ZclError::FrameTooShort(payload.len()))?;
        idx += 1;
        let (value, used) = read_value(type_id, &payload[idx..])?;
        idx += used;
        records.push((attribute_id, value));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_header() {
        // Report attributes, server to client, disable default response
        let (hdr, payload) = ZclHeader::parse(&[0x18, 0x2A, 0x0A, 0x00, 0x00]).unwrap();
        assert_eq!(hdr.frame_type(), FrameType::Global);
        assert_eq!(hdr.direction(), Direction::ServerToClient);
        assert!(hdr.disable_default_response());
        assert_eq!(hdr.transaction_seq, 0x2A);
        assert_eq!(hdr.general_command(), Some(GlobalCommand::ReportAttributes));
        assert_eq!(payload, &[0x00, 0x00]);
    }

    #[test]
    fn test_parse_manufacturer_specific_header() {
        let (hdr, payload) = ZclHeader::parse(&[0x05, 0x0B, 0x10, 0x07, 0x42]).unwrap();
        assert!(hdr.is_cluster_specific());
        assert_eq!(hdr.manufacturer_code, Some(0x100B));
        assert_eq!(hdr.command_id, 0x42);
        assert_eq!(hdr.general_command(), None);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_header_too_short() {
        assert_eq!(
            ZclHeader::parse(&[0x00, 0x01]),
            Err(ZclError::FrameTooShort(2))
        );
        assert_eq!(
            ZclHeader::parse(&[0x04, 0x0B, 0x10]),
            Err(ZclError::FrameTooShort(3))
        );
    }

    #[test]
    fn test_parse_reports() {
        let payload = [
            0x00, 0x00, 0x25, 0xD2, 0x04, 0x00, 0x00, 0x00, 0x00, // uint48 1234
            0x05, 0x00, 0x42, 0x03, b'a', b'b', b'c', // string "abc"
            0x55, 0x00, 0x10, 0x01, // bool true
        ];
        let records = parse_attribute_reports(&payload).unwrap();
        assert_eq!(
            records,
            vec![
                (0x0000, AttributeValue::Uint48(1234)),
                (0x0005, AttributeValue::String("abc".into())),
                (0x0055, AttributeValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_parse_reports_truncated_value() {
        let payload = [0x00, 0x00, 0x21, 0x01];
        assert_eq!(
            parse_attribute_reports(&payload),
            Err(ZclError::FrameTooShort(1))
        );
    }

    #[test]
    fn test_parse_reports_unknown_type() {
        let payload = [0x00, 0x00, 0xE2, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(
            parse_attribute_reports(&payload),
            Err(ZclError::UnsupportedDataType(0xE2))
        );
    }

    #[test]
    fn test_parse_read_response_skips_failures() {
        let payload = [
            0x04, 0x00, 0x86, // unsupported attribute
            0x55, 0x00, 0x00, 0x39, 0x00, 0x00, 0xC0, 0x3F, // float 1.5
        ];
        let records = parse_read_attributes_response(&payload).unwrap();
        assert_eq!(records, vec![(0x0055, AttributeValue::Float32(1.5))]);
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(
            read_value(0x29, &[0xFE, 0xFF]).unwrap(),
            (AttributeValue::Int16(-2), 2)
        );
        assert_eq!(
            read_value(0x28, &[0x80]).unwrap(),
            (AttributeValue::Int8(-128), 1)
        );
    }
}
