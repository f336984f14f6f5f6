//! ZCL (Zigbee Cluster Library) definitions

/// Common ZCL cluster IDs
pub mod id {
    // General Clusters
    pub const BASIC: u16 = 0x0000;
    pub const POWER_CONFIG: u16 = 0x0001;
    pub const IDENTIFY: u16 = 0x0003;
    pub const GROUPS: u16 = 0x0004;
    pub const SCENES: u16 = 0x0005;
    pub const ON_OFF: u16 = 0x0006;
    pub const ANALOG_INPUT: u16 = 0x000C;
    pub const ANALOG_OUTPUT: u16 = 0x000D;
    pub const ANALOG_VALUE: u16 = 0x000E;
    pub const BINARY_INPUT: u16 = 0x000F;
    pub const MULTISTATE_INPUT: u16 = 0x0012;
    pub const MULTISTATE_OUTPUT: u16 = 0x0013;
    pub const MULTISTATE_VALUE: u16 = 0x0014;

    // Smart Energy
    pub const METERING: u16 = 0x0702;
    pub const ELECTRICAL_MEASUREMENT: u16 = 0x0B04;
}

/// Human readable cluster name, for logs
#[must_use]
pub fn name(cluster_id: u16) -> &'static str {
    match cluster_id {
        id::BASIC => "basic",
        id::POWER_CONFIG => "power_config",
        id::IDENTIFY => "identify",
        id::GROUPS => "groups",
        id::SCENES => "scenes",
        id::ON_OFF => "on_off",
        id::ANALOG_INPUT => "analog_input",
        id::ANALOG_OUTPUT => "analog_output",
        id::ANALOG_VALUE => "analog_value",
        id::BINARY_INPUT => "binary_input",
        id::MULTISTATE_INPUT => "multistate_input",
        id::MULTISTATE_OUTPUT => "multistate_output",
        id::MULTISTATE_VALUE => "multistate_value",
        id::METERING => "smartenergy_metering",
        id::ELECTRICAL_MEASUREMENT => "electrical_measurement",
        _ => "unknown",
    }
}

/// Profile IDs
pub mod profile {
    pub const ZDO: u16 = 0x0000;
    pub const HOME_AUTOMATION: u16 = 0x0104;
}

/// Home Automation device type IDs
pub mod device_type {
    pub const ON_OFF_SWITCH: u16 = 0x0000;
    pub const SMART_PLUG: u16 = 0x0051;
    pub const METER_INTERFACE: u16 = 0x0053;
    /// Used by custom firmwares that don't map onto a standard type
    pub const UNSPECIFIED: u16 = 0xFFFE;
}

/// Basic cluster attributes
pub mod basic_attrs {
    pub const ZCL_VERSION: u16 = 0x0000;
    pub const APPLICATION_VERSION: u16 = 0x0001;
    pub const STACK_VERSION: u16 = 0x0002;
    pub const HW_VERSION: u16 = 0x0003;
    pub const MANUFACTURER_NAME: u16 = 0x0004;
    pub const MODEL_IDENTIFIER: u16 = 0x0005;
    pub const DATE_CODE: u16 = 0x0006;
    pub const POWER_SOURCE: u16 = 0x0007;
    pub const SW_BUILD_ID: u16 = 0x4000;
}

/// Metering cluster attributes
pub mod metering_attrs {
    pub const CURRENT_SUMM_DELIVERED: u16 = 0x0000;
    pub const CURRENT_SUMM_RECEIVED: u16 = 0x0001;
    pub const INSTANTANEOUS_DEMAND: u16 = 0x0400;
    pub const UNIT_OF_MEASURE: u16 = 0x0300;
    pub const MULTIPLIER: u16 = 0x0301;
    pub const DIVISOR: u16 = 0x0302;
    pub const SUMMATION_FORMATTING: u16 = 0x0303;
    pub const DEMAND_FORMATTING: u16 = 0x0304;
    pub const METERING_DEVICE_TYPE: u16 = 0x0306;
}

/// ZCL Frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Global = 0x00,
    ClusterSpecific = 0x01,
}

/// ZCL Direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    ClientToServer = 0x00,
    ServerToClient = 0x01,
}

/// ZCL Global commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GlobalCommand {
    ReadAttributes = 0x00,
    ReadAttributesResponse = 0x01,
    WriteAttributes = 0x02,
    WriteAttributesUndivided = 0x03,
    WriteAttributesResponse = 0x04,
    WriteAttributesNoResponse = 0x05,
    ConfigureReporting = 0x06,
    ConfigureReportingResponse = 0x07,
    ReadReportingConfig = 0x08,
    ReadReportingConfigResponse = 0x09,
    ReportAttributes = 0x0A,
    DefaultResponse = 0x0B,
    DiscoverAttributes = 0x0C,
    DiscoverAttributesResponse = 0x0D,
}

impl TryFrom<u8> for GlobalCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(GlobalCommand::ReadAttributes),
            0x01 => Ok(GlobalCommand::ReadAttributesResponse),
            0x02 => Ok(GlobalCommand::WriteAttributes),
            0x03 => Ok(GlobalCommand::WriteAttributesUndivided),
            0x04 => Ok(GlobalCommand::WriteAttributesResponse),
            0x05 => Ok(GlobalCommand::WriteAttributesNoResponse),
            0x06 => Ok(GlobalCommand::ConfigureReporting),
            0x07 => Ok(GlobalCommand::ConfigureReportingResponse),
            0x08 => Ok(GlobalCommand::ReadReportingConfig),
            0x09 => Ok(GlobalCommand::ReadReportingConfigResponse),
            0x0A => Ok(GlobalCommand::ReportAttributes),
            0x0B => Ok(GlobalCommand::DefaultResponse),
            0x0C => Ok(GlobalCommand::DiscoverAttributes),
            0x0D => Ok(GlobalCommand::DiscoverAttributesResponse),
            _ => Err(value),
        }
    }
}

/// ZCL status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Success = 0x00,
    Failure = 0x01,
    UnsupportedAttribute = 0x86,
}

/// ZCL data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    NoData = 0x00,
    Boolean = 0x10,
    Bitmap8 = 0x18,
    Bitmap16 = 0x19,
    Uint8 = 0x20,
    Uint16 = 0x21,
    Uint24 = 0x22,
    Uint32 = 0x23,
    Uint48 = 0x25,
    Int8 = 0x28,
    Int16 = 0x29,
    Int32 = 0x2B,
    Enum8 = 0x30,
    Float32 = 0x39,
    String = 0x42,
}

impl TryFrom<u8> for DataType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(DataType::NoData),
            0x10 => Ok(DataType::Boolean),
            0x18 => Ok(DataType::Bitmap8),
            0x19 => Ok(DataType::Bitmap16),
            0x20 => Ok(DataType::Uint8),
            0x21 => Ok(DataType::Uint16),
            0x22 => Ok(DataType::Uint24),
            0x23 => Ok(DataType::Uint32),
            0x25 => Ok(DataType::Uint48),
            0x28 => Ok(DataType::Int8),
            0x29 => Ok(DataType::Int16),
            0x2B => Ok(DataType::Int32),
            0x30 => Ok(DataType::Enum8),
            0x39 => Ok(DataType::Float32),
            0x42 => Ok(DataType::String),
            _ => Err(value),
        }
    }
}

impl DataType {
    /// Encoded width in bytes, `None` for variable length types
    #[must_use]
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            DataType::NoData => Some(0),
            DataType::Boolean | DataType::Bitmap8 | DataType::Uint8 | DataType::Int8 => Some(1),
            DataType::Enum8 => Some(1),
            DataType::Bitmap16 | DataType::Uint16 | DataType::Int16 => Some(2),
            DataType::Uint24 => Some(3),
            DataType::Uint32 | DataType::Int32 | DataType::Float32 => Some(4),
            DataType::Uint48 => Some(6),
            DataType::String => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_lookup() {
        assert_eq!(DataType::try_from(0x25), Ok(DataType::Uint48));
        assert_eq!(DataType::try_from(0x42), Ok(DataType::String));
        assert_eq!(DataType::try_from(0xE2), Err(0xE2));
        assert_eq!(DataType::Uint48.fixed_len(), Some(6));
        assert_eq!(DataType::String.fixed_len(), None);
    }

    #[test]
    fn test_cluster_names() {
        assert_eq!(name(id::METERING), "smartenergy_metering");
        assert_eq!(name(id::MULTISTATE_VALUE), "multistate_value");
        assert_eq!(name(0xFC00), "unknown");
    }
}
