//! Typed payloads of well-known endpoints

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Endpoint segment of the device information call
pub const DEVICE_INFO_ENDPOINT: &str = "device_info";
/// Raw payload key of the device information call
pub const DEVICE_INFO_DATA_KEY: &str = "deviceInfo";
/// Endpoint segment of the VLAN configuration call
pub const VLAN_ENDPOINT: &str = "swcfg_vlan";
/// Raw payload key of the VLAN configuration call
pub const VLAN_DATA_KEY: &str = "switchConfigVlan";
/// Endpoint segment of the logout call
pub const LOGOUT_ENDPOINT: &str = "logout";
/// Raw payload key of the logout call
pub const LOGOUT_DATA_KEY: &str = "logout";

// ============================================================================
// Device Info
// ============================================================================

/// Hardware details, operational status and sensor readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub serial_number: String,
    pub mac_addr: String,
    pub model: String,
    /// Active firmware version
    pub sw_ver: String,
    pub num_of_ports: u32,
    pub num_of_active_ports: u32,
    /// Percentage string, e.g. `"90.58%"`
    pub memory_usage: String,
    /// Percentage string, e.g. `"17.53%"`
    pub cpu_usage: String,
    /// One map per fan, e.g. `{"FAN-1": "Operational"}`
    pub fan_state: Vec<HashMap<String, String>>,
    pub poe_state: bool,
    /// e.g. `"00 Days 01 Hrs 07 Mins 11 Secs"`
    pub up_time: String,
    pub temperature_sensors: Vec<TemperatureSensor>,
    pub boot_version: String,
    /// Bytes received
    pub rx_data: u64,
    /// Bytes transmitted
    pub tx_data: u64,
}

/// One temperature sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureSensor {
    pub sensor_num: u32,
    /// MAC-A, MAC-B or System
    pub sensor_desc: String,
    /// Degrees Celsius
    pub sensor_temp: i32,
    pub sensor_state: SensorState,
}

/// Operational state of a temperature sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SensorState {
    None = 0,
    Normal = 1,
    Warning = 2,
    Critical = 3,
    Shutdown = 4,
    NotPresent = 5,
    NotOperational = 6,
}

impl TryFrom<u8> for SensorState {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(SensorState::None),
            1 => Ok(SensorState::Normal),
            2 => Ok(SensorState::Warning),
            3 => Ok(SensorState::Critical),
            4 => Ok(SensorState::Shutdown),
            5 => Ok(SensorState::NotPresent),
            6 => Ok(SensorState::NotOperational),
            other => Err(format!("unknown sensor state {other}")),
        }
    }
}

impl From<SensorState> for u8 {
    fn from(state: SensorState) -> Self {
        state as u8
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SensorState::None => "none",
            SensorState::Normal => "normal",
            SensorState::Warning => "warning",
            SensorState::Critical => "critical",
            SensorState::Shutdown => "shutdown",
            SensorState::NotPresent => "not present",
            SensorState::NotOperational => "not operational",
        };
        f.write_str(label)
    }
}

// ============================================================================
// VLAN
// ============================================================================

/// VLAN configuration as read from and written to `swcfg_vlan`
///
/// Optional fields left as `None` are omitted when writing, so the device
/// keeps its current value for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanConfig {
    pub vlan_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_vlan_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_voip_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_video_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub igmp_config: Option<IgmpConfig>,
}

impl VlanConfig {
    /// VLAN with only an ID
    pub fn new(vlan_id: u16) -> Self {
        Self {
            vlan_id,
            ..Self::default()
        }
    }

    /// Set the VLAN name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// IGMP snooping settings of a VLAN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgmpConfig {
    pub igmp_state: bool,
}
