//! Client front ends
//!
//! Two ways to drive the request engine:
//!
//! - [`SwitchClient`] keeps credentials and token for the caller
//! - [`call_with_token`] leaves token storage to the caller
//!
//! Plus typed models for the endpoints both of them know by name.

mod models;
mod session;
mod stateless;

pub use models::{
    DeviceInfo, IgmpConfig, SensorState, TemperatureSensor, VlanConfig, DEVICE_INFO_DATA_KEY,
    DEVICE_INFO_ENDPOINT, LOGOUT_DATA_KEY, LOGOUT_ENDPOINT, VLAN_DATA_KEY, VLAN_ENDPOINT,
};
pub use session::SwitchClient;
pub use stateless::{call_with_token, execute_with_token, logout_with_token};
