use crate::DriverKind;

// Informational metadata about the connected HMD, emitted to the host on connect.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRDeviceInfo {
    pub driver: DriverKind,
    pub name: String,
    pub serial: String,
    pub firmware: String,

    // Native panel resolution, both eyes.
    pub render_width: u32,
    pub render_height: u32,

    pub refresh_rate: Option<f32>,
}

impl VRDeviceInfo {
    pub fn new(driver: DriverKind) -> VRDeviceInfo {
        VRDeviceInfo {
            driver: driver,
            name: String::new(),
            serial: String::new(),
            firmware: String::new(),
            render_width: 0,
            render_height: 0,
            refresh_rate: None,
        }
    }
}
