//! Runtime configuration of the controller and the host attributes that feed it.

use crate::error::VRError;
use crate::{DriverKind, VREye, VRFieldOfView, VRPose};
use std::fmt;
use std::time::Duration;

/// Eye poses used whenever no driver has supplied real ones, so the host
/// always gets a renderable stereo pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct OfflineEyeModel {
    pub head_position: [f32; 3],
    // Distance of each eye from the head center along x.
    pub eye_offset: f32,
    pub field_of_view: VRFieldOfView,
}

impl Default for OfflineEyeModel {
    fn default() -> OfflineEyeModel {
        OfflineEyeModel {
            head_position: [0.0, 1.59, -0.095],
            eye_offset: 0.305,
            field_of_view: VRFieldOfView::default(),
        }
    }
}

impl OfflineEyeModel {
    /// Tracking-space pose of `eye`, identity orientation.
    pub fn eye_pose(&self, eye: VREye) -> VRPose {
        let [x, y, z] = self.head_position;
        let offset = match eye {
            VREye::Left => -self.eye_offset,
            VREye::Right => self.eye_offset,
        };
        VRPose::from_position([x + offset, y, z])
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde-serialization", serde(default))]
pub struct VRConfig {
    pub near_clip: f32,
    pub far_clip: f32,
    pub preferred_driver: DriverKind,
    // Never fall back to the other backend.
    pub prefer_only: bool,
    // Render target size used until a driver has been configured.
    pub default_dimensions: (u32, u32),
    pub detect_timeout_ms: u64,
    pub offline_eyes: OfflineEyeModel,
}

impl Default for VRConfig {
    fn default() -> VRConfig {
        VRConfig {
            near_clip: 0.15,
            far_clip: 100.0,
            preferred_driver: DriverKind::Oculus,
            prefer_only: false,
            default_dimensions: (1920, 1080),
            detect_timeout_ms: 250,
            offline_eyes: OfflineEyeModel::default(),
        }
    }
}

impl VRConfig {
    pub fn detect_timeout(&self) -> Duration {
        Duration::from_millis(self.detect_timeout_ms)
    }

    /// Builds a configuration from construction-time host attributes.
    /// Returns the configuration, whether `connected 1` was requested, and the
    /// attributes that were rejected.
    pub fn from_attributes<'a, I>(attributes: I) -> (VRConfig, bool, Vec<VRError>)
        where I: IntoIterator<Item = (&'a str, &'a AttributeValue)>
    {
        let mut config = VRConfig::default();
        let mut connect = false;
        let mut errors = Vec::new();
        for (name, value) in attributes {
            match Attribute::parse(name, value) {
                Ok(Attribute::Connected(c)) => connect = c,
                Ok(attribute) => config.apply(&attribute),
                Err(e) => errors.push(e),
            }
        }
        (config, connect, errors)
    }

    /// Applies a configuration attribute. `connected` is not configuration and is ignored here.
    pub fn apply(&mut self, attribute: &Attribute) {
        match *attribute {
            Attribute::NearClip(near) => self.near_clip = near,
            Attribute::FarClip(far) => self.far_clip = far,
            Attribute::Driver(kind) => self.preferred_driver = kind,
            Attribute::PreferOnly(only) => self.prefer_only = only,
            Attribute::Connected(_) => {}
        }
    }
}

/// A host attribute value, independent of the host's own atom encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Symbol(String),
}

impl AttributeValue {
    fn as_f32(&self) -> Option<f32> {
        match *self {
            AttributeValue::Int(i) => Some(i as f32),
            AttributeValue::Float(f) if f.is_finite() => Some(f as f32),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match *self {
            AttributeValue::Int(i) => Some(i != 0),
            AttributeValue::Float(f) => Some(f != 0.0),
            AttributeValue::Symbol(ref s) => match s.as_str() {
                "true" | "on" => Some(true),
                "false" | "off" => Some(false),
                _ => None,
            },
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Symbol(ref s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute {
    NearClip(f32),
    FarClip(f32),
    Driver(DriverKind),
    PreferOnly(bool),
    Connected(bool),
}

impl Attribute {
    pub fn parse(name: &str, value: &AttributeValue) -> Result<Attribute, VRError> {
        let invalid = || VRError::InvalidAttributeValue {
            name: name.to_owned(),
            value: value.to_string(),
        };
        match name {
            "near_clip" => value.as_f32().filter(|v| *v > 0.0).map(Attribute::NearClip).ok_or_else(invalid),
            "far_clip" => value.as_f32().filter(|v| *v > 0.0).map(Attribute::FarClip).ok_or_else(invalid),
            "prefer_only" => value.as_bool().map(Attribute::PreferOnly).ok_or_else(invalid),
            "connected" => value.as_bool().map(Attribute::Connected).ok_or_else(invalid),
            "driver" => match *value {
                AttributeValue::Symbol(ref s) => {
                    DriverKind::from_name(s).map(Attribute::Driver).ok_or_else(|| VRError::UnknownDriver(s.clone()))
                }
                _ => Err(invalid()),
            },
            _ => Err(VRError::UnknownAttribute(name.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_eyes_straddle_the_head() {
        let model = OfflineEyeModel::default();
        assert_eq!(model.eye_pose(VREye::Left).position, [-0.305, 1.59, -0.095]);
        assert_eq!(model.eye_pose(VREye::Right).position, [0.305, 1.59, -0.095]);
    }

    #[test]
    fn attributes_build_a_config() {
        let near = AttributeValue::Float(0.1);
        let driver = AttributeValue::Symbol("SteamVR".into());
        let connected = AttributeValue::Int(1);
        let attributes = vec![("near_clip", &near), ("driver", &driver), ("connected", &connected)];
        let (config, connect, errors) = VRConfig::from_attributes(attributes);
        assert!(errors.is_empty());
        assert!(connect);
        assert!((config.near_clip - 0.1).abs() < 1e-6);
        assert_eq!(config.preferred_driver, DriverKind::OpenVR);
        assert_eq!(config.far_clip, 100.0);
    }

    #[test]
    fn bad_attributes_are_reported() {
        let bogus = AttributeValue::Symbol("cardboard".into());
        let negative = AttributeValue::Float(-1.0);
        assert_eq!(Attribute::parse("driver", &bogus), Err(VRError::UnknownDriver("cardboard".into())));
        assert!(Attribute::parse("far_clip", &negative).is_err());
        assert_eq!(Attribute::parse("fov", &negative), Err(VRError::UnknownAttribute("fov".into())));
    }
}
