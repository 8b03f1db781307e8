use std::fmt;

/// The two mutually exclusive vendor runtimes a session can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum DriverKind {
    Oculus,
    OpenVR,
}

impl DriverKind {
    pub const ALL: [DriverKind; 2] = [DriverKind::Oculus, DriverKind::OpenVR];

    /// Resolves a host-supplied driver name. Matching is case-insensitive.
    pub fn from_name(name: &str) -> Option<DriverKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "oculus" | "oculusvr" | "rift" | "ovr" | "a" => Some(DriverKind::Oculus),
            "openvr" | "steam" | "steamvr" | "vive" | "htc" | "b" => Some(DriverKind::OpenVR),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            DriverKind::Oculus => "oculus",
            DriverKind::OpenVR => "openvr",
        }
    }

    pub fn other(&self) -> DriverKind {
        match *self {
            DriverKind::Oculus => DriverKind::OpenVR,
            DriverKind::OpenVR => DriverKind::Oculus,
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct DriverCapability {
    pub kind: DriverKind,
    pub available: bool,
    pub preferred: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_case_insensitively() {
        for name in &["Oculus", "OCULUSVR", "rift", "ovr", "A"] {
            assert_eq!(DriverKind::from_name(name), Some(DriverKind::Oculus));
        }
        for name in &["openvr", "Steam", "SteamVR", "vive", "HTC", "b"] {
            assert_eq!(DriverKind::from_name(name), Some(DriverKind::OpenVR));
        }
        assert_eq!(DriverKind::from_name("cardboard"), None);
    }

    #[test]
    fn other_swaps_backends() {
        assert_eq!(DriverKind::Oculus.other(), DriverKind::OpenVR);
        assert_eq!(DriverKind::OpenVR.other(), DriverKind::Oculus);
    }
}
