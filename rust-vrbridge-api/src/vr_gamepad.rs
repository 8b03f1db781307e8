#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum VRHand {
    Left,
    Right,
}

impl VRHand {
    pub fn index(&self) -> usize {
        match *self {
            VRHand::Left => 0,
            VRHand::Right => 1,
        }
    }
}

// Button, trigger and axis state of a hand controller or tracker.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRControllerInput {
    pub buttons: Vec<VRButton>,
    // Thumbsticks and trackpads in [-1, 1], triggers in [0, 1].
    pub axes: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRButton {
    pub pressed: bool,
    pub touched: bool,
}

impl VRButton {
    pub fn from_masks(bit: u64, pressed: u64, touched: u64) -> Self {
        Self {
            pressed: pressed & bit != 0,
            touched: touched & bit != 0,
        }
    }
}
