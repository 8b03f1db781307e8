#[cfg(feature = "oculusvr")]
pub mod oculusvr;
#[cfg(feature = "oculusvr")]
pub use self::oculusvr::{OculusRuntime, OculusSession, OculusSessionCreator};

#[cfg(feature = "openvr")]
pub mod openvr;
#[cfg(feature = "openvr")]
pub use self::openvr::{OpenVRRuntime, OpenVRSession, OpenVRSessionCreator};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use self::mock::{MockGpuContext, MockOculusRuntime, MockOpenVRRuntime, MockVRState, MockVRStateHandle};
