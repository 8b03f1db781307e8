mod gpu;
mod oculus;
mod openvr;
mod state;

pub use self::gpu::MockGpuContext;
pub use self::oculus::MockOculusRuntime;
pub use self::openvr::MockOpenVRRuntime;
pub use self::state::{MockVRState, MockVRStateHandle};
