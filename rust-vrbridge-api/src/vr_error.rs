use crate::DriverKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectError {
    #[error("no runtime is available")]
    Unavailable,
    #[error("{driver} runtime error: {message}")]
    Runtime { driver: DriverKind, message: String },
    #[error("connected but configuration failed: {0}")]
    Configure(#[from] ConfigureError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigureError {
    #[error("session is not connected")]
    NotConnected,
    #[error("runtime rejected the configuration: {0}")]
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GpuResourceError {
    #[error("no GPU context is available")]
    NoContext,
    #[error("invalid render target dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("framebuffer is incomplete (status {0:#x})")]
    IncompleteFramebuffer(u32),
    #[error("render target has not been allocated")]
    NotAllocated,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("session is not connected")]
    NotConnected,
    #[error("session has not been configured")]
    NotConfigured,
    #[error(transparent)]
    Gpu(#[from] GpuResourceError),
    #[error("display lost")]
    DisplayLost,
    #[error("compositor rejected the frame: {0}")]
    Rejected(String),
}

impl SubmitError {
    /// A fatal submit error ends the session; every other one drops a single frame.
    pub fn is_fatal(&self) -> bool {
        match *self {
            SubmitError::DisplayLost => true,
            _ => false,
        }
    }
}

// Every SessionError forces the owner to disconnect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("display lost")]
    DisplayLost,
    #[error("runtime requested the application to quit")]
    ShouldQuit,
    #[error("HMD was removed")]
    DeviceRemoved,
    #[error("runtime failure: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_display_lost_is_fatal() {
        assert!(SubmitError::DisplayLost.is_fatal());
        assert!(!SubmitError::NotConfigured.is_fatal());
        assert!(!SubmitError::Rejected("busy".into()).is_fatal());
        assert!(!SubmitError::Gpu(GpuResourceError::NoContext).is_fatal());
    }

    #[test]
    fn runtime_error_names_the_driver() {
        let err = ConnectError::Runtime {
            driver: DriverKind::OpenVR,
            message: "init failed".into(),
        };
        assert_eq!(err.to_string(), "openvr runtime error: init failed");
    }
}
