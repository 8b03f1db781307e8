use crate::{ConfigureError, ConnectError, GpuResourceError, SessionError, SubmitError};
use thiserror::Error;

/// Everything the controller or the host boundary can report.
/// None of these are fatal to the host; they are surfaced as notifications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VRError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Configure(#[from] ConfigureError),
    #[error(transparent)]
    Gpu(#[from] GpuResourceError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("invalid value for attribute '{name}': {value}")]
    InvalidAttributeValue { name: String, value: String },
    #[error("unknown driver '{0}'")]
    UnknownDriver(String),
}
