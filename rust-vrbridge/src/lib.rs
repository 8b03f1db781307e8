#[macro_use]
extern crate log;
#[cfg(feature = "serde-serialization")]
#[macro_use]
extern crate serde_derive;

pub mod api;
#[cfg(feature = "audio")]
pub mod audio;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod gpu;
pub mod host;
pub mod runtime_registry;
pub mod vr_controller;

pub use rust_vrbridge_api::*;

pub use config::{Attribute, AttributeValue, OfflineEyeModel, VRConfig};
pub use error::VRError;
pub use framebuffer::FrameBufferBridge;
#[cfg(feature = "glcontext")]
pub use gpu::GleamContext;
pub use gpu::{GpuContext, RenderTarget, TextureCopy};
pub use host::{Entity, HostAdapter, HostMessage, HostOutput, Space};
pub use runtime_registry::{RuntimeLease, RuntimeRegistry};
pub use vr_controller::{ConnectionState, EntityOutput, EyeOutput, FrameOutputs, VRNotification, VrController};
