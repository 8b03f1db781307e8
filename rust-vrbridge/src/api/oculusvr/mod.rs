mod runtime;
mod session;

pub use self::runtime::*;
pub use self::session::{OculusSession, OculusSessionCreator, DEFAULT_DETECT_TIMEOUT};
