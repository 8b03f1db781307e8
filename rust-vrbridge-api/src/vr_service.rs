use crate::{DriverKind, DriverSession};

// Builds driver sessions for one backend. Registered with the controller
// once per backend; the controller asks for a fresh session on every connect.
pub trait DriverSessionCreator {
    fn kind(&self) -> DriverKind;

    fn new_session(&self) -> Box<dyn DriverSession>;
}
