//! Process-wide bookkeeping of which vendor runtimes are initialized.
//!
//! Vendor runtimes are process singletons: they must be initialized once before
//! the first session and shut down after the last one. Sessions take a
//! [`RuntimeLease`] instead of toggling a global flag, so two sessions of the
//! same backend share one initialization.

use crate::DriverKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

static GLOBAL_REGISTRY: OnceLock<Arc<RuntimeRegistry>> = OnceLock::new();

#[derive(Default)]
pub struct RuntimeRegistry {
    leases: Mutex<HashMap<DriverKind, usize>>,
}

impl RuntimeRegistry {
    pub fn new() -> Arc<RuntimeRegistry> {
        Arc::new(RuntimeRegistry::default())
    }

    pub fn global() -> Arc<RuntimeRegistry> {
        GLOBAL_REGISTRY.get_or_init(RuntimeRegistry::new).clone()
    }

    /// Takes a lease on `kind`, running `init` if no lease is outstanding.
    /// When `init` fails no lease is taken.
    pub fn acquire<F, E>(self: &Arc<Self>, kind: DriverKind, init: F) -> Result<RuntimeLease, E>
        where F: FnOnce() -> Result<(), E>
    {
        let mut leases = self.lock();
        let count = leases.entry(kind).or_insert(0);
        if *count == 0 {
            debug!("Initializing {} runtime", kind);
            init()?;
        }
        *count += 1;
        Ok(RuntimeLease {
            registry: self.clone(),
            kind: kind,
            released: false,
        })
    }

    pub fn lease_count(&self, kind: DriverKind) -> usize {
        self.lock().get(&kind).cloned().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DriverKind, usize>> {
        // A panic while holding the lock cannot leave the counters half-updated.
        match self.leases.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Returns true when this was the last lease.
    fn decrement(&self, kind: DriverKind) -> bool {
        let mut leases = self.lock();
        match leases.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                *count == 0
            }
            _ => {
                warn!("Released a {} runtime lease that was never taken", kind);
                false
            }
        }
    }
}

pub struct RuntimeLease {
    registry: Arc<RuntimeRegistry>,
    kind: DriverKind,
    released: bool,
}

impl RuntimeLease {
    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    /// Gives the lease back, running `shutdown` if it was the last one.
    pub fn release<F: FnOnce()>(mut self, shutdown: F) {
        self.released = true;
        if self.registry.decrement(self.kind) {
            debug!("Shutting down {} runtime", self.kind);
            shutdown();
        }
    }
}

impl Drop for RuntimeLease {
    fn drop(&mut self) {
        if !self.released {
            warn!("{} runtime lease dropped without release; runtime left initialized", self.kind);
            self.registry.decrement(self.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn init_once_and_shutdown_after_last_lease() {
        let registry = RuntimeRegistry::new();
        let inits = Cell::new(0);
        let shutdowns = Cell::new(0);
        let init = || -> Result<(), String> {
            inits.set(inits.get() + 1);
            Ok(())
        };

        let first = registry.acquire(DriverKind::OpenVR, init).unwrap();
        let second = registry.acquire(DriverKind::OpenVR, init).unwrap();
        assert_eq!(inits.get(), 1);
        assert_eq!(registry.lease_count(DriverKind::OpenVR), 2);

        first.release(|| shutdowns.set(shutdowns.get() + 1));
        assert_eq!(shutdowns.get(), 0);
        second.release(|| shutdowns.set(shutdowns.get() + 1));
        assert_eq!(shutdowns.get(), 1);
        assert_eq!(registry.lease_count(DriverKind::OpenVR), 0);
    }

    #[test]
    fn failed_init_takes_no_lease() {
        let registry = RuntimeRegistry::new();
        let result = registry.acquire(DriverKind::Oculus, || Err("no service"));
        assert!(result.is_err());
        assert_eq!(registry.lease_count(DriverKind::Oculus), 0);
    }

    #[test]
    fn backends_are_counted_separately() {
        let registry = RuntimeRegistry::new();
        let lease = registry.acquire(DriverKind::Oculus, || Ok::<(), ()>(())).unwrap();
        assert_eq!(registry.lease_count(DriverKind::OpenVR), 0);
        drop(lease);
        assert_eq!(registry.lease_count(DriverKind::Oculus), 0);
    }
}
