//! Observers notified after registry calls.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};
use wanaku_core::ServiceTarget;

pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Hooks run synchronously right after the matching registry call.
pub trait RegistrationCallback: Send + Sync {
    fn on_ping(&self, _target: &ServiceTarget, _status: u16) -> CallbackResult {
        Ok(())
    }

    fn on_registration(&self, _target: &ServiceTarget) -> CallbackResult {
        Ok(())
    }

    fn on_deregistration(&self, _target: &ServiceTarget, _status: u16) -> CallbackResult {
        Ok(())
    }
}

/// Ordered list of callbacks. A failing or panicking callback is logged and
/// the remaining ones still run.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<Vec<Arc<dyn RegistrationCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: Arc<dyn RegistrationCallback>) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_ping(&self, target: &ServiceTarget, status: u16) {
        self.dispatch("ping", |cb| cb.on_ping(target, status));
    }

    pub fn notify_registration(&self, target: &ServiceTarget) {
        self.dispatch("registration", |cb| cb.on_registration(target));
    }

    pub fn notify_deregistration(&self, target: &ServiceTarget, status: u16) {
        self.dispatch("deregistration", |cb| cb.on_deregistration(target, status));
    }

    fn dispatch<F>(&self, event: &'static str, call: F)
    where
        F: Fn(&dyn RegistrationCallback) -> CallbackResult,
    {
        // Snapshot so callbacks may register further callbacks.
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, callback) in callbacks.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| call(callback.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(event, index, error = %e, "registration callback failed"),
                Err(_) => warn!(event, index, "registration callback panicked"),
            }
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.len())
            .finish()
    }
}

/// Logs every lifecycle event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallback;

impl RegistrationCallback for LoggingCallback {
    fn on_ping(&self, target: &ServiceTarget, status: u16) -> CallbackResult {
        info!(service = %target.service_name, id = target.id(), status, "ping sent");
        Ok(())
    }

    fn on_registration(&self, target: &ServiceTarget) -> CallbackResult {
        info!(service = %target.service_name, id = target.id(), address = %target.address(), "registered");
        Ok(())
    }

    fn on_deregistration(&self, target: &ServiceTarget, status: u16) -> CallbackResult {
        info!(service = %target.service_name, id = target.id(), status, "deregistered");
        Ok(())
    }
}
