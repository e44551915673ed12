//! Registration lifecycle: restore identity, register with bounded retries,
//! heartbeat, report health and deregister on shutdown.
//!
//! Every lifecycle operation runs under one async mutex that also owns the
//! `ServiceTarget`, so a shutdown path never races a scheduled tick on the
//! same id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use wanaku_core::{
    Deserializer, JsonCodec, ServiceState, ServiceTarget, WanakuError, WanakuResponse, WanakuResult,
};
use wanaku_store::InstanceIdentityStore;

use crate::callbacks::{CallbackRegistry, RegistrationCallback};
use crate::config::RegistrationConfig;
use crate::transport::RegistryTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
    Stopped,
}

struct Lifecycle {
    state: RegistrationState,
    target: ServiceTarget,
}

struct Shared<D> {
    transport: Arc<dyn RegistryTransport>,
    store: InstanceIdentityStore,
    config: RegistrationConfig,
    callbacks: CallbackRegistry,
    deserializer: D,
    lifecycle: Mutex<Lifecycle>,
}

pub struct RegistrationManager<D = JsonCodec> {
    shared: Arc<Shared<D>>,
    stop: watch::Sender<bool>,
    schedule: StdMutex<Option<JoinHandle<WanakuResult<()>>>>,
    started: AtomicBool,
}

impl RegistrationManager<JsonCodec> {
    pub fn new(
        target: ServiceTarget,
        config: RegistrationConfig,
        transport: Arc<dyn RegistryTransport>,
    ) -> WanakuResult<Self> {
        Self::with_deserializer(target, config, transport, JsonCodec)
    }
}

impl<D: Deserializer + 'static> RegistrationManager<D> {
    pub fn with_deserializer(
        target: ServiceTarget,
        config: RegistrationConfig,
        transport: Arc<dyn RegistryTransport>,
        deserializer: D,
    ) -> WanakuResult<Self> {
        let store = InstanceIdentityStore::new(&config.data_dir, &target.service_name)?;
        let state = if target.has_id() {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        };
        let (stop, _) = watch::channel(false);

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                store,
                config,
                callbacks: CallbackRegistry::new(),
                deserializer,
                lifecycle: Mutex::new(Lifecycle { state, target }),
            }),
            stop,
            schedule: StdMutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    pub fn add_callback(&self, callback: Arc<dyn RegistrationCallback>) {
        self.shared.callbacks.add(callback);
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.shared.callbacks
    }

    pub fn identity_store(&self) -> &InstanceIdentityStore {
        &self.shared.store
    }

    pub async fn state(&self) -> RegistrationState {
        self.shared.lifecycle.lock().await.state
    }

    /// Snapshot of the target as currently known, including any assigned id.
    pub async fn target(&self) -> ServiceTarget {
        self.shared.lifecycle.lock().await.target.clone()
    }

    /// Restores a persisted identity and schedules `register()` on a
    /// background task: first after the initial delay, then every period.
    ///
    /// Identity-file errors are returned; they are not retried. A manager is
    /// scheduled at most once.
    pub async fn start(&self) -> WanakuResult<()> {
        self.shared.config.validate()?;

        if *self.stop.borrow() {
            warn!("registration manager already stopped, not scheduling");
            return Ok(());
        }
        if self.started.load(Ordering::Acquire) {
            warn!("registration already scheduled");
            return Ok(());
        }

        self.shared.restore_identity().await?;

        let shared = Arc::clone(&self.shared);
        let stop = self.stop.subscribe();
        let handle = tokio::spawn(run_schedule(shared, stop));
        *self.schedule.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        self.started.store(true, Ordering::Release);

        info!(
            initial_delay_secs = self.shared.config.initial_delay_seconds,
            period_secs = self.shared.config.period_seconds,
            "registration scheduled"
        );
        Ok(())
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the scheduled task to end and returns its outcome: `Ok` once
    /// stopped by `deregister()`, the identity-file error that ended it
    /// otherwise. Returns `Ok` at once when nothing is scheduled.
    ///
    /// The handle is taken, so only the first caller sees the outcome.
    pub async fn stopped(&self) -> WanakuResult<()> {
        let handle = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => handle.await.map_err(WanakuError::other)?,
            None => Ok(()),
        }
    }

    /// Pings when already registered, otherwise runs the bounded retry loop.
    ///
    /// Registry failures are logged and swallowed; only identity-file
    /// failures are returned.
    pub async fn register(&self) -> WanakuResult<()> {
        self.shared.register().await
    }

    pub async fn ping(&self) {
        let lifecycle = self.shared.lifecycle.lock().await;
        self.shared.ping_locked(&lifecycle).await;
    }

    /// Stops the schedule, then deregisters if an id was ever assigned.
    /// Never fails; an in-flight tick is allowed to finish first.
    pub async fn deregister(&self) {
        self.stop.send_replace(true);
        self.shared.deregister().await;
    }

    pub async fn last_as_fail(&self, reason: impl Into<String>) {
        self.shared.report_state(ServiceState::unhealthy(reason)).await;
    }

    pub async fn last_as_successful(&self) {
        self.shared.report_state(ServiceState::healthy()).await;
    }
}

impl<D> Drop for RegistrationManager<D> {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

async fn run_schedule<D: Deserializer>(
    shared: Arc<Shared<D>>,
    mut stop: watch::Receiver<bool>,
) -> WanakuResult<()> {
    let config = &shared.config;
    let mut ticks = time::interval_at(Instant::now() + config.initial_delay(), config.period());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticks.tick() => {}
        }
        if *stop.borrow() {
            break;
        }

        if let Err(e) = shared.register().await {
            error!(error = %e, "identity storage failed, stopping registration schedule");
            return Err(e);
        }
    }

    debug!("registration schedule finished");
    Ok(())
}

impl<D: Deserializer> Shared<D> {
    async fn restore_identity(&self) -> WanakuResult<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state != RegistrationState::Unregistered || lifecycle.target.has_id() {
            return Ok(());
        }

        if let Some(entry) = self.store.read()? {
            info!(
                service = %lifecycle.target.service_name,
                id = entry.id(),
                path = %self.store.path().display(),
                "restored persisted service identity"
            );
            lifecycle.target.id = Some(entry.into_id());
            lifecycle.state = RegistrationState::Registered;
        }
        Ok(())
    }

    async fn register(&self) -> WanakuResult<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        match lifecycle.state {
            RegistrationState::Stopped => {
                debug!("manager stopped, skipping registration tick");
                Ok(())
            }
            RegistrationState::Registered => {
                self.ping_locked(&lifecycle).await;
                Ok(())
            }
            RegistrationState::Unregistered => self.register_with_retries(&mut lifecycle).await,
        }
    }

    async fn register_with_retries(&self, lifecycle: &mut Lifecycle) -> WanakuResult<()> {
        let mut retries_left = self.config.max_retries;

        loop {
            match self.try_register(&lifecycle.target).await {
                Ok(id) => return self.complete_registration(lifecycle, id),
                Err(e) => warn!(
                    service = %lifecycle.target.service_name,
                    retries_left,
                    error = %e,
                    "registration attempt failed"
                ),
            }

            if retries_left == 0 {
                break;
            }
            time::sleep(self.config.wait()).await;
            retries_left -= 1;
        }

        error!(
            service = %lifecycle.target.service_name,
            attempts = u64::from(self.config.max_retries) + 1,
            "could not register with the discovery service, will try again on the next tick"
        );
        Ok(())
    }

    /// One registration call. Returns the id assigned by the registry.
    async fn try_register(&self, target: &ServiceTarget) -> WanakuResult<String> {
        let mut request = target.clone();
        request.id = None;

        let reply = self.transport.register(&request).await?;
        if !reply.is_success() {
            return Err(WanakuError::from_status(reply.status, reply.body));
        }

        let envelope: WanakuResponse<ServiceTarget> = self.deserializer.deserialize(&reply.body)?;
        if let Some(err) = envelope.error {
            return Err(WanakuError::InvalidResponseData(format!(
                "registry reported an error: {}",
                err.message
            )));
        }

        envelope
            .data
            .and_then(|assigned| assigned.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                WanakuError::InvalidResponseData("registry reply carries no service id".to_string())
            })
    }

    fn complete_registration(&self, lifecycle: &mut Lifecycle, id: String) -> WanakuResult<()> {
        info!(service = %lifecycle.target.service_name, %id, "registered with the discovery service");
        lifecycle.target.id = Some(id);
        lifecycle.state = RegistrationState::Registered;

        self.store.write(&lifecycle.target)?;
        self.callbacks.notify_registration(&lifecycle.target);
        Ok(())
    }

    async fn ping_locked(&self, lifecycle: &Lifecycle) {
        let Some(id) = lifecycle.target.id() else {
            warn!(service = %lifecycle.target.service_name, "no service id yet, skipping ping");
            return;
        };

        match self.transport.ping(id).await {
            Ok(reply) => {
                if reply.is_success() {
                    debug!(id, status = reply.status, "ping acknowledged");
                } else {
                    warn!(id, status = reply.status, body = %reply.body, "ping rejected by the discovery service");
                }
                self.callbacks.notify_ping(&lifecycle.target, reply.status);
            }
            Err(e) => warn!(id, error = %e, "ping failed"),
        }
    }

    async fn deregister(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state == RegistrationState::Stopped {
            debug!("already deregistered");
            return;
        }

        if lifecycle.target.has_id() {
            match self.transport.deregister(&lifecycle.target).await {
                Ok(reply) => {
                    if reply.is_success() {
                        info!(id = lifecycle.target.id(), "deregistered from the discovery service");
                    } else {
                        warn!(
                            id = lifecycle.target.id(),
                            status = reply.status,
                            body = %reply.body,
                            "deregistration rejected by the discovery service"
                        );
                    }
                    self.callbacks.notify_deregistration(&lifecycle.target, reply.status);
                }
                Err(e) => warn!(id = lifecycle.target.id(), error = %e, "deregistration failed"),
            }
        } else {
            debug!(service = %lifecycle.target.service_name, "never registered, nothing to deregister");
        }

        lifecycle.state = RegistrationState::Stopped;
    }

    async fn report_state(&self, state: ServiceState) {
        let lifecycle = self.lifecycle.lock().await;
        let Some(id) = lifecycle.target.id() else {
            warn!(
                service = %lifecycle.target.service_name,
                healthy = state.healthy,
                "no service id yet, cannot report state"
            );
            return;
        };

        match self.transport.update_state(id, &state).await {
            Ok(reply) if reply.is_success() => debug!(id, healthy = state.healthy, "state reported"),
            Ok(reply) => warn!(id, status = reply.status, body = %reply.body, "state update rejected"),
            Err(e) => warn!(id, error = %e, "state update failed"),
        }
    }
}
