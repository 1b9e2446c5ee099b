//! Flow coordinator implementation.
//!
//! A flow is one spawned task that runs, in order:
//! - Login (only when the session is not authenticated): fetch the QR code,
//!   run the [`AuthPoller`].
//! - Acquisition: record the task in settings, run the [`AcquisitionPoller`].
//!
//! The single-flight guard is the `active` slot. It is filled before the task
//! is spawned and emptied by the task itself when it finishes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{EventHandle, PollerEvent};
use crate::metrics;
use crate::poller::{
    AcquisitionPoller, AuthOutcome, AuthPoller, PollerConfig, PollerKind, TaskParameters,
};
use crate::session::Session;
use crate::settings::SettingsStore;

use super::types::{CoordinatorError, CoordinatorStatus, FlowOutcome, FlowResult, FlowStatus};

/// Book-keeping for the running flow.
struct ActiveFlow {
    id: Uuid,
    params: TaskParameters,
    started_at: DateTime<Utc>,
    stage: PollerKind,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Everything a flow task needs, cloned into the task.
#[derive(Clone)]
struct FlowContext {
    session: Arc<Session>,
    settings: Arc<dyn SettingsStore>,
    events: EventHandle,
    config: PollerConfig,
    active: Arc<Mutex<Option<ActiveFlow>>>,
    login_qr: Arc<RwLock<Option<Vec<u8>>>>,
    last_result: Arc<RwLock<Option<FlowResult>>>,
}

impl FlowContext {
    /// Lock the flow slot, first releasing it if its task died without doing
    /// so itself.
    async fn lock_active(&self) -> MutexGuard<'_, Option<ActiveFlow>> {
        let mut active = self.active.lock().await;
        let died = active
            .as_ref()
            .and_then(|flow| flow.handle.as_ref())
            .is_some_and(JoinHandle::is_finished);
        if died {
            self.abort(&mut active).await;
        }
        active
    }

    /// Release the slot of a flow that ended without an outcome.
    async fn abort(&self, active: &mut Option<ActiveFlow>) {
        if let Some(flow) = active.take() {
            error!("Flow {} stopped without reporting an outcome", flow.id);
            flow.cancel.cancel();
            *self.last_result.write().await = Some(FlowResult::new(
                flow.id,
                flow.params.item_id,
                FlowOutcome::Aborted,
            ));
            metrics::FLOW_RUNNING.set(0);
        }
    }
}

/// Sequences the login and acquisition pollers against the session.
///
/// All methods may be called from any task.
pub struct Coordinator {
    ctx: FlowContext,
}

impl Coordinator {
    pub fn new(
        session: Arc<Session>,
        settings: Arc<dyn SettingsStore>,
        events: EventHandle,
        config: PollerConfig,
    ) -> Self {
        Self {
            ctx: FlowContext {
                session,
                settings,
                events,
                config,
                active: Arc::new(Mutex::new(None)),
                login_qr: Arc::new(RwLock::new(None)),
                last_result: Arc::new(RwLock::new(None)),
            },
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.ctx.session
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.ctx.settings
    }

    /// Start a flow for `params`.
    ///
    /// Rejected while another flow is running.
    pub async fn start_acquisition(
        &self,
        params: TaskParameters,
    ) -> Result<Uuid, CoordinatorError> {
        params.validate()?;

        let mut active = self.ctx.lock_active().await;
        if let Some(flow) = active.as_ref() {
            warn!("Rejecting start of {}: flow {} is running", params.item_id, flow.id);
            return Err(CoordinatorError::AlreadyRunning(flow.id));
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let stage = if self.ctx.session.is_authenticated() {
            PollerKind::Acquisition
        } else {
            PollerKind::Auth
        };
        info!(
            "Starting flow {} for {} (stage: {:?})",
            id, params.item_id, stage
        );

        let handle = tokio::spawn(run_flow(
            self.ctx.clone(),
            id,
            params.clone(),
            cancel.clone(),
        ));
        *active = Some(ActiveFlow {
            id,
            params,
            started_at: Utc::now(),
            stage,
            cancel,
            handle: Some(handle),
        });
        metrics::FLOW_RUNNING.set(1);

        Ok(id)
    }

    /// Start a flow from the stored settings.
    pub async fn start_from_settings(&self) -> Result<Uuid, CoordinatorError> {
        let params = self.ctx.settings.load()?.task_parameters()?;
        self.start_acquisition(params).await
    }

    /// Request cancellation of the running flow.
    ///
    /// Returns `false` when nothing is running or cancellation was already
    /// requested. The running poller reports the cancellation itself.
    pub async fn cancel_current(&self) -> bool {
        let active = self.ctx.lock_active().await;
        match active.as_ref() {
            Some(flow) if !flow.cancel.is_cancelled() => {
                info!("Cancelling flow {} ({:?} stage)", flow.id, flow.stage);
                flow.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.ctx.lock_active().await.is_some()
    }

    /// Login QR code of the running login stage.
    pub async fn login_qr(&self) -> Option<Vec<u8>> {
        self.ctx.login_qr.read().await.clone()
    }

    pub async fn status(&self) -> CoordinatorStatus {
        let flow = self.ctx.lock_active().await.as_ref().map(|flow| FlowStatus {
            id: flow.id,
            item_id: flow.params.item_id.clone(),
            started_at: flow.started_at,
            stage: flow.stage,
            cancelling: flow.cancel.is_cancelled(),
        });

        CoordinatorStatus {
            platform: self.ctx.session.platform_name().to_string(),
            authenticated: self.ctx.session.is_authenticated(),
            flow,
            last_result: self.ctx.last_result.read().await.clone(),
        }
    }

    /// Wait for the running flow, if any, to finish.
    pub async fn wait(&self) {
        let running = {
            let mut active = self.ctx.lock_active().await;
            active
                .as_mut()
                .and_then(|flow| flow.handle.take().map(|handle| (flow.id, handle)))
        };
        if let Some((id, handle)) = running {
            if let Err(e) = handle.await {
                error!("Flow task failed: {}", e);
                let mut active = self.ctx.active.lock().await;
                if active.as_ref().is_some_and(|flow| flow.id == id) {
                    self.ctx.abort(&mut active).await;
                }
            }
        }
    }

    /// Cancel the running flow and wait for it to stop.
    pub async fn shutdown(&self) {
        info!("Stopping coordinator");
        self.cancel_current().await;
        self.wait().await;
        info!("Coordinator stopped");
    }
}

/// Body of the flow task.
async fn run_flow(
    ctx: FlowContext,
    id: Uuid,
    params: TaskParameters,
    cancel: CancellationToken,
) {
    let outcome = drive(&ctx, id, &params, cancel).await;
    debug!("Flow {} finished: {:?}", id, outcome);

    *ctx.last_result.write().await = Some(FlowResult::new(id, params.item_id, outcome));

    let mut active = ctx.active.lock().await;
    if active.as_ref().is_some_and(|flow| flow.id == id) {
        *active = None;
        metrics::FLOW_RUNNING.set(0);
    }
}

async fn drive(
    ctx: &FlowContext,
    id: Uuid,
    params: &TaskParameters,
    cancel: CancellationToken,
) -> FlowOutcome {
    if !ctx.session.is_authenticated() {
        if !cancel.is_cancelled() {
            match ctx.session.login_qr_code().await {
                Ok(qr) => *ctx.login_qr.write().await = Some(qr),
                Err(e) => {
                    warn!("Failed to fetch login QR code: {}", e);
                    ctx.events.emit(PollerEvent::LoginUnavailable {
                        error: e.to_string(),
                    });
                    return FlowOutcome::LoginUnavailable;
                }
            }
        }

        let outcome = AuthPoller::new(
            ctx.session.clone(),
            ctx.events.clone(),
            cancel.clone(),
            &ctx.config,
        )
        .run()
        .await;
        *ctx.login_qr.write().await = None;

        if outcome != AuthOutcome::Authenticated {
            return FlowOutcome::Login { outcome };
        }
    }

    if let Some(flow) = ctx.active.lock().await.as_mut().filter(|flow| flow.id == id) {
        flow.stage = PollerKind::Acquisition;
    }

    match ctx.settings.load() {
        Ok(settings) => ctx.session.set_payment_password(settings.payment_password),
        Err(e) => warn!("Failed to load settings, no payment password set: {}", e),
    }
    if let Err(e) = ctx.settings.save_task(params) {
        warn!("Failed to save task parameters: {}", e);
    }

    let outcome = AcquisitionPoller::new(
        ctx.session.clone(),
        ctx.events.clone(),
        cancel,
        params.clone(),
        &ctx.config,
    )
    .run()
    .await;

    FlowOutcome::Acquisition { outcome }
}
