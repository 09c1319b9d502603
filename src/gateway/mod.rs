//! Backend Gateway - boundary to the install backend
//!
//! ARCHITECTURE: backends run on their own worker thread (or process) and
//! report through a [`Notifier`], which pushes [`BackendEvent`]s into an
//! unbounded tokio channel. The UI thread awaits the receiving end and hands
//! every event to [`GatewayAdapter::accept`] before anything touches wizard
//! state. The adapter owns the "at most one outstanding request" rule and
//! drops stale, duplicate and post-teardown notifications.

pub mod command;
pub mod demo;

use crate::error::{Result, WizardError};
use crate::outcome::{InstallOutcome, InstallRequest};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use command::CommandBackend;
pub use demo::DemoBackend;

/// Identifies one accepted install request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a backend reports about a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendNotice {
    /// Percent complete, 0-100
    Progress(u8),
    Finished(InstallOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEvent {
    pub request: RequestId,
    pub notice: BackendNotice,
}

pub type EventSender = mpsc::UnboundedSender<BackendEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<BackendEvent>;

/// Channel carrying backend notifications to the UI thread
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Reporting handle for a single request.
///
/// `finished` consumes the handle, so a backend can report at most one
/// outcome per request. Dropping it without finishing reports nothing.
#[derive(Debug)]
pub struct Notifier {
    request: RequestId,
    tx: EventSender,
}

impl Notifier {
    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn progress(&self, percent: u8) {
        self.send(BackendNotice::Progress(percent.min(100)));
    }

    pub fn finished(self, outcome: InstallOutcome) {
        self.send(BackendNotice::Finished(outcome));
    }

    fn send(&self, notice: BackendNotice) {
        let event = BackendEvent {
            request: self.request,
            notice,
        };
        // Receiver gone means the window was torn down
        if self.tx.send(event).is_err() {
            debug!("Dropping notification for {}: UI is gone", self.request);
        }
    }
}

/// The install backend as seen by the wizard
pub trait BackendGateway {
    /// Begin backend readiness. Fire-and-forget.
    fn start(&mut self) {}

    /// Start one install. The backend reports through `notifier`.
    fn start_install(&mut self, request: InstallRequest, notifier: Notifier);

    /// Best-effort stop of an abandoned request
    fn cancel(&mut self, _request: RequestId) {}
}

impl<G: BackendGateway + ?Sized> BackendGateway for Box<G> {
    fn start(&mut self) {
        (**self).start()
    }

    fn start_install(&mut self, request: InstallRequest, notifier: Notifier) {
        (**self).start_install(request, notifier)
    }

    fn cancel(&mut self, request: RequestId) {
        (**self).cancel(request)
    }
}

/// An event that passed the adapter's checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Progress(u8),
    Outcome(InstallOutcome),
}

pub struct GatewayAdapter<G> {
    gateway: G,
    tx: EventSender,
    last_id: u64,
    outstanding: Option<RequestId>,
    detached: bool,
}

impl<G: BackendGateway> GatewayAdapter<G> {
    pub fn new(gateway: G, tx: EventSender) -> Self {
        Self {
            gateway,
            tx,
            last_id: 0,
            outstanding: None,
            detached: false,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn outstanding(&self) -> Option<RequestId> {
        self.outstanding
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn start(&mut self) {
        self.gateway.start();
    }

    /// Whether a new request would be accepted right now
    pub fn ensure_ready(&self) -> Result<()> {
        if self.detached {
            return Err(WizardError::GatewayDetached);
        }
        match self.outstanding {
            Some(id) => Err(WizardError::RequestOutstanding(id)),
            None => Ok(()),
        }
    }

    pub fn submit(&mut self, request: InstallRequest) -> Result<RequestId> {
        self.ensure_ready()?;

        self.last_id += 1;
        let id = RequestId(self.last_id);
        self.outstanding = Some(id);

        info!(
            "Install request {}: {:?} -> {} (format: {})",
            id, request.source, request.device_id, request.format
        );

        let notifier = Notifier {
            request: id,
            tx: self.tx.clone(),
        };
        self.gateway.start_install(request, notifier);

        Ok(id)
    }

    /// Filter an incoming event. Only notifications for the outstanding
    /// request get through; a finish settles it.
    pub fn accept(&mut self, event: BackendEvent) -> Option<Delivery> {
        if self.detached {
            debug!("Gateway detached, ignoring event for {}", event.request);
            return None;
        }

        if self.outstanding != Some(event.request) {
            warn!(
                "Ignoring stale notification for {} (outstanding: {:?})",
                event.request, self.outstanding
            );
            return None;
        }

        match event.notice {
            BackendNotice::Progress(percent) => Some(Delivery::Progress(percent)),
            BackendNotice::Finished(outcome) => {
                self.outstanding = None;
                Some(Delivery::Outcome(outcome))
            }
        }
    }

    /// Forget the outstanding request once its outcome was taken from
    /// another path (e.g. the progress widget).
    pub fn settle(&mut self) -> Option<RequestId> {
        self.outstanding.take()
    }

    /// Give up on the outstanding request and ask the backend to stop.
    pub fn abandon(&mut self) -> Option<RequestId> {
        let id = self.outstanding.take()?;
        info!("Abandoning install request {}", id);
        self.gateway.cancel(id);
        Some(id)
    }

    /// Window teardown: nothing is delivered after this.
    pub fn detach(&mut self) {
        self.abandon();
        self.detached = true;
    }
}
