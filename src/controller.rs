//! Wizard Controller
//!
//! Owns the wizard state and context for one run. Every operation runs on
//! the UI thread and completes (chrome applied, slide started) before the
//! next one is processed. Backend notifications reach the controller only
//! through [`WizardController::handle_backend_event`], after the caller has
//! moved them onto the UI thread.
//!
//! Illegal triggers are protocol violations: they are logged, returned as
//! errors and leave state and context untouched.

use crate::animator::{AnimationStatus, SlideDirection, Surface, TransitionAnimator};
use crate::chrome::{ChromeCapabilities, ChromePolicy};
use crate::error::{Result, WizardError};
use crate::gateway::{BackendEvent, BackendGateway, Delivery, GatewayAdapter, RequestId};
use crate::outcome::{InstallOutcome, InstallRequest};
use crate::state::{DeviceSelection, TransitionRequest, Trigger, WizardContext, WizardState};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The window the controller drives
pub trait WizardShell {
    type Surface: Surface;

    /// Handle to the panel showing `step`
    fn surface(&self, step: WizardState) -> Self::Surface;

    fn apply_chrome(&mut self, chrome: ChromeCapabilities);

    fn present(&mut self);

    fn set_page(&mut self, page: u32);

    fn show_progress(&mut self, percent: u8);

    /// Forwarded to the result step before it slides in
    fn update_result(&mut self, outcome: &InstallOutcome);

    /// Ask for [`WizardController::tick`] to be called on upcoming frames
    fn request_frames(&mut self);
}

/// Events raised by the step widgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    SourceChosen(PathBuf),
    DeviceChosen { device_id: String, format: bool },
    CancelRequested { title: String, description: String },
    Finished { code: u32, title: String, description: String },
    ResetRequested,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub slide_duration: Duration,
    pub chrome: ChromePolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            slide_duration: Duration::from_millis(300),
            chrome: ChromePolicy::default(),
        }
    }
}

pub struct WizardController<V: WizardShell, G: BackendGateway> {
    shell: V,
    gateway: GatewayAdapter<G>,
    animator: TransitionAnimator<V::Surface>,
    settings: ControllerSettings,
    state: WizardState,
    context: WizardContext,
    started: bool,
}

impl<V: WizardShell, G: BackendGateway> WizardController<V, G> {
    pub fn new(shell: V, gateway: GatewayAdapter<G>, settings: ControllerSettings) -> Self {
        Self {
            shell,
            gateway,
            animator: TransitionAnimator::new(SlideDirection::Left),
            settings,
            state: WizardState::SourceSelect,
            context: WizardContext::default(),
            started: false,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn context(&self) -> &WizardContext {
        &self.context
    }

    pub fn chrome(&self) -> ChromeCapabilities {
        self.settings.chrome.capabilities(self.state)
    }

    pub fn shell(&self) -> &V {
        &self.shell
    }

    pub fn gateway(&self) -> &G {
        self.gateway.gateway()
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        self.gateway.outstanding()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    /// Show the first step. May only be called once.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return self.reject(WizardError::AlreadyStarted);
        }
        self.started = true;
        self.state = WizardState::SourceSelect;

        let chrome = self.chrome();
        self.shell.apply_chrome(chrome);
        self.shell.set_page(self.state.page_index());
        self.shell.present();
        self.gateway.start();

        info!("Wizard started");
        Ok(())
    }

    pub fn on_source_chosen(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let next = self.expect(Trigger::SourceChosen)?;
        let path = path.into();
        if path.as_os_str().is_empty() {
            return self.reject(WizardError::EmptySourcePath);
        }

        debug!("Source chosen: {:?}", path);
        if let Err(e) = self.context.set_source(path) {
            return self.reject(e);
        }
        self.enter(next);
        Ok(())
    }

    /// Lock the chrome, slide to the progress step and issue one install request.
    pub fn on_device_chosen(&mut self, device_id: &str, format: bool) -> Result<()> {
        if self.state == WizardState::Installing {
            if let Some(id) = self.gateway.outstanding() {
                return self.reject(WizardError::RequestOutstanding(id));
            }
        }
        let next = self.expect(Trigger::DeviceChosen)?;
        if device_id.trim().is_empty() {
            return self.reject(WizardError::EmptyDeviceId);
        }
        if let Err(e) = self.gateway.ensure_ready() {
            return self.reject(e);
        }
        let Some(source) = self.context.source().map(PathBuf::from) else {
            return self.reject(WizardError::UnexpectedTrigger {
                trigger: Trigger::DeviceChosen,
                state: self.state,
            });
        };

        let selection = DeviceSelection {
            device_id: device_id.to_string(),
            format,
        };
        if let Err(e) = self.context.set_device(selection) {
            return self.reject(e);
        }
        self.enter(next);

        let request = InstallRequest {
            source,
            auxiliary: None,
            device_id: device_id.to_string(),
            format,
        };
        if let Err(e) = self.gateway.submit(request) {
            // ensure_ready passed above, so this only trips on a broken gateway
            warn!("Install request refused: {}", e);
        }
        Ok(())
    }

    /// Apply the terminal outcome of the outstanding install.
    pub fn on_install_outcome(&mut self, outcome: InstallOutcome) -> Result<()> {
        let next = self.expect(Trigger::InstallOutcome)?;
        self.gateway.settle();
        self.finish(next, outcome)
    }

    /// Proceed to the result step with a failure outcome right away. The
    /// backend is asked to stop, but may not.
    pub fn on_cancel_requested(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<()> {
        let next = self.expect(Trigger::CancelRequested)?;
        self.gateway.abandon();
        info!("Install cancelled by user");
        self.finish(next, InstallOutcome::cancelled(title, description))
    }

    /// Start a new run from the result step.
    pub fn reset(&mut self) -> Result<()> {
        let next = self.expect(Trigger::Reset)?;
        self.context.clear();
        self.enter(next);
        Ok(())
    }

    pub fn dispatch(&mut self, event: StepEvent) -> Result<()> {
        match event {
            StepEvent::SourceChosen(path) => self.on_source_chosen(path),
            StepEvent::DeviceChosen { device_id, format } => {
                self.on_device_chosen(&device_id, format)
            }
            StepEvent::CancelRequested { title, description } => {
                self.on_cancel_requested(title, description)
            }
            StepEvent::Finished {
                code,
                title,
                description,
            } => match InstallOutcome::from_raw(code, title, description) {
                Ok(outcome) => self.on_install_outcome(outcome),
                Err(e) => self.reject(e),
            },
            StepEvent::ResetRequested => self.reset(),
        }
    }

    /// Entry point for notifications taken off the backend channel.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match self.gateway.accept(event) {
            Some(Delivery::Progress(percent)) => {
                if self.state == WizardState::Installing {
                    self.shell.show_progress(percent);
                }
            }
            Some(Delivery::Outcome(outcome)) => {
                // already logged as a violation if it no longer applies
                let _ = self.on_install_outcome(outcome);
            }
            None => {}
        }
    }

    /// Whether the window may close now. Closing detaches the backend.
    pub fn on_close_requested(&mut self) -> bool {
        if !self.chrome().closable {
            info!("Close refused while {:?}", self.state);
            return false;
        }
        self.animator.finish_now();
        self.gateway.detach();
        true
    }

    /// Advance the running slide. Returns whether more frames are needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.animator.tick(now) == AnimationStatus::Running
    }

    fn finish(&mut self, next: WizardState, outcome: InstallOutcome) -> Result<()> {
        if outcome.is_success() {
            info!("Install finished: {}", outcome.title);
        } else {
            warn!(
                "Install failed ({}): {} {}",
                outcome.code, outcome.title, outcome.description
            );
        }

        self.shell.update_result(&outcome);
        if let Err(e) = self.context.set_outcome(outcome) {
            return self.reject(e);
        }
        self.enter(next);
        Ok(())
    }

    /// Checks the trigger against the transition table.
    fn expect(&self, trigger: Trigger) -> Result<WizardState> {
        if !self.started {
            return self.reject(WizardError::NotStarted);
        }
        match self.state.next(trigger) {
            Some(next) => Ok(next),
            None => self.reject(WizardError::UnexpectedTrigger {
                trigger,
                state: self.state,
            }),
        }
    }

    fn reject<T>(&self, error: WizardError) -> Result<T> {
        warn!("Protocol violation in {:?}: {}", self.state, error);
        Err(error)
    }

    fn enter(&mut self, next: WizardState) {
        let previous = std::mem::replace(&mut self.state, next);
        debug!("Wizard {:?} -> {:?}", previous, next);

        let chrome = self.settings.chrome.capabilities(next);
        self.shell.apply_chrome(chrome);
        self.shell.set_page(next.page_index());
        self.slide(TransitionRequest {
            from: previous,
            to: next,
        });
    }

    fn slide(&mut self, request: TransitionRequest) {
        if !request.is_valid_for(self.state) {
            warn!("Skipping invalid transition {:?}", request);
            return;
        }

        if self.animator.finish_now() {
            debug!("Completed previous slide early");
        }

        let outgoing = self.shell.surface(request.from);
        let incoming = self.shell.surface(request.to);

        match self
            .animator
            .begin(outgoing, incoming, self.settings.slide_duration, Instant::now())
        {
            Ok(AnimationStatus::Running) => self.shell.request_frames(),
            Ok(_) => {}
            Err(e) => warn!("Could not start slide: {}", e),
        }
    }
}
