//! End-to-end wizard runs against a recording window and backend

use bootmaker::animator::Surface;
use bootmaker::chrome::{ChromeCapabilities, ChromePolicy, SystemMenuRule};
use bootmaker::controller::ControllerSettings;
use bootmaker::gateway::{self, BackendGateway, EventReceiver, GatewayAdapter, Notifier, RequestId};
use bootmaker::{
    ErrorCode, InstallOutcome, InstallRequest, StepEvent, WizardController, WizardError,
    WizardShell, WizardState,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

const WIDTH: i32 = 440;

#[derive(Debug)]
struct Panel {
    x: i32,
    visible: bool,
}

#[derive(Clone)]
struct Page(Rc<RefCell<Panel>>);

impl Surface for Page {
    fn width(&self) -> i32 {
        WIDTH
    }

    fn x(&self) -> i32 {
        self.0.borrow().x
    }

    fn move_to(&mut self, x: i32) {
        self.0.borrow_mut().x = x;
    }

    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }
}

struct RecordingShell {
    pages: HashMap<WizardState, Page>,
    chrome: Vec<ChromeCapabilities>,
    indicator: Vec<u32>,
    progress: Vec<u8>,
    results: Vec<InstallOutcome>,
    presented: usize,
}

impl RecordingShell {
    fn new() -> Self {
        let pages = WizardState::ALL
            .into_iter()
            .map(|state| {
                let first = state == WizardState::SourceSelect;
                let panel = Panel {
                    x: if first { 0 } else { WIDTH },
                    visible: first,
                };
                (state, Page(Rc::new(RefCell::new(panel))))
            })
            .collect();

        Self {
            pages,
            chrome: Vec::new(),
            indicator: Vec::new(),
            progress: Vec::new(),
            results: Vec::new(),
            presented: 0,
        }
    }

    fn panel(&self, state: WizardState) -> (i32, bool) {
        let panel = self.pages[&state].0.borrow();
        (panel.x, panel.visible)
    }

    fn last_chrome(&self) -> ChromeCapabilities {
        *self.chrome.last().expect("chrome applied")
    }
}

impl WizardShell for RecordingShell {
    type Surface = Page;

    fn surface(&self, step: WizardState) -> Page {
        self.pages[&step].clone()
    }

    fn apply_chrome(&mut self, chrome: ChromeCapabilities) {
        self.chrome.push(chrome);
    }

    fn present(&mut self) {
        self.presented += 1;
    }

    fn set_page(&mut self, page: u32) {
        self.indicator.push(page);
    }

    fn show_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn update_result(&mut self, outcome: &InstallOutcome) {
        self.results.push(outcome.clone());
    }

    fn request_frames(&mut self) {}
}

#[derive(Default)]
struct BackendLog {
    requests: Vec<InstallRequest>,
    notifiers: Vec<Notifier>,
    cancelled: Vec<RequestId>,
}

/// Backend double; the test keeps a second handle on the same log
#[derive(Clone, Default)]
struct RecordingBackend {
    log: Rc<RefCell<BackendLog>>,
}

impl RecordingBackend {
    fn take_notifier(&self) -> Notifier {
        self.log.borrow_mut().notifiers.pop().expect("an install request")
    }

    fn requests(&self) -> Vec<InstallRequest> {
        self.log.borrow().requests.clone()
    }

    fn cancelled(&self) -> Vec<RequestId> {
        self.log.borrow().cancelled.clone()
    }
}

impl BackendGateway for RecordingBackend {
    fn start_install(&mut self, request: InstallRequest, notifier: Notifier) {
        let mut log = self.log.borrow_mut();
        log.requests.push(request);
        log.notifiers.push(notifier);
    }

    fn cancel(&mut self, request: RequestId) {
        self.log.borrow_mut().cancelled.push(request);
    }
}

type Wizard = WizardController<RecordingShell, RecordingBackend>;

fn wizard_with(policy: ChromePolicy) -> (Wizard, RecordingBackend, EventReceiver) {
    let (tx, rx) = gateway::channel();
    let backend = RecordingBackend::default();
    let settings = ControllerSettings {
        slide_duration: Duration::from_millis(300),
        chrome: policy,
    };
    let wizard = WizardController::new(
        RecordingShell::new(),
        GatewayAdapter::new(backend.clone(), tx),
        settings,
    );
    (wizard, backend, rx)
}

fn wizard() -> (Wizard, RecordingBackend, EventReceiver) {
    wizard_with(ChromePolicy::new(true, SystemMenuRule::Keep))
}

/// Hand everything queued on the backend channel to the controller,
/// as the UI thread would.
fn pump(wizard: &mut Wizard, rx: &mut EventReceiver) {
    while let Ok(event) = rx.try_recv() {
        wizard.handle_backend_event(event);
    }
}

/// Drives `start -> source -> device` and takes the backend's notifier.
fn to_installing(wizard: &mut Wizard, backend: &RecordingBackend) -> Notifier {
    wizard.start().unwrap();
    wizard.on_source_chosen("/tmp/image.iso").unwrap();
    wizard.on_device_chosen("sdb1", true).unwrap();
    backend.take_notifier()
}

fn settle_animation(wizard: &mut Wizard) {
    assert!(!wizard.tick(Instant::now() + Duration::from_secs(5)));
}

#[test]
fn chrome_matches_table_in_every_reachable_state() {
    for (policy, menu) in [
        (ChromePolicy::new(true, SystemMenuRule::Keep), true),
        (ChromePolicy::new(true, SystemMenuRule::Hide), false),
        (ChromePolicy::new(false, SystemMenuRule::Keep), false),
    ] {
        let (mut wizard, backend, mut rx) = wizard_with(policy);
        let open = ChromeCapabilities {
            closable: true,
            maximizable: false,
            system_menu: menu,
        };
        let locked = ChromeCapabilities {
            closable: false,
            maximizable: false,
            system_menu: false,
        };

        wizard.start().unwrap();
        assert_eq!(wizard.shell().last_chrome(), open);
        wizard.on_source_chosen("/tmp/image.iso").unwrap();
        assert_eq!(wizard.shell().last_chrome(), open);
        wizard.on_device_chosen("sdb1", true).unwrap();
        let notifier = backend.take_notifier();
        assert_eq!(wizard.shell().last_chrome(), locked);
        assert_eq!(wizard.chrome(), locked);

        notifier.finished(InstallOutcome::new(ErrorCode::DeviceMountFailed, "Mount", "failed"));
        pump(&mut wizard, &mut rx);
        assert_eq!(wizard.state(), WizardState::Result);
        assert_eq!(wizard.shell().last_chrome(), open);
    }
}

#[test]
fn device_trigger_outside_device_step_changes_nothing() {
    let (mut wizard, backend, _rx) = wizard();
    wizard.start().unwrap();

    let before = wizard.context().clone();
    let err = wizard.on_device_chosen("sdb1", true).unwrap_err();
    assert!(matches!(err, WizardError::UnexpectedTrigger { .. }));
    assert_eq!(wizard.state(), WizardState::SourceSelect);
    assert_eq!(wizard.context(), &before);
    assert!(backend.requests().is_empty());
}

#[test]
fn second_device_trigger_while_installing_is_a_no_op() {
    let (mut wizard, backend, _rx) = wizard();
    wizard.start().unwrap();
    wizard.on_source_chosen("/tmp/image.iso").unwrap();
    wizard.on_device_chosen("sdb1", true).unwrap();
    let outstanding = wizard.outstanding_request().expect("request outstanding");
    let context = wizard.context().clone();

    let err = wizard.on_device_chosen("sdc", false).unwrap_err();
    assert_eq!(err, WizardError::RequestOutstanding(outstanding));
    assert_eq!(wizard.state(), WizardState::Installing);
    assert_eq!(wizard.context(), &context);
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(wizard.outstanding_request(), Some(outstanding));
}

#[test]
fn scenario_a_happy_path() {
    let (mut wizard, backend, mut rx) = wizard();
    wizard.start().unwrap();
    assert_eq!(wizard.shell().presented, 1);
    assert_eq!(wizard.state(), WizardState::SourceSelect);

    wizard.on_source_chosen("/tmp/image.iso").unwrap();
    assert_eq!(wizard.state(), WizardState::DeviceSelect);
    assert_eq!(wizard.context().source(), Some(Path::new("/tmp/image.iso")));
    settle_animation(&mut wizard);

    wizard.on_device_chosen("sdb1", true).unwrap();
    assert_eq!(wizard.state(), WizardState::Installing);
    assert_eq!(
        wizard.shell().last_chrome(),
        ChromeCapabilities {
            closable: false,
            maximizable: false,
            system_menu: false,
        }
    );
    assert_eq!(
        backend.requests(),
        vec![InstallRequest {
            source: "/tmp/image.iso".into(),
            auxiliary: None,
            device_id: "sdb1".into(),
            format: true,
        }]
    );
    let device = wizard.context().device().unwrap();
    assert_eq!((device.device_id.as_str(), device.format), ("sdb1", true));

    let notifier = backend.take_notifier();
    notifier.progress(40);
    notifier.finished(InstallOutcome::new(ErrorCode::NoError, "Done", ""));
    pump(&mut wizard, &mut rx);

    assert_eq!(wizard.state(), WizardState::Result);
    assert_eq!(wizard.shell().progress, vec![40]);
    assert_eq!(
        wizard.shell().results,
        vec![InstallOutcome::new(ErrorCode::NoError, "Done", "")]
    );
    assert!(wizard.context().outcome().unwrap().is_success());
    assert_eq!(wizard.outstanding_request(), None);
    assert_eq!(wizard.shell().indicator, vec![0, 1, 2, 2]);
}

#[test]
fn scenario_b_cancel_then_late_outcome_is_ignored() {
    let (mut wizard, backend, mut rx) = wizard();
    let notifier = to_installing(&mut wizard, &backend);
    let request = notifier.request();

    wizard
        .dispatch(StepEvent::CancelRequested {
            title: "title".into(),
            description: "description".into(),
        })
        .unwrap();

    let cancelled = InstallOutcome::new(ErrorCode::OperationExecutionFailed, "title", "description");
    assert_eq!(wizard.state(), WizardState::Result);
    assert_eq!(wizard.context().outcome(), Some(&cancelled));
    assert_eq!(backend.cancelled(), vec![request]);
    assert!(wizard.shell().last_chrome().closable);

    // the backend ignores the cancel, keeps reporting and succeeds anyway
    notifier.progress(80);
    notifier.finished(InstallOutcome::new(ErrorCode::NoError, "Done", ""));
    pump(&mut wizard, &mut rx);

    // and a progress widget relays it directly as well
    let late = wizard.on_install_outcome(InstallOutcome::new(ErrorCode::NoError, "Done", ""));
    assert!(matches!(late, Err(WizardError::UnexpectedTrigger { .. })));

    assert_eq!(wizard.state(), WizardState::Result);
    assert_eq!(wizard.context().outcome(), Some(&cancelled));
    assert_eq!(wizard.shell().results, vec![cancelled]);
    assert!(wizard.shell().progress.is_empty());
}

#[test]
fn failure_outcome_is_presented_verbatim() {
    let (mut wizard, backend, mut rx) = wizard();
    let notifier = to_installing(&mut wizard, &backend);

    notifier.finished(InstallOutcome::new(
        ErrorCode::DeviceSizeError,
        "Not enough space",
        "The image needs 4.2 GB, the device has 2 GB.",
    ));
    pump(&mut wizard, &mut rx);

    let outcome = wizard.context().outcome().unwrap();
    assert_eq!(outcome.code, ErrorCode::DeviceSizeError);
    assert_eq!(outcome.title, "Not enough space");
    assert_eq!(outcome.description, "The image needs 4.2 GB, the device has 2 GB.");
}

#[test]
fn progress_widget_finish_event_settles_the_request() {
    let (mut wizard, backend, mut rx) = wizard();
    let notifier = to_installing(&mut wizard, &backend);

    wizard
        .dispatch(StepEvent::Finished {
            code: ErrorCode::SourceExtractionFailed.as_u32(),
            title: "Broken image".into(),
            description: "squashfs is truncated".into(),
        })
        .unwrap();
    assert_eq!(wizard.state(), WizardState::Result);
    assert_eq!(wizard.outstanding_request(), None);

    // the same outcome arriving through the backend channel is a duplicate
    notifier.finished(InstallOutcome::new(ErrorCode::NoError, "Done", ""));
    pump(&mut wizard, &mut rx);
    assert_eq!(
        wizard.context().outcome().unwrap().code,
        ErrorCode::SourceExtractionFailed
    );
    assert_eq!(wizard.shell().results.len(), 1);
}

#[test]
fn slide_positions_after_each_transition() {
    let (mut wizard, _backend, _rx) = wizard();
    wizard.start().unwrap();
    wizard.on_source_chosen("/tmp/image.iso").unwrap();
    assert!(wizard.is_animating());
    settle_animation(&mut wizard);

    assert_eq!(wizard.shell().panel(WizardState::SourceSelect), (-WIDTH, false));
    assert_eq!(wizard.shell().panel(WizardState::DeviceSelect), (0, true));

    // the next trigger arrives before the slide is over: it is completed first
    wizard.on_device_chosen("sdb1", false).unwrap();
    assert!(wizard.is_animating());
    wizard.on_cancel_requested("Stopped", "").unwrap();
    assert_eq!(wizard.shell().panel(WizardState::DeviceSelect), (-WIDTH, false));
    settle_animation(&mut wizard);

    assert_eq!(wizard.shell().panel(WizardState::Installing), (-WIDTH, false));
    assert_eq!(wizard.shell().panel(WizardState::Result), (0, true));
}

#[test]
fn device_trigger_after_close_is_refused() {
    let (mut wizard, backend, mut rx) = wizard();
    wizard.start().unwrap();
    wizard.on_source_chosen("/tmp/image.iso").unwrap();

    assert!(wizard.on_close_requested());
    assert_eq!(wizard.on_device_chosen("sdb1", true), Err(WizardError::GatewayDetached));
    assert_eq!(wizard.state(), WizardState::DeviceSelect);
    pump(&mut wizard, &mut rx);
    assert!(backend.requests().is_empty());
}

#[test]
fn backend_events_after_close_are_discarded() {
    let (mut wizard, backend, mut rx) = wizard();
    let notifier = to_installing(&mut wizard, &backend);

    wizard
        .dispatch(StepEvent::CancelRequested {
            title: "Stopped".into(),
            description: "".into(),
        })
        .unwrap();
    assert!(wizard.on_close_requested());

    notifier.progress(90);
    notifier.finished(InstallOutcome::new(ErrorCode::NoError, "Done", ""));
    pump(&mut wizard, &mut rx);

    let cancelled = InstallOutcome::new(ErrorCode::OperationExecutionFailed, "Stopped", "");
    assert_eq!(wizard.state(), WizardState::Result);
    assert_eq!(wizard.context().outcome(), Some(&cancelled));
    assert_eq!(wizard.shell().results, vec![cancelled]);
    assert!(wizard.shell().progress.is_empty());
}
