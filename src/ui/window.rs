//! Bootmaker Window - Fixed-size wizard window
//!
//! The four step pages live side by side in a `gtk::Fixed` the size of one
//! page; the controller slides them in and out. Page signals become
//! [`StepEvent`]s and backend events arrive over the gateway channel on the
//! main loop.

use crate::animator::Surface;
use crate::chrome::ChromeCapabilities;
use crate::config::{CancelConfig, WizardConfig};
use crate::controller::{ControllerSettings, StepEvent, WizardController, WizardShell};
use crate::gateway::{self, BackendGateway, EventReceiver, GatewayAdapter};
use crate::outcome::InstallOutcome;
use crate::state::WizardState;
use crate::ui::pages::{DevicePage, ProgressPage, ResultPage, SourcePage};
use adw::prelude::*;
use gtk::glib;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// Roughly one frame at 60 Hz
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type Controller = WizardController<GtkShell, Box<dyn BackendGateway>>;

/// GTK decoration layout string for the given chrome
pub fn decoration_layout(chrome: ChromeCapabilities) -> String {
    let start = if chrome.system_menu { "icon" } else { "" };

    let mut end = Vec::new();
    if chrome.maximizable {
        end.push("maximize");
    }
    if chrome.closable {
        end.push("close");
    }

    format!("{}:{}", start, end.join(","))
}

/// A page placed inside the sliding container
pub struct FixedSurface {
    fixed: gtk::Fixed,
    child: gtk::Widget,
    width: i32,
}

impl Surface for FixedSurface {
    fn width(&self) -> i32 {
        self.width
    }

    fn x(&self) -> i32 {
        self.fixed.child_position(&self.child).0.round() as i32
    }

    fn move_to(&mut self, x: i32) {
        self.fixed.move_(&self.child, f64::from(x), 0.0);
    }

    fn set_visible(&mut self, visible: bool) {
        self.child.set_visible(visible);
    }
}

/// Calls a tick callback every frame until it reports it is done
#[derive(Clone, Default)]
struct FrameDriver {
    ticking: Rc<Cell<bool>>,
    tick: Rc<RefCell<Option<Box<dyn Fn() -> bool>>>>,
}

impl FrameDriver {
    fn set_tick<F: Fn() -> bool + 'static>(&self, f: F) {
        *self.tick.borrow_mut() = Some(Box::new(f));
    }

    fn request(&self) {
        if self.ticking.replace(true) {
            return;
        }

        let driver = self.clone();
        glib::timeout_add_local(FRAME_INTERVAL, move || {
            let more = driver.tick.borrow().as_ref().map(|tick| tick()).unwrap_or(false);
            if more {
                glib::ControlFlow::Continue
            } else {
                driver.ticking.set(false);
                glib::ControlFlow::Break
            }
        });
    }
}

/// Row of dots showing the current page
struct PageIndicator {
    container: gtk::Box,
    dots: Vec<gtk::Box>,
}

impl PageIndicator {
    fn new(pages: u32) -> Self {
        let container = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .halign(gtk::Align::Center)
            .valign(gtk::Align::Center)
            .vexpand(true)
            .build();

        let dots: Vec<gtk::Box> = (0..pages)
            .map(|_| {
                let dot = gtk::Box::builder()
                    .width_request(8)
                    .height_request(8)
                    .css_classes(["page-dot"])
                    .build();
                container.append(&dot);
                dot
            })
            .collect();

        Self { container, dots }
    }

    fn set_page(&self, page: u32) {
        for (index, dot) in self.dots.iter().enumerate() {
            if index as u32 == page {
                dot.add_css_class("active");
            } else {
                dot.remove_css_class("active");
            }
        }
    }
}

/// The controller's view of the window
pub struct GtkShell {
    window: adw::ApplicationWindow,
    header: adw::HeaderBar,
    fixed: gtk::Fixed,
    width: i32,
    source: SourcePage,
    device: DevicePage,
    progress: ProgressPage,
    result: ResultPage,
    indicator: PageIndicator,
    frames: FrameDriver,
}

impl WizardShell for GtkShell {
    type Surface = FixedSurface;

    fn surface(&self, step: WizardState) -> FixedSurface {
        let child: gtk::Widget = match step {
            WizardState::SourceSelect => self.source.clone().upcast(),
            WizardState::DeviceSelect => self.device.clone().upcast(),
            WizardState::Installing => self.progress.clone().upcast(),
            WizardState::Result => self.result.clone().upcast(),
        };

        FixedSurface {
            fixed: self.fixed.clone(),
            child,
            width: self.width,
        }
    }

    fn apply_chrome(&mut self, chrome: ChromeCapabilities) {
        self.window.set_deletable(chrome.closable);
        self.header.set_decoration_layout(Some(&decoration_layout(chrome)));
    }

    fn present(&mut self) {
        self.window.present();
    }

    fn set_page(&mut self, page: u32) {
        self.indicator.set_page(page);

        match page {
            0 => {
                self.source.reset();
                self.progress.set_progress(0);
            }
            1 => {
                self.device.refresh();
                self.progress.set_progress(0);
            }
            _ => {}
        }
    }

    fn show_progress(&mut self, percent: u8) {
        self.progress.set_progress(percent);
    }

    fn update_result(&mut self, outcome: &InstallOutcome) {
        self.result.set_outcome(outcome);
    }

    fn request_frames(&mut self) {
        self.frames.request();
    }
}

pub struct BootmakerWindow {
    window: adw::ApplicationWindow,
    controller: Rc<RefCell<Controller>>,
}

impl BootmakerWindow {
    pub fn new(app: &impl IsA<gtk::Application>, config: &WizardConfig) -> Self {
        let width = config.window.width;
        let surface_height = config.window.surface_height;

        let header = adw::HeaderBar::builder()
            .title_widget(&adw::WindowTitle::new("Bootmaker", ""))
            .build();

        let fixed = gtk::Fixed::builder()
            .width_request(width)
            .height_request(surface_height)
            .overflow(gtk::Overflow::Hidden)
            .build();

        let source = SourcePage::new();
        let device = DevicePage::new();
        let progress = ProgressPage::new();
        let result = ResultPage::new();

        let pages: [&gtk::Widget; 4] = [
            source.upcast_ref(),
            device.upcast_ref(),
            progress.upcast_ref(),
            result.upcast_ref(),
        ];
        for (index, page) in pages.into_iter().enumerate() {
            page.set_size_request(width, surface_height);
            page.set_visible(index == 0);
            fixed.put(page, 0.0, 0.0);
        }

        let indicator = PageIndicator::new(WizardState::PAGE_COUNT);

        let content = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .build();
        content.append(&header);
        content.append(&fixed);
        content.append(&indicator.container);

        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Bootmaker")
            .default_width(width)
            .default_height(config.window.height)
            .resizable(false)
            .content(&content)
            .build();

        let frames = FrameDriver::default();
        let shell = GtkShell {
            window: window.clone(),
            header,
            fixed,
            width,
            source: source.clone(),
            device: device.clone(),
            progress: progress.clone(),
            result: result.clone(),
            indicator,
            frames: frames.clone(),
        };

        let (tx, rx) = gateway::channel();
        let settings = ControllerSettings {
            slide_duration: config.slide_duration(),
            chrome: config.chrome_policy(),
        };
        let controller = Rc::new(RefCell::new(WizardController::new(
            shell,
            GatewayAdapter::new(config.backend(), tx),
            settings,
        )));

        let weak = Rc::downgrade(&controller);
        frames.set_tick(move || {
            let Some(controller) = weak.upgrade() else {
                return false;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => controller.tick(Instant::now()),
                // busy with an event; try again next frame
                Err(_) => true,
            }
        });

        let this = Self { window, controller };
        this.connect_pages(&source, &device, &progress, &result, config.cancel.clone());
        this.connect_close();
        this.listen(rx);
        this
    }

    /// Show the window on the first step
    pub fn present(&self) {
        if let Err(e) = self.controller.borrow_mut().start() {
            tracing::warn!("Wizard already running: {}", e);
            self.window.present();
        }
    }

    pub fn window(&self) -> &adw::ApplicationWindow {
        &self.window
    }

    fn connect_pages(
        &self,
        source: &SourcePage,
        device: &DevicePage,
        progress: &ProgressPage,
        result: &ResultPage,
        cancel: CancelConfig,
    ) {
        let weak = Rc::downgrade(&self.controller);
        source.connect_source_chosen(glib::clone!(@strong weak => move |path| {
            dispatch(&weak, StepEvent::SourceChosen(path.into()));
        }));

        device.connect_device_chosen(glib::clone!(@strong weak => move |device_id, format| {
            dispatch(&weak, StepEvent::DeviceChosen { device_id, format });
        }));

        progress.connect_cancel_requested(glib::clone!(@strong weak => move || {
            dispatch(
                &weak,
                StepEvent::CancelRequested {
                    title: cancel.title.clone(),
                    description: cancel.description.clone(),
                },
            );
        }));

        result.connect_reset_requested(glib::clone!(@strong weak => move || {
            dispatch(&weak, StepEvent::ResetRequested);
        }));

        let window = self.window.clone();
        result.connect_close_clicked(glib::clone!(@weak window => move || {
            window.close();
        }));
    }

    fn connect_close(&self) {
        let weak = Rc::downgrade(&self.controller);
        self.window.connect_close_request(move |_| {
            let allowed = match weak.upgrade() {
                Some(controller) => match controller.try_borrow_mut() {
                    Ok(mut controller) => controller.on_close_requested(),
                    Err(_) => false,
                },
                None => true,
            };

            if allowed {
                glib::Propagation::Proceed
            } else {
                glib::Propagation::Stop
            }
        });
    }

    /// Deliver backend events on the main loop as they arrive
    fn listen(&self, mut rx: EventReceiver) {
        let weak = Rc::downgrade(&self.controller);
        glib::MainContext::default().spawn_local(async move {
            while let Some(event) = rx.recv().await {
                if weak.upgrade().is_none() {
                    break;
                }
                deliver(weak.clone(), event, Controller::handle_backend_event);
            }
            tracing::debug!("Backend channel closed");
        });
    }
}

/// Hand `event` to `target`, retrying on the next idle while it is borrowed
fn deliver<C: 'static, E: 'static>(target: Weak<RefCell<C>>, event: E, handle: fn(&mut C, E)) {
    let Some(strong) = target.upgrade() else {
        return;
    };
    let Ok(mut inner) = strong.try_borrow_mut() else {
        tracing::debug!("Wizard busy, deferring backend event");
        glib::idle_add_local_once(move || deliver(target, event, handle));
        return;
    };
    handle(&mut inner, event);
}

fn dispatch(controller: &Weak<RefCell<Controller>>, event: StepEvent) {
    let Some(controller) = controller.upgrade() else {
        return;
    };
    let Ok(mut controller) = controller.try_borrow_mut() else {
        tracing::warn!("Ignored {:?}: wizard busy", event);
        return;
    };
    if let Err(e) = controller.dispatch(event) {
        tracing::debug!("Step event rejected: {}", e);
    }
}
