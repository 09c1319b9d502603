//! Device Page - Pick the target drive

use crate::devices::{self, RemovableDevice};
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::RefCell;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct DevicePage {
        pub model: RefCell<Option<gtk::StringList>>,
        pub dropdown: RefCell<Option<gtk::DropDown>>,
        pub format: RefCell<Option<gtk::CheckButton>>,
        pub hint: RefCell<Option<gtk::Label>>,
        pub next: RefCell<Option<gtk::Button>>,
        /// Identifiers backing the dropdown rows, same order
        pub targets: RefCell<Vec<String>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for DevicePage {
        const NAME: &'static str = "BootmakerDevicePage";
        type Type = super::DevicePage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for DevicePage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![glib::subclass::Signal::builder("device-chosen")
                    .param_types([String::static_type(), bool::static_type()])
                    .build()]
            })
        }
    }

    impl WidgetImpl for DevicePage {}
    impl BoxImpl for DevicePage {}
}

glib::wrapper! {
    pub struct DevicePage(ObjectSubclass<imp::DevicePage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl DevicePage {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("orientation", gtk::Orientation::Vertical)
            .property("spacing", 16)
            .property("valign", gtk::Align::Center)
            .property("margin-start", 32)
            .property("margin-end", 32)
            .build()
    }

    fn setup_ui(&self) {
        let icon = gtk::Image::builder()
            .icon_name("drive-removable-media-symbolic")
            .pixel_size(64)
            .margin_bottom(8)
            .build();

        let title = gtk::Label::builder()
            .label("Select a device")
            .css_classes(["title-2"])
            .build();

        let model = gtk::StringList::new(&[]);
        let dropdown = gtk::DropDown::builder()
            .model(&model)
            .hexpand(true)
            .build();

        let refresh = gtk::Button::builder()
            .icon_name("view-refresh-symbolic")
            .tooltip_text("Refresh")
            .build();

        let row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .build();
        row.append(&dropdown);
        row.append(&refresh);

        let hint = gtk::Label::builder()
            .label("No removable devices found")
            .css_classes(["dim-label"])
            .wrap(true)
            .justify(gtk::Justification::Center)
            .build();

        let format = gtk::CheckButton::builder()
            .label("Format the device first")
            .halign(gtk::Align::Center)
            .build();

        let warning = gtk::Label::builder()
            .label("All data on the selected device may be lost.")
            .css_classes(["caption", "warning"])
            .build();

        let next = gtk::Button::builder()
            .label("Write")
            .css_classes(["pill", "destructive-action"])
            .halign(gtk::Align::Center)
            .sensitive(false)
            .margin_top(16)
            .build();

        refresh.connect_clicked(glib::clone!(@weak self as page => move |_| {
            page.refresh();
        }));

        next.connect_clicked(glib::clone!(@weak self as page => move |_| {
            page.emit_chosen();
        }));

        self.append(&icon);
        self.append(&title);
        self.append(&row);
        self.append(&hint);
        self.append(&format);
        self.append(&warning);
        self.append(&next);

        let imp = self.imp();
        *imp.model.borrow_mut() = Some(model);
        *imp.dropdown.borrow_mut() = Some(dropdown);
        *imp.format.borrow_mut() = Some(format);
        *imp.hint.borrow_mut() = Some(hint);
        *imp.next.borrow_mut() = Some(next);
    }

    /// Rescan removable devices and rebuild the list
    pub fn refresh(&self) {
        let found = match devices::list_removable() {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Device scan failed: {:#}", e);
                Vec::new()
            }
        };
        self.set_devices(&found);
    }

    fn set_devices(&self, found: &[RemovableDevice]) {
        let imp = self.imp();

        let mut labels = Vec::new();
        let mut targets = Vec::new();
        for device in found {
            for target in device.targets() {
                labels.push(format!("/dev/{}  {}", target, device.label()));
                targets.push(target);
            }
        }

        if let Some(ref model) = *imp.model.borrow() {
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            model.splice(0, model.n_items(), &refs);
        }
        if let Some(ref hint) = *imp.hint.borrow() {
            hint.set_visible(targets.is_empty());
        }
        if let Some(ref next) = *imp.next.borrow() {
            next.set_sensitive(!targets.is_empty());
        }
        if let Some(ref format) = *imp.format.borrow() {
            format.set_active(false);
        }

        *imp.targets.borrow_mut() = targets;
    }

    fn emit_chosen(&self) {
        let imp = self.imp();

        let selected = imp
            .dropdown
            .borrow()
            .as_ref()
            .map(|d| d.selected())
            .unwrap_or(gtk::INVALID_LIST_POSITION);

        let target = imp.targets.borrow().get(selected as usize).cloned();
        let Some(target) = target else {
            return;
        };

        let format = imp
            .format
            .borrow()
            .as_ref()
            .map(|f| f.is_active())
            .unwrap_or(false);

        self.emit_by_name::<()>("device-chosen", &[&target, &format]);
    }

    pub fn connect_device_chosen<F: Fn(String, bool) + 'static>(&self, f: F) {
        self.connect_local("device-chosen", false, move |values| {
            let device = values[1].get::<String>().unwrap_or_default();
            let format = values[2].get::<bool>().unwrap_or(false);
            f(device, format);
            None
        });
    }
}

impl Default for DevicePage {
    fn default() -> Self {
        Self::new()
    }
}
