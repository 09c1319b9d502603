//! Progress Page - Shown while the backend writes the device

use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::RefCell;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct ProgressPage {
        pub progress_bar: RefCell<Option<gtk::ProgressBar>>,
        pub percent_label: RefCell<Option<gtk::Label>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ProgressPage {
        const NAME: &'static str = "BootmakerProgressPage";
        type Type = super::ProgressPage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for ProgressPage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| vec![glib::subclass::Signal::builder("cancel-requested").build()])
        }
    }

    impl WidgetImpl for ProgressPage {}
    impl BoxImpl for ProgressPage {}
}

glib::wrapper! {
    pub struct ProgressPage(ObjectSubclass<imp::ProgressPage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl ProgressPage {
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
        let title = gtk::Label::builder()
            .label("Creating boot disk...")
            .css_classes(["title-2"])
            .build();

        let progress_bar = gtk::ProgressBar::builder()
            .show_text(false)
            .hexpand(true)
            .build();

        let percent_label = gtk::Label::builder()
            .label("0%")
            .css_classes(["dim-label", "numeric"])
            .build();

        let cancel = gtk::Button::builder()
            .label("Cancel")
            .css_classes(["pill"])
            .halign(gtk::Align::Center)
            .margin_top(16)
            .build();

        cancel.connect_clicked(glib::clone!(@weak self as page => move |_| {
            page.emit_by_name::<()>("cancel-requested", &[]);
        }));

        self.append(&title);
        self.append(&progress_bar);
        self.append(&percent_label);
        self.append(&cancel);

        *self.imp().progress_bar.borrow_mut() = Some(progress_bar);
        *self.imp().percent_label.borrow_mut() = Some(percent_label);
    }

    pub fn set_progress(&self, percent: u8) {
        let percent = percent.min(100);
        if let Some(ref bar) = *self.imp().progress_bar.borrow() {
            bar.set_fraction(f64::from(percent) / 100.0);
        }
        if let Some(ref label) = *self.imp().percent_label.borrow() {
            label.set_label(&format!("{}%", percent));
        }
    }

    pub fn connect_cancel_requested<F: Fn() + 'static>(&self, f: F) {
        self.connect_local("cancel-requested", false, move |_| {
            f();
            None
        });
    }
}

impl Default for ProgressPage {
    fn default() -> Self {
        Self::new()
    }
}
