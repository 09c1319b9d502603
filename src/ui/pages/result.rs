//! Result Page - Outcome of the install

use crate::outcome::InstallOutcome;
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::RefCell;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct ResultPage {
        pub icon: RefCell<Option<gtk::Image>>,
        pub title: RefCell<Option<gtk::Label>>,
        pub description: RefCell<Option<gtk::Label>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ResultPage {
        const NAME: &'static str = "BootmakerResultPage";
        type Type = super::ResultPage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for ResultPage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![
                    glib::subclass::Signal::builder("reset-requested").build(),
                    glib::subclass::Signal::builder("close-clicked").build(),
                ]
            })
        }
    }

    impl WidgetImpl for ResultPage {}
    impl BoxImpl for ResultPage {}
}

glib::wrapper! {
    pub struct ResultPage(ObjectSubclass<imp::ResultPage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl ResultPage {
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
            .icon_name("emblem-ok-symbolic")
            .pixel_size(96)
            .css_classes(["success"])
            .build();

        let title = gtk::Label::builder()
            .css_classes(["title-1"])
            .wrap(true)
            .justify(gtk::Justification::Center)
            .build();

        let description = gtk::Label::builder()
            .css_classes(["dim-label"])
            .wrap(true)
            .justify(gtk::Justification::Center)
            .build();

        let again = gtk::Button::builder()
            .label("Create Another")
            .css_classes(["pill"])
            .build();

        let close = gtk::Button::builder()
            .label("Close")
            .css_classes(["pill", "suggested-action"])
            .build();

        again.connect_clicked(glib::clone!(@weak self as page => move |_| {
            page.emit_by_name::<()>("reset-requested", &[]);
        }));

        close.connect_clicked(glib::clone!(@weak self as page => move |_| {
            page.emit_by_name::<()>("close-clicked", &[]);
        }));

        let buttons = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .halign(gtk::Align::Center)
            .margin_top(24)
            .build();
        buttons.append(&again);
        buttons.append(&close);

        self.append(&icon);
        self.append(&title);
        self.append(&description);
        self.append(&buttons);

        *self.imp().icon.borrow_mut() = Some(icon);
        *self.imp().title.borrow_mut() = Some(title);
        *self.imp().description.borrow_mut() = Some(description);
    }

    /// Show the outcome as reported, without rewording
    pub fn set_outcome(&self, outcome: &InstallOutcome) {
        let imp = self.imp();

        if let Some(ref icon) = *imp.icon.borrow() {
            if outcome.is_success() {
                icon.set_icon_name(Some("emblem-ok-symbolic"));
                icon.set_css_classes(&["success"]);
            } else {
                icon.set_icon_name(Some("dialog-error-symbolic"));
                icon.set_css_classes(&["error"]);
            }
        }
        if let Some(ref title) = *imp.title.borrow() {
            title.set_label(&outcome.title);
        }
        if let Some(ref description) = *imp.description.borrow() {
            description.set_label(&outcome.description);
        }
    }

    pub fn connect_reset_requested<F: Fn() + 'static>(&self, f: F) {
        self.connect_local("reset-requested", false, move |_| {
            f();
            None
        });
    }

    pub fn connect_close_clicked<F: Fn() + 'static>(&self, f: F) {
        self.connect_local("close-clicked", false, move |_| {
            f();
            None
        });
    }
}

impl Default for ResultPage {
    fn default() -> Self {
        Self::new()
    }
}
