//! Source Page - Pick the bootable image

use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gio, glib};
use std::cell::RefCell;
use std::path::Path;

/// Whether `text` names an existing regular file
pub fn is_image_path(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && Path::new(text).is_file()
}

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct SourcePage {
        pub entry: RefCell<Option<gtk::Entry>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for SourcePage {
        const NAME: &'static str = "BootmakerSourcePage";
        type Type = super::SourcePage;
        type ParentType = gtk::Box;
    }

    impl ObjectImpl for SourcePage {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            use std::sync::OnceLock;
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![glib::subclass::Signal::builder("source-chosen")
                    .param_types([String::static_type()])
                    .build()]
            })
        }
    }

    impl WidgetImpl for SourcePage {}
    impl BoxImpl for SourcePage {}
}

glib::wrapper! {
    pub struct SourcePage(ObjectSubclass<imp::SourcePage>)
        @extends gtk::Box, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Orientable;
}

impl SourcePage {
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
            .icon_name("media-optical-symbolic")
            .pixel_size(64)
            .margin_bottom(8)
            .build();

        let title = gtk::Label::builder()
            .label("Select a boot image")
            .css_classes(["title-2"])
            .build();

        let entry = gtk::Entry::builder()
            .placeholder_text("/path/to/image.iso")
            .hexpand(true)
            .build();

        let browse = gtk::Button::builder()
            .icon_name("document-open-symbolic")
            .tooltip_text("Browse")
            .build();

        let row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(8)
            .build();
        row.append(&entry);
        row.append(&browse);

        let next = gtk::Button::builder()
            .label("Next")
            .css_classes(["pill", "suggested-action"])
            .halign(gtk::Align::Center)
            .sensitive(false)
            .margin_top(16)
            .build();

        entry.connect_changed(glib::clone!(@weak next => move |entry| {
            next.set_sensitive(is_image_path(&entry.text()));
        }));

        browse.connect_clicked(glib::clone!(@weak self as page, @weak entry => move |_| {
            page.choose_file(&entry);
        }));

        next.connect_clicked(glib::clone!(@weak self as page, @weak entry => move |_| {
            let path = entry.text().trim().to_string();
            page.emit_by_name::<()>("source-chosen", &[&path]);
        }));

        self.append(&icon);
        self.append(&title);
        self.append(&row);
        self.append(&next);

        *self.imp().entry.borrow_mut() = Some(entry);
    }

    fn choose_file(&self, entry: &gtk::Entry) {
        let filter = gtk::FileFilter::new();
        filter.set_name(Some("Disk images"));
        filter.add_pattern("*.iso");
        filter.add_pattern("*.img");

        let filters = gio::ListStore::new::<gtk::FileFilter>();
        filters.append(&filter);

        let dialog = gtk::FileDialog::builder()
            .title("Select a boot image")
            .modal(true)
            .filters(&filters)
            .build();

        let parent = self.root().and_downcast::<gtk::Window>();
        dialog.open(
            parent.as_ref(),
            gio::Cancellable::NONE,
            glib::clone!(@weak entry => move |result| {
                if let Ok(path) = result.map(|file| file.path()) {
                    if let Some(path) = path {
                        entry.set_text(&path.to_string_lossy());
                    }
                }
            }),
        );
    }

    /// Clear the selection for a new run
    pub fn reset(&self) {
        if let Some(ref entry) = *self.imp().entry.borrow() {
            entry.set_text("");
        }
    }

    pub fn connect_source_chosen<F: Fn(String) + 'static>(&self, f: F) {
        self.connect_local("source-chosen", false, move |values| {
            let path = values[1].get::<String>().unwrap_or_default();
            f(path);
            None
        });
    }
}

impl Default for SourcePage {
    fn default() -> Self {
        Self::new()
    }
}
