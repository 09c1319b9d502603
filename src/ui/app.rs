//! Bootmaker Application - GTK4 Application Setup
//!
//! Owns the loaded configuration and the single wizard window.

use crate::config::WizardConfig;
use crate::ui::window::BootmakerWindow;
use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gio, glib};
use std::cell::RefCell;

/// Application ID for Bootmaker
const APP_ID: &str = "org.bootmaker.Wizard";

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct BootmakerApplication {
        pub config: RefCell<Option<WizardConfig>>,
        pub window: RefCell<Option<BootmakerWindow>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for BootmakerApplication {
        const NAME: &'static str = "BootmakerApplication";
        type Type = super::BootmakerApplication;
        type ParentType = adw::Application;
    }

    impl ObjectImpl for BootmakerApplication {}

    impl ApplicationImpl for BootmakerApplication {
        fn activate(&self) {
            // a second activation only raises the existing window
            if let Some(ref window) = *self.window.borrow() {
                window.window().present();
                return;
            }

            let config = self.config.borrow_mut().take().unwrap_or_default();
            let window = BootmakerWindow::new(&*self.obj(), &config);

            window.present();
            *self.window.borrow_mut() = Some(window);
        }

        fn startup(&self) {
            self.parent_startup();

            let css_provider = gtk::CssProvider::new();
            css_provider.load_from_data(include_str!("styles.css"));

            match gtk::gdk::Display::default() {
                Some(display) => {
                    gtk::style_context_add_provider_for_display(
                        &display,
                        &css_provider,
                        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
                    );
                }
                None => {
                    tracing::warn!("No display available. CSS styling will not be applied.");
                }
            }

            self.obj().setup_actions();
        }

        fn shutdown(&self) {
            // drop the window and controller before the main loop goes away
            self.window.borrow_mut().take();
            self.parent_shutdown();
        }
    }

    impl GtkApplicationImpl for BootmakerApplication {}
    impl AdwApplicationImpl for BootmakerApplication {}
}

glib::wrapper! {
    pub struct BootmakerApplication(ObjectSubclass<imp::BootmakerApplication>)
        @extends adw::Application, gtk::Application, gio::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl BootmakerApplication {
    pub fn new(config: WizardConfig) -> Self {
        let app: Self = glib::Object::builder()
            .property("application-id", APP_ID)
            .property("flags", gio::ApplicationFlags::FLAGS_NONE)
            .build();

        *app.imp().config.borrow_mut() = Some(config);

        app
    }

    fn setup_actions(&self) {
        // closing goes through the window so the wizard can refuse mid-install
        let quit_action = gio::SimpleAction::new("quit", None);
        quit_action.connect_activate(glib::clone!(
            @weak self as app =>
            move |_, _| {
                if let Some(window) = app.active_window() {
                    window.close();
                } else {
                    app.quit();
                }
            }
        ));
        self.add_action(&quit_action);

        self.set_accels_for_action("app.quit", &["<Ctrl>q"]);
    }

    /// Run the main loop. Command-line flags are handled before this point,
    /// so GApplication only sees the program name.
    pub fn run(&self) -> glib::ExitCode {
        let program = std::env::args().next().unwrap_or_else(|| "bootmaker".to_string());
        self.run_with_args(&[program])
    }
}

impl Default for BootmakerApplication {
    fn default() -> Self {
        Self::new(WizardConfig::default())
    }
}
