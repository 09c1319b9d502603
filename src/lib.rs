//! Bootmaker Library - wizard core for writing bootable media
//!
//! This library provides:
//! - The wizard state machine and its typed context
//! - Window-chrome policy per wizard step
//! - The slide transition animator
//! - The install backend gateway and its concrete backends
//! - Configuration and removable device discovery
//! - The GTK4/Libadwaita front end (`gui` feature)

pub mod animator;
pub mod chrome;
pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod gateway;
pub mod outcome;
pub mod state;

#[cfg(feature = "gui")]
pub mod ui;

pub use controller::{StepEvent, WizardController, WizardShell};
pub use error::{Result, WizardError};
pub use outcome::{ErrorCode, InstallOutcome, InstallRequest};
pub use state::{WizardContext, WizardState};
