//! Wizard State Machine
//!
//! The four wizard steps, the triggers that move between them and the typed
//! context collected along the way.

use crate::error::{Result, WizardError};
use crate::outcome::InstallOutcome;
use std::fmt;
use std::path::{Path, PathBuf};

/// The step currently shown by the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardState {
    /// Choosing the bootable image
    #[default]
    SourceSelect,

    /// Choosing the target device and format mode
    DeviceSelect,

    /// Backend is writing the image
    Installing,

    /// Showing the outcome
    Result,
}

/// Events that may move the wizard to another step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    SourceChosen,
    DeviceChosen,
    InstallOutcome,
    CancelRequested,
    Reset,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::SourceChosen => "source-chosen",
            Trigger::DeviceChosen => "device-chosen",
            Trigger::InstallOutcome => "install-outcome",
            Trigger::CancelRequested => "cancel-requested",
            Trigger::Reset => "reset",
        };
        f.write_str(name)
    }
}

impl WizardState {
    pub const ALL: [WizardState; 4] = [
        WizardState::SourceSelect,
        WizardState::DeviceSelect,
        WizardState::Installing,
        WizardState::Result,
    ];

    /// Number of dots shown by the page indicator
    pub const PAGE_COUNT: u32 = 3;

    /// Transition table. `None` means the trigger is not legal here.
    pub fn next(self, trigger: Trigger) -> Option<WizardState> {
        use WizardState::*;

        match (self, trigger) {
            (SourceSelect, Trigger::SourceChosen) => Some(DeviceSelect),
            (DeviceSelect, Trigger::DeviceChosen) => Some(Installing),
            (Installing, Trigger::InstallOutcome) => Some(Result),
            (Installing, Trigger::CancelRequested) => Some(Result),
            (Result, Trigger::Reset) => Some(SourceSelect),
            _ => None,
        }
    }

    /// Page indicator position; progress and result share the last dot
    pub fn page_index(self) -> u32 {
        match self {
            WizardState::SourceSelect => 0,
            WizardState::DeviceSelect => 1,
            WizardState::Installing | WizardState::Result => 2,
        }
    }
}

/// A visual hand-off between two step surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub from: WizardState,
    pub to: WizardState,
}

impl TransitionRequest {
    /// Only the state being entered may be the incoming surface
    pub fn is_valid_for(&self, entering: WizardState) -> bool {
        self.to == entering && self.from != self.to
    }
}

/// Device chosen on the device step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelection {
    pub device_id: String,
    pub format: bool,
}

/// Data accumulated over one wizard run.
///
/// Every field is written at most once until [`WizardContext::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardContext {
    source: Option<PathBuf>,
    device: Option<DeviceSelection>,
    outcome: Option<InstallOutcome>,
}

impl WizardContext {
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn device(&self) -> Option<&DeviceSelection> {
        self.device.as_ref()
    }

    pub fn outcome(&self) -> Option<&InstallOutcome> {
        self.outcome.as_ref()
    }

    pub fn set_source(&mut self, path: PathBuf) -> Result<()> {
        write_once(&mut self.source, path, "source")
    }

    pub fn set_device(&mut self, selection: DeviceSelection) -> Result<()> {
        write_once(&mut self.device, selection, "device")
    }

    pub fn set_outcome(&mut self, outcome: InstallOutcome) -> Result<()> {
        write_once(&mut self.outcome, outcome, "outcome")
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(WizardError::WriteOnceViolated(field));
    }
    *slot = Some(value);
    Ok(())
}
