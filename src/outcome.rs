//! Install requests and outcomes exchanged with the backend

use crate::error::WizardError;
use std::fmt;
use std::path::PathBuf;

/// Result codes reported by the install backend.
///
/// The numeric values are the backend's wire values. The set is closed:
/// an unrecognised number is rejected, never treated as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0,
    OperationExecutionFailed = 1,
    DeviceFormatError = 2,
    DeviceSizeError = 3,
    DeviceMountFailed = 4,
    SourceExtractionFailed = 5,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::NoError,
        ErrorCode::OperationExecutionFailed,
        ErrorCode::DeviceFormatError,
        ErrorCode::DeviceSizeError,
        ErrorCode::DeviceMountFailed,
        ErrorCode::SourceExtractionFailed,
    ];

    /// Code synthesized when the user cancels an install.
    pub const CANCELLED: ErrorCode = ErrorCode::OperationExecutionFailed;

    pub fn is_success(self) -> bool {
        self == ErrorCode::NoError
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = WizardError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_u32() == value)
            .ok_or(WizardError::UnknownErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::OperationExecutionFailed => "operation execution failed",
            ErrorCode::DeviceFormatError => "device format error",
            ErrorCode::DeviceSizeError => "device size error",
            ErrorCode::DeviceMountFailed => "device mount failed",
            ErrorCode::SourceExtractionFailed => "source extraction failed",
        };
        f.write_str(name)
    }
}

/// One request to write `source` onto `device_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Bootable image chosen on the source step
    pub source: PathBuf,

    /// Reserved secondary input, currently always empty
    pub auxiliary: Option<PathBuf>,

    /// Device or partition identifier, e.g. "sdb1"
    pub device_id: String,

    /// Whether the device is formatted before writing
    pub format: bool,
}

/// Terminal result of one install request.
///
/// Title and description are presented verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub code: ErrorCode,
    pub title: String,
    pub description: String,
}

impl InstallOutcome {
    pub fn new(code: ErrorCode, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Build an outcome from the raw triple a progress widget emits.
    pub fn from_raw(code: u32, title: impl Into<String>, description: impl Into<String>) -> Result<Self, WizardError> {
        Ok(Self::new(ErrorCode::try_from(code)?, title, description))
    }

    /// The outcome synthesized for a user cancellation.
    pub fn cancelled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorCode::CANCELLED, title, description)
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}
