//! Wizard errors
//!
//! Everything in here is a protocol violation: a trigger that arrived in a
//! state that does not accept it, or a value the boundary refuses. Install
//! failures reported by the backend are not errors, they are outcomes.

use crate::gateway::RequestId;
use crate::state::{Trigger, WizardState};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("wizard was already started")]
    AlreadyStarted,

    #[error("wizard has not been started")]
    NotStarted,

    #[error("{trigger} is not accepted while in {state:?}")]
    UnexpectedTrigger { trigger: Trigger, state: WizardState },

    #[error("source path must not be empty")]
    EmptySourcePath,

    #[error("device identifier must not be empty")]
    EmptyDeviceId,

    #[error("install request {0} is still outstanding")]
    RequestOutstanding(RequestId),

    #[error("backend gateway is detached")]
    GatewayDetached,

    #[error("a transition is already in flight")]
    TransitionInFlight,

    #[error("context field `{0}` is already set")]
    WriteOnceViolated(&'static str),

    #[error("unknown install error code {0}")]
    UnknownErrorCode(u32),
}

pub type Result<T, E = WizardError> = std::result::Result<T, E>;
