//! Wizard Pages - One widget per wizard step
//!
//! Each page owns its widgets and emits signals; the window turns those
//! signals into controller events.

mod device;
mod progress;
mod result;
mod source;

pub use device::DevicePage;
pub use progress::ProgressPage;
pub use result::ResultPage;
pub use source::{is_image_path, SourcePage};
