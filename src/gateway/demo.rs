//! Demo Backend - simulated install for trying the wizard without a helper

use super::{BackendGateway, Notifier, RequestId};
use crate::outcome::{ErrorCode, InstallOutcome, InstallRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const STEPS: u8 = 10;

pub struct DemoBackend {
    step_delay: Duration,
    running: Option<(RequestId, Arc<AtomicBool>)>,
}

impl DemoBackend {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            running: None,
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(400))
    }
}

impl BackendGateway for DemoBackend {
    fn start_install(&mut self, request: InstallRequest, notifier: Notifier) {
        let stop = Arc::new(AtomicBool::new(false));
        self.running = Some((notifier.request(), stop.clone()));
        let delay = self.step_delay;

        thread::spawn(move || {
            for step in 1..=STEPS {
                // Simulate work
                thread::sleep(delay);
                if stop.load(Ordering::SeqCst) {
                    return;
                }
                notifier.progress(step * (100 / STEPS));
            }

            notifier.finished(InstallOutcome::new(
                ErrorCode::NoError,
                "Boot disk created",
                format!("{} is ready to boot.", request.device_id),
            ));
        });
    }

    fn cancel(&mut self, request: RequestId) {
        if let Some((id, ref stop)) = self.running {
            if id == request {
                stop.store(true, Ordering::SeqCst);
            }
        }
    }
}
