//! Command Backend - runs an external helper program per install
//!
//! ARCHITECTURE: each request gets a native OS thread with its own Tokio
//! runtime, so the GTK main thread never blocks. The helper prints one JSON
//! message per line on stdout:
//!
//! ```text
//! {"progress": 42}
//! {"finished": {"error": 0, "title": "Done", "description": ""}}
//! ```
//!
//! Anything else on stdout is logged and ignored.

use super::{BackendGateway, Notifier, RequestId};
use crate::outcome::{ErrorCode, InstallOutcome, InstallRequest};
use serde::Deserialize;
use std::process::{ExitStatus, Stdio};
use std::thread;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Lines of helper stderr kept for a failure description
const STDERR_TAIL_LINES: usize = 5;

/// Messages understood on helper stdout
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum HelperMessage {
    Progress(u8),
    Finished {
        error: u32,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
    },
}

pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    cancel: Option<(RequestId, oneshot::Sender<()>)>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cancel: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one request: configured args first
    pub fn command_args(&self, request: &InstallRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--source".into());
        args.push(request.source.display().to_string());
        if let Some(ref aux) = request.auxiliary {
            args.push("--aux".into());
            args.push(aux.display().to_string());
        }
        args.push("--device".into());
        args.push(request.device_id.clone());
        if request.format {
            args.push("--format".into());
        }
        args
    }
}

impl BackendGateway for CommandBackend {
    fn start(&mut self) {
        info!("Install backend: {}", self.program);
    }

    fn start_install(&mut self, request: InstallRequest, notifier: Notifier) {
        let program = self.program.clone();
        let args = self.command_args(&request);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel = Some((notifier.request(), cancel_tx));

        // Spawn a NATIVE OS THREAD for the helper; it owns its runtime
        thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    notifier.finished(InstallOutcome::new(
                        ErrorCode::OperationExecutionFailed,
                        "Installer backend unavailable",
                        format!("Failed to initialize async runtime: {}", e),
                    ));
                    return;
                }
            };

            match rt.block_on(run_helper(&program, &args, &notifier, cancel_rx)) {
                Some(outcome) => notifier.finished(outcome),
                None => debug!("Helper for {} was cancelled", notifier.request()),
            }
        });
    }

    fn cancel(&mut self, request: RequestId) {
        match self.cancel.take() {
            Some((id, tx)) if id == request => {
                let _ = tx.send(());
            }
            other => self.cancel = other,
        }
    }
}

/// Run the helper to completion. `None` means it was cancelled.
async fn run_helper(
    program: &str,
    args: &[String],
    notifier: &Notifier,
    mut cancel: oneshot::Receiver<()>,
) -> Option<InstallOutcome> {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return Some(InstallOutcome::new(
                ErrorCode::OperationExecutionFailed,
                "Failed to start installer backend",
                format!("{}: {}", program, e),
            ));
        }
    };

    let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Some(InstallOutcome::new(
            ErrorCode::OperationExecutionFailed,
            "Installer backend failed",
            "Helper output could not be captured",
        ));
    };

    let stderr_reader = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf).await;
        buf
    });

    let mut lines = LinesStream::new(BufReader::new(stdout).lines());
    let mut finished = None;

    loop {
        tokio::select! {
            _ = &mut cancel => {
                let _ = child.kill().await;
                return None;
            }
            line = lines.next() => match line {
                Some(Ok(line)) => match parse_line(&line) {
                    Some(HelperMessage::Progress(percent)) => notifier.progress(percent),
                    Some(HelperMessage::Finished { error, title, description }) => {
                        finished = Some(finished_outcome(error, title, description));
                    }
                    None => debug!("helper: {}", line),
                },
                Some(Err(e)) => {
                    warn!("Failed to read helper output: {}", e);
                    break;
                }
                None => break,
            }
        }
    }

    let status = child.wait().await;
    let stderr = stderr_reader.await.unwrap_or_default();

    Some(finished.unwrap_or_else(|| exit_outcome(status, &stderr)))
}

fn parse_line(line: &str) -> Option<HelperMessage> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }
    serde_json::from_str(line).ok()
}

fn finished_outcome(error: u32, title: String, description: String) -> InstallOutcome {
    match ErrorCode::try_from(error) {
        Ok(code) => InstallOutcome::new(code, title, description),
        Err(e) => {
            warn!("Helper reported {}", e);
            InstallOutcome::new(ErrorCode::OperationExecutionFailed, title, description)
        }
    }
}

fn exit_outcome(status: std::io::Result<ExitStatus>, stderr: &str) -> InstallOutcome {
    let tail: Vec<&str> = stderr
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    let tail = tail[tail.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");

    let title = match status {
        Ok(status) if status.success() => "Installer backend exited without a result".to_string(),
        Ok(status) => format!("Installer backend failed ({})", status),
        Err(e) => format!("Installer backend failed: {}", e),
    };

    InstallOutcome::new(ErrorCode::OperationExecutionFailed, title, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{channel, BackendEvent, BackendNotice, GatewayAdapter};
    use std::path::PathBuf;

    fn request(format: bool) -> InstallRequest {
        InstallRequest {
            source: PathBuf::from("/tmp/image.iso"),
            auxiliary: None,
            device_id: "sdb1".into(),
            format,
        }
    }

    fn script_backend(script: &str) -> CommandBackend {
        CommandBackend::new("sh", vec!["-c".into(), script.into(), "helper".into()])
    }

    fn wait_for_finish(rx: &mut crate::gateway::EventReceiver) -> (Vec<u8>, InstallOutcome) {
        let mut progress = Vec::new();
        while let Some(BackendEvent { notice, .. }) = rx.blocking_recv() {
            match notice {
                BackendNotice::Progress(p) => progress.push(p),
                BackendNotice::Finished(outcome) => return (progress, outcome),
            }
        }
        panic!("channel closed before finish");
    }

    #[test]
    fn test_command_args() {
        let backend = CommandBackend::new("helper", vec!["--verbose".into()]);
        assert_eq!(
            backend.command_args(&request(true)),
            vec!["--verbose", "--source", "/tmp/image.iso", "--device", "sdb1", "--format"]
        );

        let mut req = request(false);
        req.auxiliary = Some(PathBuf::from("/tmp/aux"));
        assert_eq!(
            backend.command_args(&req),
            vec!["--verbose", "--source", "/tmp/image.iso", "--aux", "/tmp/aux", "--device", "sdb1"]
        );
    }

    #[test]
    fn test_parse_helper_lines() {
        assert_eq!(parse_line(r#"{"progress": 42}"#), Some(HelperMessage::Progress(42)));
        assert_eq!(
            parse_line(r#"{"finished": {"error": 3, "title": "Too small"}}"#),
            Some(HelperMessage::Finished {
                error: 3,
                title: "Too small".into(),
                description: String::new(),
            })
        );
        assert_eq!(parse_line("copying files..."), None);
        assert_eq!(parse_line(r#"{"bogus": 1}"#), None);
    }

    #[test]
    fn test_unknown_helper_code_is_a_failure() {
        let outcome = finished_outcome(77, "Odd".into(), "".into());
        assert_eq!(outcome.code, ErrorCode::OperationExecutionFailed);
        assert_eq!(outcome.title, "Odd");
    }

    #[cfg(unix)]
    #[test]
    fn test_helper_reports_progress_and_result() {
        let (tx, mut rx) = channel();
        let script = r#"echo '{"progress": 50}'; echo 'noise'; echo '{"finished": {"error": 0, "title": "Done", "description": "ok"}}'"#;
        let mut adapter = GatewayAdapter::new(script_backend(script), tx);
        adapter.submit(request(true)).unwrap();

        let (progress, outcome) = wait_for_finish(&mut rx);
        assert_eq!(progress, vec![50]);
        assert_eq!(outcome, InstallOutcome::new(ErrorCode::NoError, "Done", "ok"));
    }

    #[cfg(unix)]
    #[test]
    fn test_helper_exit_without_result_is_a_failure() {
        let (tx, mut rx) = channel();
        let mut adapter = GatewayAdapter::new(script_backend("echo 'mount: permission denied' >&2; exit 3"), tx);
        adapter.submit(request(false)).unwrap();

        let (_, outcome) = wait_for_finish(&mut rx);
        assert_eq!(outcome.code, ErrorCode::OperationExecutionFailed);
        assert_eq!(outcome.description, "mount: permission denied");
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_helper_without_result() {
        let (tx, mut rx) = channel();
        let script = r#"echo '{"progress": 5}'; sleep 3; echo '{"finished": {"error": 0, "title": "Done"}}'"#;
        let mut adapter = GatewayAdapter::new(script_backend(script), tx);
        adapter.submit(request(false)).unwrap();

        let first = rx.blocking_recv().unwrap();
        assert_eq!(first.notice, BackendNotice::Progress(5));

        let started = std::time::Instant::now();
        assert!(adapter.abandon().is_some());
        drop(adapter);

        // the channel closes once the worker thread is gone
        while let Some(BackendEvent { notice, .. }) = rx.blocking_recv() {
            assert!(!matches!(notice, BackendNotice::Finished(_)));
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_missing_program_is_a_failure() {
        let (tx, mut rx) = channel();
        let backend = CommandBackend::new("/nonexistent/bootmaker-helper", Vec::new());
        let mut adapter = GatewayAdapter::new(backend, tx);
        adapter.submit(request(false)).unwrap();

        let (_, outcome) = wait_for_finish(&mut rx);
        assert_eq!(outcome.code, ErrorCode::OperationExecutionFailed);
        assert!(outcome.description.contains("/nonexistent/bootmaker-helper"));
    }
}
