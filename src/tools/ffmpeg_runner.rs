//! Blocking ffmpeg invocation with step-level cancellation.
//!
//! One call is one pipeline step. The child is polled instead of waited on so
//! the shutdown signal can kill it between polls.

use crate::error::{PipelineError, PipelineResult};
use log::{debug, warn};
use std::io::Read;
use std::process::{ChildStderr, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Lines of stderr kept in an error message
const STDERR_TAIL_LINES: usize = 20;

/// Run an ffmpeg command to completion.
///
/// Returns `Cancelled` if the shutdown signal was raised while the process was
/// running; the child is killed and reaped before returning. Cleaning up the
/// output file is the caller's job.
pub fn run_ffmpeg(step: &str, mut command: Command, shutdown_signal: &AtomicBool) -> PipelineResult<()> {
    if shutdown_signal.load(Ordering::SeqCst) {
        return Err(PipelineError::Cancelled);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    debug!("{step}: {command:?}");

    let mut child = command.spawn().map_err(|e| PipelineError::Encoding {
        step: step.to_string(),
        stderr: format!("failed to start ffmpeg: {e}"),
    })?;

    // Drain stderr concurrently so a chatty child never blocks on a full pipe
    let stderr_reader = spawn_stderr_reader(child.stderr.take());

    loop {
        if shutdown_signal.load(Ordering::SeqCst) {
            warn!("{step}: shutdown requested, killing ffmpeg [{}]", child.id());
            let _ = child.kill();
            let _ = child.wait();
            let _ = collect_stderr(stderr_reader);
            return Err(PipelineError::Cancelled);
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                let stderr = collect_stderr(stderr_reader);
                if status.success() {
                    return Ok(());
                }
                return Err(PipelineError::Encoding {
                    step: step.to_string(),
                    stderr: format!("{status}: {}", tail_lines(&stderr, STDERR_TAIL_LINES)),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!("{step}: cannot check ffmpeg status [{}]: {e}", child.id());
                let _ = child.kill();
                let _ = child.wait();
                let _ = collect_stderr(stderr_reader);
                return Err(PipelineError::Io(e));
            }
        }
    }
}

/// Run `attempt` and give it one more try when it fails with a retryable
/// error (encoder failure or post-encode validation failure).
pub fn retry_once<T>(step: &str, mut attempt: impl FnMut() -> PipelineResult<T>) -> PipelineResult<T> {
    match attempt() {
        Err(e) if e.is_retryable() => {
            warn!("{step} failed, retrying once: {e}");
            attempt()
        }
        other => other,
    }
}

fn spawn_stderr_reader(stderr: Option<ChildStderr>) -> Option<JoinHandle<String>> {
    stderr.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = pipe.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn collect_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_tail_lines_keeps_last_lines() {
        let text = "a\nb\n\nc\nd\n";
        assert_eq!(tail_lines(text, 2), "c\nd");
        assert_eq!(tail_lines(text, 10), "a\nb\nc\nd");
        assert_eq!(tail_lines("", 3), "no error output");
    }

    #[test]
    fn test_retry_once_retries_encoding_error() {
        let calls = Cell::new(0);
        let result = retry_once("step", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(PipelineError::Encoding {
                    step: "step".to_string(),
                    stderr: "transient".to_string(),
                })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_once_gives_up_after_second_failure() {
        let calls = Cell::new(0);
        let result: PipelineResult<()> = retry_once("step", || {
            calls.set(calls.get() + 1);
            Err(PipelineError::Validation("duration".to_string()))
        });
        assert!(matches!(result, Err(PipelineError::Validation(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_once_does_not_retry_cancel() {
        let calls = Cell::new(0);
        let result: PipelineResult<()> = retry_once("step", || {
            calls.set(calls.get() + 1);
            Err(PipelineError::Cancelled)
        });
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_run_ffmpeg_cancelled_before_start() {
        let shutdown = AtomicBool::new(true);
        let result = run_ffmpeg("noop", Command::new("ffmpeg"), &shutdown);
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_run_ffmpeg_missing_binary_is_encoding_error() {
        let shutdown = AtomicBool::new(false);
        let result = run_ffmpeg(
            "missing",
            Command::new("definitely-not-an-ffmpeg-binary"),
            &shutdown,
        );
        assert!(matches!(result, Err(PipelineError::Encoding { .. })));
    }
}
