//! Probe command runner with timeout and output cap.
//!
//! Probes shell out to desktop tooling (gsettings, systemctl, flatpak,
//! xdg-settings). A hung or chatty tool must not stall or bloat collection,
//! so every invocation runs with a deadline and a bounded capture:
//!
//! - Per-command timeout with kill on expiry
//! - Output size cap
//! - stdin closed, stderr discarded
//!
//! Probes run sequentially; collection is a one-shot startup task, not a
//! scan loop, so there is no parallelism or cumulative budget here.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Default timeout per probe command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default maximum captured output in bytes (1MB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Poll interval while waiting for a child to exit.
const WAIT_POLL_MS: u64 = 10;

/// Errors that can occur while running a probe command.
///
/// Probes absorb all of these into their documented defaults; the variants
/// exist so absorption sites can log what actually happened.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("command exited with non-zero status: {code}")]
    NonZeroExit { code: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs probe commands under a deadline.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    timeout: Duration,
    max_output_bytes: usize,
}

impl Default for ProbeRunner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ProbeRunner {
    /// Create a runner with an explicit per-command timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Run a command and return its stdout as a string (lossy UTF-8).
    ///
    /// Returns an error when the command is missing, exits non-zero, or
    /// exceeds the deadline. Output beyond the cap is truncated, not an
    /// error.
    pub fn run(&self, command: &str, args: &[&str]) -> Result<String, RunnerError> {
        trace!(command, ?args, "running probe command");
        let start = Instant::now();

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RunnerError::CommandNotFound(command.to_string())
                } else {
                    RunnerError::SpawnFailed(e.to_string())
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::SpawnFailed("stdout pipe missing".to_string()))?;

        // Reader thread drains stdout so the child cannot block on a full
        // pipe while we poll for exit.
        let cap = self.max_output_bytes;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let mut limited = stdout.take(cap as u64);
            let _ = limited.read_to_end(&mut buf);
            buf
        });

        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if start.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        debug!(command, timeout = ?self.timeout, "probe command timed out");
                        return Err(RunnerError::Timeout(self.timeout));
                    }
                    thread::sleep(Duration::from_millis(WAIT_POLL_MS));
                }
            }
        };

        let buf = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(RunnerError::NonZeroExit {
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(String::from_utf8_lossy(&buf).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let runner = ProbeRunner::default();
        let out = runner.run("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn missing_command_is_not_found() {
        let runner = ProbeRunner::default();
        let err = runner
            .run("census-no-such-command-zz", &[])
            .unwrap_err();
        assert!(matches!(err, RunnerError::CommandNotFound(_)));
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let runner = ProbeRunner::default();
        let err = runner.run("false", &[]).unwrap_err();
        assert!(matches!(err, RunnerError::NonZeroExit { .. }));
    }

    #[test]
    fn slow_command_times_out() {
        let runner = ProbeRunner::with_timeout(Duration::from_millis(100));
        let start = Instant::now();
        let err = runner.run("sleep", &["5"]).unwrap_err();
        assert!(matches!(err, RunnerError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
