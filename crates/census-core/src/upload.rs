//! One-shot upload of the diagnostic record.
//!
//! The uploader serializes the record to its JSON wire form and performs
//! exactly one blocking POST. Every attempt produces a `SubmissionOutcome`;
//! there is no error path and no retry here. Retry policy belongs to the
//! caller, and the current design performs none — the user may simply run
//! the submission again.
//!
//! Classification priority:
//! 1. transport refused or unreachable    → `ConnectionFailure`
//! 2. no response within the deadline     → `TimeoutFailure`
//! 3. response with non-success status    → `ServerError`
//! 4. response with success status        → `Success`
//! 5. anything else                       → `UnknownFailure`

use crate::collect::DiagnosticRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default deadline for the whole request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tagged result of one upload attempt. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// 2xx response.
    Success { status: u16, body: String },
    /// Response received with a non-success status.
    ServerError { status: u16, body: String },
    /// Transport could not be established or was refused.
    ConnectionFailure,
    /// Transport established but no response within the deadline.
    TimeoutFailure,
    /// Malformed response, bad URL, serialization failure, and the rest.
    UnknownFailure { detail: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    /// Message shown to the user for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionOutcome::Success { status, body } => {
                format!("Status {status}: {body}")
            }
            SubmissionOutcome::ServerError { status, body } => {
                format!("{status}: an HTTP error occurred. Server message: {body}")
            }
            SubmissionOutcome::ConnectionFailure => {
                "Error connecting to the server. Please check your internet connection and try again."
                    .to_string()
            }
            SubmissionOutcome::TimeoutFailure => {
                "Request timed out. Please check your internet connection and try again."
                    .to_string()
            }
            SubmissionOutcome::UnknownFailure { detail } => {
                format!("Sending data was unsuccessful, please try again. ({detail})")
            }
        }
    }
}

impl std::fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionOutcome::Success { status, .. } => write!(f, "success ({status})"),
            SubmissionOutcome::ServerError { status, .. } => write!(f, "server_error ({status})"),
            SubmissionOutcome::ConnectionFailure => write!(f, "connection_failure"),
            SubmissionOutcome::TimeoutFailure => write!(f, "timeout_failure"),
            SubmissionOutcome::UnknownFailure { .. } => write!(f, "unknown_failure"),
        }
    }
}

/// One transmission attempt. The seam the flow is tested through.
pub trait Uploader {
    fn submit(&self, endpoint: &str, record: &DiagnosticRecord) -> SubmissionOutcome;
}

/// Blocking HTTP uploader.
pub struct HttpUploader {
    agent: ureq::Agent,
}

impl HttpUploader {
    /// Uploader with an explicit request deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpUploader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Uploader for HttpUploader {
    fn submit(&self, endpoint: &str, record: &DiagnosticRecord) -> SubmissionOutcome {
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                return SubmissionOutcome::UnknownFailure {
                    detail: format!("payload serialization failed: {e}"),
                }
            }
        };
        debug!(endpoint, bytes = payload.len(), "posting diagnostic record");

        match self
            .agent
            .post(endpoint)
            .set("Content-Type", "application/json")
            .send_string(&payload)
        {
            Ok(response) => {
                let status = response.status();
                match response.into_string() {
                    Ok(body) => SubmissionOutcome::Success { status, body },
                    Err(e) => SubmissionOutcome::UnknownFailure {
                        detail: format!("unreadable response body: {e}"),
                    },
                }
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                SubmissionOutcome::ServerError { status, body }
            }
            Err(ureq::Error::Transport(transport)) => classify_transport(&transport),
        }
    }
}

fn classify_transport(transport: &ureq::Transport) -> SubmissionOutcome {
    match transport.kind() {
        ureq::ErrorKind::ConnectionFailed
        | ureq::ErrorKind::Dns
        | ureq::ErrorKind::ProxyConnect => SubmissionOutcome::ConnectionFailure,
        ureq::ErrorKind::Io => {
            if transport_is_timeout(transport) {
                SubmissionOutcome::TimeoutFailure
            } else {
                // The connection died underneath an established transport.
                SubmissionOutcome::ConnectionFailure
            }
        }
        _ => SubmissionOutcome::UnknownFailure {
            detail: transport.to_string(),
        },
    }
}

/// The deadline surfaces as an io error wrapped somewhere in the source
/// chain; fall back to the message for transports that elide it.
fn transport_is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            );
        }
        source = err.source();
    }
    transport.to_string().to_lowercase().contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::sample_record;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// One-connection stub server answering with a canned HTTP response.
    fn spawn_server(response: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/submit", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 8192];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (endpoint, handle)
    }

    #[test]
    fn http_200_is_success() {
        let (endpoint, handle) =
            spawn_server("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
        let outcome = HttpUploader::default().submit(&endpoint, &sample_record());
        handle.join().unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Success {
                status: 200,
                body: "ok".into()
            }
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn http_500_is_server_error_with_body() {
        let (endpoint, handle) = spawn_server(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 12\r\nConnection: close\r\n\r\nserver error",
        );
        let outcome = HttpUploader::default().submit(&endpoint, &sample_record());
        handle.join().unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::ServerError {
                status: 500,
                body: "server error".into()
            }
        );
    }

    #[test]
    fn refused_connection_is_connection_failure() {
        // Bind to grab a free port, then close it again before submitting.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/submit", listener.local_addr().unwrap());
        drop(listener);

        let outcome = HttpUploader::default().submit(&endpoint, &sample_record());
        assert_eq!(outcome, SubmissionOutcome::ConnectionFailure);
    }

    #[test]
    fn silent_server_is_timeout_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/submit", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                // Hold the connection open past the client deadline.
                thread::sleep(std::time::Duration::from_millis(1500));
                drop(stream);
            }
        });

        let uploader = HttpUploader::new(std::time::Duration::from_millis(300));
        let outcome = uploader.submit(&endpoint, &sample_record());
        handle.join().unwrap();
        assert_eq!(outcome, SubmissionOutcome::TimeoutFailure);
    }

    #[test]
    fn invalid_url_is_unknown_failure() {
        let outcome = HttpUploader::default().submit("not a url", &sample_record());
        assert!(matches!(
            outcome,
            SubmissionOutcome::UnknownFailure { .. }
        ));
    }

    #[test]
    fn outcome_user_messages() {
        assert!(SubmissionOutcome::ConnectionFailure
            .user_message()
            .contains("internet connection"));
        assert!(SubmissionOutcome::TimeoutFailure
            .user_message()
            .contains("timed out"));
        let server = SubmissionOutcome::ServerError {
            status: 500,
            body: "server error".into(),
        };
        assert!(server.user_message().contains("500"));
        assert!(server.user_message().contains("server error"));
    }
}
