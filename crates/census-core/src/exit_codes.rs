//! Exit codes for the census CLI.
//!
//! Exit codes communicate the submission outcome without output parsing.
//!
//! Ranges:
//! - 0: success (shown, submitted, or status reported)
//! - 1-9: internal errors
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: submission flow outcomes

/// Exit codes for census operations.
///
/// These codes are a stable contract for scripts and packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Ok = 0,

    /// Internal error.
    InternalError = 1,

    /// Invalid arguments or configuration.
    UsageError = 10,

    /// User declined submission.
    Declined = 20,

    /// This installation already submitted; nothing was sent.
    AlreadySubmitted = 21,

    /// The transmission attempt failed; the guard stays unmarked.
    SubmissionFailed = 22,
}

impl ExitCode {
    /// Terminate the process with this code.
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Ok as i32, 0);
        assert_eq!(ExitCode::InternalError as i32, 1);
        assert_eq!(ExitCode::UsageError as i32, 10);
        assert_eq!(ExitCode::Declined as i32, 20);
        assert_eq!(ExitCode::AlreadySubmitted as i32, 21);
        assert_eq!(ExitCode::SubmissionFailed as i32, 22);
    }
}
