//! Centralized error handling for the report-card portal.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`PortalError`]. The enum mixes two kinds of failure:
//!
//! ## Rejections
//!
//! Outcomes the caller can act on by asking the user again:
//!
//! ```
//! use reportcard::error::PortalError;
//!
//! fn prompt_for(err: &PortalError) -> &'static str {
//!     match err {
//!         PortalError::InvalidPin => "Please re-enter your PIN",
//!         PortalError::PinAlreadyUsedByOther => "This PIN belongs to another student",
//!         PortalError::UsageLimitExceeded { .. } => "Buy a new PIN",
//!         PortalError::RecordNotFound => "Check the name, class, session and term",
//!         _ => "Something went wrong, try again later",
//!     }
//! }
//! ```
//!
//! ## Internal failures
//!
//! I/O and codec problems. The ledger and intake code classify them as
//! [`PortalError::LedgerUnavailable`] or [`PortalError::StorageUnavailable`]
//! through the [`ResultExt`] extension trait:
//!
//! ```no_run
//! use reportcard::error::{Result, ResultExt as _};
//!
//! fn read_ledger(path: &std::path::Path) -> Result<String> {
//!     std::fs::read_to_string(path).ledger_unavailable("Failed to read ledger")
//! }
//! ```

use std::fmt;

/// Main error type for portal operations.
#[derive(Debug)]
pub enum PortalError {
    /// The PIN is not on the allow-list.
    InvalidPin,

    /// The PIN is already bound to a different identity.
    PinAlreadyUsedByOther,

    /// The PIN has been used `cap` times for this identity.
    UsageLimitExceeded { cap: u32 },

    /// No directory row matches the requested identity.
    RecordNotFound,

    /// Name, class, session or term is blank or cannot be stored in a row.
    InvalidIdentity(String),

    /// Reading or writing the ledger (or the allow-list) failed.
    LedgerUnavailable(String),

    /// Reading or writing the directory or name index failed.
    StorageUnavailable(String),

    /// Invalid configuration
    Config(String),

    /// Unclassified I/O error
    Io(std::io::Error),

    /// CSV encoding or decoding error
    Codec(String),
}

impl PortalError {
    /// True for the outcomes a user can correct by re-entering input.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidPin
                | Self::PinAlreadyUsedByOther
                | Self::UsageLimitExceeded { .. }
                | Self::RecordNotFound
                | Self::InvalidIdentity(_)
        )
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPin => "INVALID_PIN",
            Self::PinAlreadyUsedByOther => "PIN_ALREADY_USED",
            Self::UsageLimitExceeded { .. } => "USAGE_LIMIT_EXCEEDED",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidIdentity(_) => "INVALID_IDENTITY",
            Self::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Config(_) => "CONFIG",
            Self::Io(_) | Self::Codec(_) => "INTERNAL",
        }
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin => write!(f, "Invalid PIN."),
            Self::PinAlreadyUsedByOther => write!(f, "PIN has been used by someone else."),
            Self::UsageLimitExceeded { .. } => write!(f, "PIN usage limit exceeded."),
            Self::RecordNotFound => write!(f, "No matching record found."),
            Self::InvalidIdentity(msg) => write!(f, "{msg}"),
            Self::LedgerUnavailable(msg) => write!(f, "Ledger unavailable: {msg}"),
            Self::StorageUnavailable(msg) => write!(f, "Storage unavailable: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Codec(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for PortalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PortalError {
    fn from(err: csv::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<tempfile::PersistError> for PortalError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<PortalError> for String {
    fn from(err: PortalError) -> Self {
        err.to_string()
    }
}

/// Result type alias for portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Extension trait that classifies low-level failures by the component they hit.
pub trait ResultExt<T> {
    /// Report any error as [`PortalError::LedgerUnavailable`], prefixed with `msg`.
    fn ledger_unavailable(self, msg: impl Into<String>) -> Result<T>;

    /// Report any error as [`PortalError::StorageUnavailable`], prefixed with `msg`.
    fn storage_unavailable(self, msg: impl Into<String>) -> Result<T>;

    /// Report any error as [`PortalError::Config`], with a lazily built prefix.
    fn with_config_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PortalError>,
{
    fn ledger_unavailable(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: PortalError = e.into();
            PortalError::LedgerUnavailable(format!("{}: {}", msg.into(), detail(&err)))
        })
    }

    fn storage_unavailable(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: PortalError = e.into();
            PortalError::StorageUnavailable(format!("{}: {}", msg.into(), detail(&err)))
        })
    }

    fn with_config_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: PortalError = e.into();
            PortalError::Config(format!("{}: {}", f(), detail(&err)))
        })
    }
}

// Avoids "Ledger unavailable: ...: Ledger unavailable: ..." when errors are re-wrapped.
fn detail(err: &PortalError) -> String {
    match err {
        PortalError::LedgerUnavailable(msg)
        | PortalError::StorageUnavailable(msg)
        | PortalError::Config(msg)
        | PortalError::Codec(msg) => msg.clone(),
        PortalError::Io(e) => e.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(PortalError::InvalidPin.to_string(), "Invalid PIN.");
        assert_eq!(
            PortalError::PinAlreadyUsedByOther.to_string(),
            "PIN has been used by someone else."
        );
        assert_eq!(
            PortalError::UsageLimitExceeded { cap: 5 }.to_string(),
            "PIN usage limit exceeded."
        );
        assert_eq!(
            PortalError::RecordNotFound.to_string(),
            "No matching record found."
        );
    }

    #[test]
    fn test_rejections_are_distinguished_from_internal_errors() {
        assert!(PortalError::InvalidPin.is_rejection());
        assert!(PortalError::RecordNotFound.is_rejection());
        assert!(PortalError::InvalidIdentity("blank".to_owned()).is_rejection());
        assert!(!PortalError::LedgerUnavailable("disk".to_owned()).is_rejection());
        assert!(!PortalError::StorageUnavailable("disk".to_owned()).is_rejection());
        assert_eq!(PortalError::UsageLimitExceeded { cap: 5 }.code(), "USAGE_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_error_conversion_to_string() {
        let s: String = PortalError::InvalidPin.into();
        assert_eq!(s, "Invalid PIN.");
    }

    #[test]
    fn test_ledger_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "records.csv",
        ));

        let err = result
            .ledger_unavailable("Failed to read ledger")
            .expect_err("io failure should surface");
        assert!(matches!(err, PortalError::LedgerUnavailable(_)));
        assert!(err.to_string().contains("Failed to read ledger"));
        assert!(err.to_string().contains("records.csv"));
    }

    #[test]
    fn test_storage_context_does_not_repeat_prefix() {
        let inner: Result<()> = Err(PortalError::StorageUnavailable("disk full".to_owned()));
        let err = inner
            .storage_unavailable("Failed to append report")
            .expect_err("error should surface");
        assert_eq!(
            err.to_string(),
            "Storage unavailable: Failed to append report: disk full"
        );
    }
}
