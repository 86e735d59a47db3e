//! Outbound message notification.
//!
//! # Responsibility
//! - Define the seam through which a message body leaves the process.
//! - Provide the HTTP form-post implementation and a disabled stand-in.
//!
//! # Invariants
//! - Callers treat notification as fire-and-forget: a failure is reported
//!   but never rolls back local state.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod http;

pub use http::{HttpNotifier, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};

/// Error raised by notifier implementations.
#[derive(Debug)]
pub enum NotifyError {
    /// Endpoint is not an absolute http(s) URL.
    InvalidEndpoint { endpoint: String, reason: String },
    /// Request could not be built or delivered.
    Transport(reqwest::Error),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint { endpoint, reason } => {
                write!(f, "invalid notification endpoint `{endpoint}`: {reason}")
            }
            Self::Transport(err) => write!(f, "notification request failed: {err}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEndpoint { .. } => None,
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Sends a message body to an external endpoint.
pub trait Notifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        (**self).notify(body)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        (**self).notify(body)
    }
}

/// Notifier used when outbound calls are switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        log::info!(
            "event=notify module=notify status=skip reason=disabled body_len={}",
            body.len()
        );
        Ok(())
    }
}
