//! Turning request failures into messages for the user.

use horizon_facet_core::Signal;
use horizon_facet_core::logging::targets;

use crate::error::RequestError;

/// Translates [`RequestError`]s into user-facing messages.
///
/// Applications create one presenter at startup, connect a slot to
/// [`presented`](Self::presented) to show the message (a banner, a toast),
/// and route every failed request through [`present`](Self::present).
/// Presenting never panics, even if a slot does nothing.
#[derive(Debug)]
pub struct FailurePresenter {
    presented: Signal<String>,
    fallback: String,
    show_server_messages: bool,
}

impl Default for FailurePresenter {
    fn default() -> Self {
        Self {
            presented: Signal::new(),
            fallback: "Something went wrong. Please try again.".to_string(),
            show_server_messages: true,
        }
    }
}

impl FailurePresenter {
    /// Create a presenter with the default wording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message used when nothing more specific applies.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Whether client-error messages from the server are shown verbatim.
    pub fn with_server_messages(mut self, show: bool) -> Self {
        self.show_server_messages = show;
        self
    }

    /// Signal emitted with each presented message.
    pub fn presented(&self) -> &Signal<String> {
        &self.presented
    }

    /// The message shown for `err`.
    pub fn message_for(&self, err: &RequestError) -> String {
        match err {
            RequestError::Status { status, message } => match status {
                401 => "Your session has expired. Please sign in again.".to_string(),
                403 => "You do not have permission to do that.".to_string(),
                404 => "The requested item could not be found.".to_string(),
                408 => "The request timed out. Please try again.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                400..=499 if self.show_server_messages && !message.trim().is_empty() => {
                    message.trim().to_string()
                }
                500..=599 => "The server ran into a problem. Please try again later.".to_string(),
                _ => self.fallback.clone(),
            },
            RequestError::Timeout => "The request timed out. Please try again.".to_string(),
            RequestError::Connection(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            _ => self.fallback.clone(),
        }
    }

    /// Log `err`, emit its message on [`presented`](Self::presented) and
    /// return the message.
    pub fn present(&self, err: &RequestError) -> String {
        let message = self.message_for(err);
        tracing::warn!(
            target: targets::NET,
            status = ?err.status_code(),
            error = %err,
            "presenting request failure"
        );
        self.presented.emit(message.clone());
        message
    }

    /// Present the failure of `result`, if any, and pass the value through.
    pub fn handle<T>(&self, result: Result<T, RequestError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.present(&err);
                None
            }
        }
    }
}
