use std::{fmt, time::Duration};

/// Where and how a [`super::RegistrationClient`] connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server URI (e.g. `http://localhost:50051`).
    pub target: String,
    /// Upper bound for establishing the connection. Unset means the transport default.
    pub connect_timeout: Option<Duration>,
    /// Deadline of each `registerAdapter` call. Unset means no deadline.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connect_timeout: None,
            request_timeout: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Lifecycle of a single `registerAdapter` call.
///
/// `Created -> Sent -> Completed | Failed`. There is no way back from a terminal state;
/// a retry is a new call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// The request is built but not transmitted.
    Created,
    /// The request is in flight.
    Sent,
    /// A response was received and decoded.
    Completed,
    /// The call ended with an error.
    Failed,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Completed | CallState::Failed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Created => "created",
            CallState::Sent => "sent",
            CallState::Completed => "completed",
            CallState::Failed => "failed",
        };
        f.write_str(name)
    }
}
