use colored::*;
use dtn_registry_core::{client::RegistrationError, schema::ResponseStatus};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ResponseStatus> for FormattedString {
    fn from(status: ResponseStatus) -> Self {
        FormattedString(status.message)
    }
}

impl From<RegistrationError> for FormattedString {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Rpc(status) => FormattedString(format!(
                "{} code={:?} message={:?}",
                "gRPC Failed:".red().bold(),
                status.code(),
                status.message()
            )),
            RegistrationError::Timeout(_) => {
                FormattedString(format!("{} {}", "Timed Out:".red().bold(), err))
            }
            err @ (RegistrationError::InvalidTarget(..)
            | RegistrationError::ConnectionFailed(..)
            | RegistrationError::NotReady(_)) => {
                FormattedString(format!("{} {}", "Connection Error:".red().bold(), err))
            }
        }
    }
}
