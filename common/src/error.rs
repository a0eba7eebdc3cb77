use std::fmt;

/// A failed platform call, named after the step that made it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {message}")]
pub struct PlatformError {
    context: &'static str,
    message: String,
}

impl PlatformError {
    pub fn new(context: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            context,
            message: cause.to_string(),
        }
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal start-up failures. The display text is what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("window failed to be created")]
    WindowCreationFailed(#[source] PlatformError),

    #[error("Direct3D failed to initialise")]
    DeviceInitFailed(#[source] PlatformError),
}

impl Error {
    /// The platform call that failed.
    pub fn cause(&self) -> &PlatformError {
        match self {
            Error::WindowCreationFailed(e) | Error::DeviceInitFailed(e) => e,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn user_facing_messages_are_fixed() {
        let window = Error::WindowCreationFailed(PlatformError::new("register class", "denied"));
        let device = Error::DeviceInitFailed(PlatformError::new("get back buffer", "E_FAIL"));

        assert_eq!(window.to_string(), "window failed to be created");
        assert_eq!(device.to_string(), "Direct3D failed to initialise");
    }

    #[test]
    fn source_names_the_failing_step() {
        let error = Error::DeviceInitFailed(PlatformError::new(
            "create render target view",
            "0x80070057",
        ));

        let source = error.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("create render target view: 0x80070057")
        );
        assert_eq!(error.cause().context(), "create render target view");
        assert_eq!(error.cause().message(), "0x80070057");
    }
}
