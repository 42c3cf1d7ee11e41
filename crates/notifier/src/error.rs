use thiserror::Error;

/// Errors raised by outbound channel providers.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
