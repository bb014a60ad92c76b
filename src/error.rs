//! Error types for the assistant core.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Speech capture or playback error.
    ///
    /// Not produced by the built-in [`NullSpeech`](crate::speech::NullSpeech)
    /// adapter; real [`SpeechAdapter`](crate::speech::SpeechAdapter)
    /// implementations report engine failures through this variant.
    #[error("speech error: {0}")]
    Speech(String),

    /// System backend (file/app) collaborator error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Document collaborator error.
    ///
    /// Reserved for [`DocumentSource`](crate::document::DocumentSource)
    /// implementations that load and parse files; nothing in the core
    /// constructs it.
    #[error("document error: {0}")]
    Document(String),

    /// Arithmetic expression error.
    #[error("expression error: {0}")]
    Expression(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
