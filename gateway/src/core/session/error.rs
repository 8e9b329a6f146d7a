use thiserror::Error;

/// Errors raised while establishing or driving a voice session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection parameters identify neither a call nor a chat; the socket is closed
    #[error("Missing session identifiers: {0}")]
    MissingIdentifiers(String),

    /// Another connection already owns this session key
    #[error("Session already active: {0}")]
    AlreadyActive(String),

    /// Inbound message could not be parsed; the message is discarded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Inbound audio payload could not be decoded; the frame is discarded
    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),

    #[error("Session closed")]
    Closed,
}

impl SessionError {
    /// Whether the connection must be closed because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::MissingIdentifiers(_) | SessionError::AlreadyActive(_)
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
