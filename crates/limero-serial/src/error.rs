use limero_codec::ErrorClass;
use limero_msg::MsgError;

/// Errors that can occur while moving messages over a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// An I/O error occurred while reading or writing the stream.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded.
    #[error(transparent)]
    Msg(#[from] MsgError),

    /// The stream reached EOF or stopped accepting bytes.
    #[error("connection closed")]
    ConnectionClosed,
}

impl SerialError {
    /// Codec class for message errors, `None` for stream errors.
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            SerialError::Msg(err) => Some(err.class()),
            SerialError::Io(_) | SerialError::ConnectionClosed => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;
