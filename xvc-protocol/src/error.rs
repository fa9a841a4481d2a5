use std::{error::Error, fmt::Display, io};

/// Errors that may occur when reading a command from a stream.
#[derive(Debug)]
pub enum ProtocolError {
    Io(io::Error),
    InvalidCommand(String),
    InvalidCommandPrefix(String),
    EmptyShift,
    OversizeShift { max: usize, got: usize },
}

impl From<io::Error> for ProtocolError {
    fn from(value: io::Error) -> Self {
        ProtocolError::Io(value)
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Io(error) => write!(f, "{}", error),
            ProtocolError::InvalidCommand(cmd) => {
                write!(f, "Received invalid command {:?}", cmd)
            }
            ProtocolError::InvalidCommandPrefix(prefix) => {
                write!(f, "Received invalid command with prefix {:?}", prefix)
            }
            ProtocolError::EmptyShift => {
                write!(f, "Received shift command with zero bits")
            }
            ProtocolError::OversizeShift { max, got } => {
                write!(
                    f,
                    "Shift vector too large! Maximum is {} bytes, but got {}",
                    max, got
                )
            }
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProtocolError::Io(error) => Some(error),
            _ => None,
        }
    }
}
