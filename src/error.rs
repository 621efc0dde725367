use std::{fmt::Display, string::FromUtf8Error, sync::PoisonError};

use serde::{de, ser};

/// Custom Result type for foxdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for foxdb
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// SQL parsing error, possibly several joined messages
    Parse(String),
    /// A catalog object with the same name already exists in its scope
    Duplicate(String),
    /// A catalog object (or column) could not be found
    NotFound(String),
    /// The planner cannot build a plan for the statement
    Plan(String),
    /// Reserved for physical planning failures
    Optimize(String),
    /// Failure while running a physical plan
    Execution(String),
    /// A value's type does not match the column it is bound to
    TypeMismatch(String),
    /// Unrecognized backslash command
    UnknownCommand(String),
    /// The statement was cancelled by its caller
    Cancelled,
    /// Internal error (storage, serialization, I/O, etc.)
    Internal(String),
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(value: bincode::Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Execution(value.to_string())
    }
}

impl From<bytes::TryGetError> for Error {
    fn from(value: bytes::TryGetError) -> Self {
        Error::Execution(format!("record read error: {}", value))
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Internal(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Internal(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error: {}", err),
            Error::Duplicate(err) => write!(f, "duplicate name: {}", err),
            Error::NotFound(err) => write!(f, "not found: {}", err),
            Error::Plan(err) => write!(f, "plan error: {}", err),
            Error::Optimize(err) => write!(f, "optimize error: {}", err),
            Error::Execution(err) => write!(f, "execution error: {}", err),
            Error::TypeMismatch(err) => write!(f, "type mismatch: {}", err),
            Error::UnknownCommand(cmd) => write!(f, "unknown command: {}", cmd),
            Error::Cancelled => write!(f, "statement cancelled"),
            Error::Internal(err) => write!(f, "internal error: {}", err),
        }
    }
}
