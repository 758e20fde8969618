//! User error model.
//!
//! One taxonomy is shared by the data access layer and the dispatcher. The
//! dispatcher derives response status from [`UserError::kind`], never from
//! the message text.

use thiserror::Error;

/// Result type used across the users service.
pub type UserResult<T> = Result<T, UserError>;

/// Which precondition a conditional write failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteRejection {
    /// Insert refused: a record with the same ID is already stored.
    AlreadyExists,
    /// Replace/delete refused: no record with that ID is stored.
    DoesNotExist,
}

impl core::fmt::Display for WriteRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WriteRejection::AlreadyExists => f.write_str("user already exists"),
            WriteRejection::DoesNotExist => f.write_str("user does not exist"),
        }
    }
}

/// Whether a failed store call was reading or writing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreAccess {
    Read,
    Write,
}

impl core::fmt::Display for StoreAccess {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreAccess::Read => f.write_str("failed to fetch record"),
            StoreAccess::Write => f.write_str("could not put item"),
        }
    }
}

/// Error raised by a users operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    /// The request body (or a required parameter) is structurally invalid.
    #[error("invalid user data: {0}")]
    InvalidInput(String),

    /// No record exists for the requested ID.
    #[error("user does not exist")]
    NotFound,

    /// The store refused a conditional write.
    #[error("could not put item: {0}")]
    StoreWriteRejected(WriteRejection),

    /// The store call itself failed (timeout, throttling, connectivity).
    #[error("{access}: {reason}")]
    StoreUnavailable { access: StoreAccess, reason: String },

    /// A stored record could not be turned back into a `User`.
    #[error("failed to unmarshal record: {0}")]
    Deserialization(String),
}

/// Discriminant of [`UserError`], used for status mapping and metrics labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    StoreWriteRejected,
    StoreUnavailable,
    Deserialization,
}

impl UserError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn read_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            access: StoreAccess::Read,
            reason: reason.into(),
        }
    }

    pub fn write_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            access: StoreAccess::Write,
            reason: reason.into(),
        }
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    pub fn already_exists() -> Self {
        Self::StoreWriteRejected(WriteRejection::AlreadyExists)
    }

    pub fn does_not_exist() -> Self {
        Self::StoreWriteRejected(WriteRejection::DoesNotExist)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::InvalidInput(_) => ErrorKind::InvalidInput,
            UserError::NotFound => ErrorKind::NotFound,
            UserError::StoreWriteRejected(_) => ErrorKind::StoreWriteRejected,
            UserError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            UserError::Deserialization(_) => ErrorKind::Deserialization,
        }
    }
}
