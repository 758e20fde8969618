//! Strongly-typed user identifier.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::UserError;

/// Primary key of a user record.
///
/// Any string is accepted when deserializing so that structural parsing never
/// fails on an empty ID; emptiness is rejected by [`crate::User::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create an identifier, rejecting empty or all-whitespace input.
    pub fn new(value: impl Into<String>) -> Result<Self, UserError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(UserError::invalid_input("ID must not be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
