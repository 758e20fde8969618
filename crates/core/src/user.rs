//! The user record.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{UserError, UserResult};
use crate::id::UserId;

/// A stored user.
///
/// Field names on the wire are `ID`, `Name`, `LastName` and `Age`. Fields
/// missing from a request body take their default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID", default)]
    pub id: UserId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,
    #[serde(rename = "Age", default)]
    pub age: i64,
}

impl User {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            last_name: last_name.into(),
            age,
        }
    }

    /// Parse a request body. Any structural JSON failure is `InvalidInput`.
    pub fn from_json(body: &[u8]) -> UserResult<Self> {
        serde_json::from_slice(body).map_err(|e| UserError::invalid_input(e.to_string()))
    }

    /// A user is writable only with a non-empty ID.
    pub fn validate(&self) -> UserResult<()> {
        if self.id.is_empty() {
            return Err(UserError::invalid_input("ID must not be empty"));
        }
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    const KEY_ATTRIBUTE: &'static str = "ID";

    fn id(&self) -> &UserId {
        &self.id
    }
}
