//! `User` ⇄ attribute-map conversion.

use usersvc_core::{Entity, User, UserError, UserId, UserResult};

use crate::kv::{AttributeValue, Item};

const NAME: &str = "Name";
const LAST_NAME: &str = "LastName";
const AGE: &str = "Age";

/// Encode a user as a stored item.
pub fn to_item(user: &User) -> Item {
    let mut item = Item::new();
    item.insert(User::KEY_ATTRIBUTE.to_string(), AttributeValue::string(user.id.as_str()));
    item.insert(NAME.to_string(), AttributeValue::string(&user.name));
    item.insert(LAST_NAME.to_string(), AttributeValue::string(&user.last_name));
    item.insert(AGE.to_string(), AttributeValue::number(user.age));
    item
}

/// Decode a stored item back into a user.
///
/// The key attribute is mandatory. Other attributes missing from the item take
/// their default value; attributes present with the wrong type, or an `Age`
/// that is not an integer, fail with `Deserialization`.
pub fn from_item(item: &Item) -> UserResult<User> {
    let id = match item.get(User::KEY_ATTRIBUTE) {
        Some(value) => string_attr(User::KEY_ATTRIBUTE, value)?,
        None => {
            return Err(UserError::deserialization(format!(
                "missing attribute '{}'",
                User::KEY_ATTRIBUTE
            )));
        }
    };
    let id = UserId::new(id).map_err(|_| UserError::deserialization("empty ID attribute"))?;

    let name = optional_string(item, NAME)?;
    let last_name = optional_string(item, LAST_NAME)?;
    let age = match item.get(AGE) {
        Some(value) => {
            let raw = value.as_n().ok_or_else(|| type_mismatch(AGE, "N", value))?;
            raw.parse::<i64>().map_err(|e| {
                UserError::deserialization(format!("attribute '{AGE}' is not an integer ({raw}): {e}"))
            })?
        }
        None => 0,
    };

    Ok(User::new(id, name, last_name, age))
}

fn optional_string(item: &Item, attr: &str) -> UserResult<String> {
    item.get(attr)
        .map(|value| string_attr(attr, value))
        .transpose()
        .map(Option::unwrap_or_default)
}

fn string_attr(attr: &str, value: &AttributeValue) -> UserResult<String> {
    value
        .as_s()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch(attr, "S", value))
}

fn type_mismatch(attr: &str, expected: &str, value: &AttributeValue) -> UserError {
    UserError::deserialization(format!(
        "attribute '{attr}' must be {expected}, found {}",
        value.type_tag()
    ))
}
