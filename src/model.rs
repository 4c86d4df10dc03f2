//! User records as exchanged with the `/users` backend.
//!
//! The backend speaks `_id`, `firstname`, `lastname`, `email` and `address`.
//! Decoding is lenient at this boundary: ids may be strings or numbers and
//! missing or `null` text fields become empty strings, so nothing downstream
//! has to deal with absent values.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One user record, identified by its server-assigned id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(rename = "firstname", alias = "firstName", default, deserialize_with = "lenient_text")]
    pub first_name: String,
    #[serde(rename = "lastname", alias = "lastName", default, deserialize_with = "lenient_text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: String,
}

/// The editable part of a user: the body of create and update requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    #[serde(rename = "firstname", alias = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastname", alias = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

/// Selects one of the four text columns of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserField {
    #[default]
    FirstName,
    LastName,
    Email,
    Address,
}

impl UserField {
    /// All fields in table/form order.
    pub const ALL: [UserField; 4] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::Email,
        UserField::Address,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UserField::FirstName => "First Name",
            UserField::LastName => "Last Name",
            UserField::Email => "Email",
            UserField::Address => "Address",
        }
    }

    pub fn next(self) -> Self {
        match self {
            UserField::FirstName => UserField::LastName,
            UserField::LastName => UserField::Email,
            UserField::Email => UserField::Address,
            UserField::Address => UserField::FirstName,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            UserField::FirstName => UserField::Address,
            UserField::LastName => UserField::FirstName,
            UserField::Email => UserField::LastName,
            UserField::Address => UserField::Email,
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl User {
    pub fn from_parts(id: impl Into<String>, fields: UserFields) -> Self {
        Self {
            id: id.into(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            address: fields.address,
        }
    }

    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Address => &self.address,
        }
    }

    /// Copy of the editable fields, used to pre-populate the edit form.
    pub fn fields(&self) -> UserFields {
        UserFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
        }
    }
}

impl UserFields {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    pub fn get(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Address => &self.address,
        }
    }

    pub fn get_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::FirstName => &mut self.first_name,
            UserField::LastName => &mut self.last_name,
            UserField::Email => &mut self.email,
            UserField::Address => &mut self.address,
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
