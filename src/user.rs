use chrono::NaiveDateTime;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A volunteer or administrator, as reported by the backend.
///
/// Only `id` and `is_admin` mean anything to the session machinery. Every
/// other field the backend sends is kept in `extra` so the record can be
/// cached and handed back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new<N, E>(id: i64, full_name: N, email: E, is_admin: bool) -> Self
    where
        N: Into<String>,
        E: Into<String>,
    {
        User {
            id,
            full_name: full_name.into(),
            email: email.into(),
            is_admin,
            extra: Map::new(),
        }
    }

    /// The name the volunteer performs under, if the backend sent one.
    pub fn clown_name(&self) -> Option<&str> {
        self.extra.get("clown_name").and_then(Value::as_str)
    }

    pub fn cpf(&self) -> Option<&str> {
        self.extra.get("cpf").and_then(Value::as_str)
    }
}

/// The details needed to create a new account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub clown_name: String,
    pub birth_date: NaiveDateTime,
    /// The Brazilian taxpayer number, usable as a login identifier.
    pub cpf: String,
    pub email: String,
    pub password: String,
}

/// A plain acknowledgement from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let src = r#"{
            "id": 7,
            "full_name": "Maria Silva",
            "email": "maria@x.org",
            "is_admin": false,
            "clown_name": "Dra. Pipoca",
            "cpf": "123.456.789-00",
            "is_active": true
        }"#;

        let user: User = serde_json::from_str(src).unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.clown_name(), Some("Dra. Pipoca"));
        assert_eq!(user.cpf(), Some("123.456.789-00"));
        assert_eq!(user.extra.get("is_active"), Some(&Value::Bool(true)));

        let reparsed: User =
            serde_json::from_str(&serde_json::to_string(&user).unwrap())
                .unwrap();
        assert_eq!(reparsed, user);
    }

    #[test]
    fn only_the_id_is_mandatory() {
        let user: User = serde_json::from_str(r#"{"id": 1}"#).unwrap();

        assert_eq!(user, User::new(1, "", "", false));
    }
}
