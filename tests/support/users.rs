//! User model used across the integration suites.

#![allow(dead_code)]

use record_store::{Model, Persistable, Record};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Persistable)]
#[persistable(collection = "users")]
pub struct UserRecord {
    #[persistable(id)]
    pub user_id: String,
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
}

impl Record for UserRecord {
    type Model = User;

    fn to_model(&self) -> User {
        User {
            id: self.user_id.clone(),
            name: self.name.clone(),
            age: self.age,
            email: self.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: &str, name: &str, age: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            age,
            email: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

impl Model for User {
    type Record = UserRecord;

    fn to_record(&self) -> UserRecord {
        UserRecord {
            user_id: self.id.clone(),
            name: self.name.clone(),
            age: self.age,
            email: self.email.clone(),
        }
    }
}

/// A record type with no model, stored in its own collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Persistable)]
pub struct AuditEntry {
    pub id: String,
    pub message: String,
}
