//! User identity model.
//!
//! There is no credential check anywhere: a user is whoever the role picker says.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two roles the platform distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Company,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Company => "company",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserType::Student),
            "company" => Ok(UserType::Company),
            other => Err(format!("Unknown user type '{other}' (expected student or company)")),
        }
    }
}

/// A signed-in user of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Display name, embedded in the assistant's system instruction
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, user_type: UserType) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            user_type,
        }
    }

    /// The fixed demo identity the role picker signs in as.
    pub fn demo(user_type: UserType) -> Self {
        match user_type {
            UserType::Student => Self::new("Alex Doe", "alex.doe@university.edu", user_type),
            UserType::Company => Self::new("Rehan Khan", "rehan5426nasar@gmail.com", user_type),
        }
    }
}
