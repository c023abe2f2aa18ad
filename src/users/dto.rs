use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Public part of a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for Profile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
