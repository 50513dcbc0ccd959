use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Public user representation; also the profile shape the session client
/// consumes from `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<User> for UserOut {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            is_admin: u.is_admin,
            is_active: u.is_active,
        }
    }
}

/// Admin-side partial update; omitted fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}
