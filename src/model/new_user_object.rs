use serde::{Deserialize, Serialize};

use crate::model::user_info::Role;

/// A seed account, as written in the `[[users]]` tables of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserObject {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// What the store persists for a user: never the plain password.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub salt: Vec<u8>,
    pub password_hash: Vec<u8>,
}
