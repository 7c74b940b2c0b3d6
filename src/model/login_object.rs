use serde::{Deserialize, Serialize};

use crate::model::user_info::UserInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginObject {
    pub email: String,
    pub password: String,
}

/// Returned on login. `token` goes back in the Authorization header of later requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}
