use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::{TimeDelta, Utc};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::database::Store;
use crate::error::{AuthError, StoreError};
use crate::model::{
    login_object::{LoginObject, Session},
    new_user_object::{NewUserObject, UserRecord},
    user_info::{UserId, UserInfo},
};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 16;
const HASH_LEN: usize = 32;

// Argon2id costs. Tests run unoptimized, so they use the smallest legal ones.
#[cfg(not(test))]
const MEMORY_COST_KIB: u32 = 19 * 1024;
#[cfg(not(test))]
const TIME_COST: u32 = 2;
#[cfg(test)]
const MEMORY_COST_KIB: u32 = 8;
#[cfg(test)]
const TIME_COST: u32 = 1;

fn create_hash(salt: &[u8], password: &str) -> Result<Vec<u8>, AuthError> {
    let params =
        Params::new(MEMORY_COST_KIB, TIME_COST, 1, Some(HASH_LEN)).map_err(AuthError::Hashing)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut hash = vec![0u8; HASH_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(AuthError::Hashing)?;
    Ok(hash)
}

fn hashes_match(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Digest under which a session token is stored. The token itself never is.
pub fn session_hash(token: &str) -> Option<Vec<u8>> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    let session_id = BASE64_STANDARD.decode(token).ok()?;
    Some(Sha512::digest(session_id).to_vec())
}

pub async fn register_user(
    store: &dyn Store,
    new_user: &NewUserObject,
) -> Result<Option<UserId>, AuthError> {
    let mut salt = [0u8; SALT_LEN];
    rand::fill(&mut salt);

    let record = UserRecord {
        name: new_user.name.clone(),
        email: new_user.email.trim().to_lowercase(),
        role: new_user.role,
        salt: salt.to_vec(),
        password_hash: create_hash(&salt, &new_user.password)?,
    };

    Ok(store.create_user(&record).await?)
}

/// Checks the credentials and opens a session lasting `ttl`.
///
/// Returns `None` for an unknown email or a wrong password, without telling which.
pub async fn login_user(
    store: &dyn Store,
    login: &LoginObject,
    ttl: TimeDelta,
) -> Result<Option<Session>, AuthError> {
    let email = login.email.trim().to_lowercase();
    let Some(credentials) = store.find_credentials(&email).await? else {
        return Ok(None);
    };

    let hash = create_hash(&credentials.salt, &login.password)?;
    if !hashes_match(&hash, &credentials.password_hash) {
        return Ok(None);
    }

    let mut session_id = [0u8; TOKEN_LEN];
    rand::fill(&mut session_id);
    let session_hash = Sha512::digest(session_id).to_vec();

    store
        .create_session(&session_hash, credentials.user.id, Utc::now() + ttl)
        .await?;

    tracing::info!("Logged in user {}", credentials.user.id);

    Ok(Some(Session {
        token: BASE64_STANDARD.encode(session_id),
        user: credentials.user,
    }))
}

pub async fn get_user_from_session(
    store: &dyn Store,
    token: &str,
) -> Result<Option<UserInfo>, StoreError> {
    let Some(hash) = session_hash(token) else {
        return Ok(None);
    };
    store.session_user(&hash).await
}

pub async fn logout_user(store: &dyn Store, token: &str) -> Result<(), StoreError> {
    if let Some(hash) = session_hash(token) {
        store.delete_session(&hash).await?;
    }
    Ok(())
}
