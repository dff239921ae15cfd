//! Registration, login, and bearer-token sessions.
//!
//! The core authorizes but never authenticates: every core operation takes
//! an already-verified viewer id. This module is the collaborator that
//! produces those ids for the HTTP surface — salted password hashes in the
//! user table, opaque random tokens in the session table.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::storage::{Storage, UserRow};

pub const ROLE_ORDINARY: &str = "ordinary";
pub const ROLE_ADMIN: &str = "admin";

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Register a new ordinary user and issue a session token.
/// Duplicate emails are a conflict.
pub fn register(
    storage: &Storage,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<(UserRow, String)> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!("invalid email '{email}'")));
    }
    if password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let salt = generate_salt();
    let row = UserRow {
        user_id: 0,
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password_hash: hash_password(password, &salt),
        password_salt: salt,
        role: ROLE_ORDINARY.to_string(),
        verified_at: None,
        created_at: now_secs(),
    };
    let user_id = storage.insert_user(&row)?;
    let user = UserRow { user_id, ..row };

    let token = generate_token();
    storage.insert_session(&token, user_id, now_secs())?;
    crate::mlog!("auth: registered {}", crate::logging::user_id(user_id));
    Ok((user, token))
}

/// Verify credentials and issue a fresh session token. Wrong email and
/// wrong password produce the same error.
pub fn login(storage: &Storage, email: &str, password: &str) -> AppResult<(UserRow, String)> {
    let denied = || AppError::Authorization("invalid email or password".to_string());

    let user = storage.get_user_by_email(email)?.ok_or_else(denied)?;
    if hash_password(password, &user.password_salt) != user.password_hash {
        return Err(denied());
    }

    let token = generate_token();
    storage.insert_session(&token, user.user_id, now_secs())?;
    crate::mlog!("auth: login {}", crate::logging::user_id(user.user_id));
    Ok((user, token))
}

/// Invalidate a session token. Logging out an already-invalid token is a
/// no-op, not an error.
pub fn logout(storage: &Storage, token: &str) -> AppResult<()> {
    if storage.delete_session(token)? {
        crate::mlog!("auth: logout");
    }
    Ok(())
}

/// Resolve a bearer token to the user it belongs to.
pub fn resolve_token(storage: &Storage, token: &str) -> AppResult<Option<UserRow>> {
    let Some(user_id) = storage.get_session_user(token)? else {
        return Ok(None);
    };
    // Sessions are deleted with their user, so this lookup should always
    // succeed; an absent user still reads as signed out.
    Ok(storage.get_user(user_id)?)
}
