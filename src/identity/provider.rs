use tracing::debug;

use crate::error::AppResult;
use crate::security;
use crate::storage::{Record, User};

use super::session::SessionManager;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Structured login outcome. Credential failure is a value the caller can
/// render, not an error; only a medium fault surfaces as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success { user: Record<User> },
    InvalidCredentials,
}

pub trait AuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginOutcome>;
}

/// Store-backed provider: email lookup via the user collection, argon2
/// verification, token issue into session storage.
pub struct LocalAuthProvider {
    sessions: SessionManager,
}

impl LocalAuthProvider {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginOutcome> {
        let store = self.sessions.store();
        // Missing user, inactive user and password mismatch all collapse to
        // the same outcome so the response does not leak which one it was.
        let Some(user) = store.user_by_email(&req.email)? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };
        if !user.fields.is_active {
            return Ok(LoginOutcome::InvalidCredentials);
        }
        if !security::verify_password(&user.fields.password_hash, &req.password) {
            return Ok(LoginOutcome::InvalidCredentials);
        }
        self.sessions.issue(&user)?;
        debug!(target: "tradepost::identity", "auth.login user={}", user.id);
        Ok(LoginOutcome::Success { user })
    }
}
