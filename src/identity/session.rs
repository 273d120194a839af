use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::storage::{Record, Role, Store, User};
use crate::tprintln;

use super::navigation::{routes, NavigationSink};

/// Medium keys holding session-scoped state next to the collections.
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Claims carried by the session token. The field names and the standard
/// base64-over-JSON transform are an interop contract with previously
/// issued tokens and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub id: String,
    pub timestamp: i64,
}

pub fn encode_token(claims: &TokenClaims) -> String {
    // a two-string-field struct cannot fail to serialize
    let json = serde_json::to_string(claims).unwrap_or_default();
    BASE64.encode(json.as_bytes())
}

/// Decode a token; any malformed input (bad base64, bad JSON, missing
/// fields) is `None`, never a fault.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    let bytes = BASE64.decode(token.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Denormalized user snapshot cached next to the token. Display-only state
/// for the hosting pages; authorization always re-reads the live record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub company_name: String,
    pub contact_person: String,
}

impl UserSnapshot {
    pub fn of(user: &Record<User>) -> Self {
        Self {
            id: user.id.clone(),
            email: user.fields.email.clone(),
            role: user.fields.role,
            company_name: user.fields.company_name.clone(),
            contact_person: user.fields.contact_person.clone(),
        }
    }
}

/// Session-scoped state held in the store's medium under `token`/`user`.
#[derive(Clone)]
pub struct SessionManager {
    store: Store,
}

impl SessionManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Issue a token and snapshot for a just-authenticated user.
    pub(crate) fn issue(&self, user: &Record<User>) -> AppResult<String> {
        let claims = TokenClaims { id: user.id.clone(), timestamp: Utc::now().timestamp_millis() };
        let token = encode_token(&claims);
        self.store.medium().set(TOKEN_KEY, &token)?;
        let snapshot = serde_json::to_string(&UserSnapshot::of(user))?;
        self.store.medium().set(USER_KEY, &snapshot)?;
        tprintln!("session.issue user={}", user.id);
        Ok(token)
    }

    /// Raw token from session storage, if any.
    pub fn token(&self) -> AppResult<Option<String>> {
        self.store.medium().get(TOKEN_KEY)
    }

    /// True iff a token is present; contents are not validated.
    pub fn is_authenticated(&self) -> AppResult<bool> {
        Ok(self.token()?.is_some())
    }

    /// Live user for the stored token. A malformed or stale token yields
    /// `None`. The record is re-fetched from the store rather than the
    /// snapshot, so role and activity changes take effect on the next check.
    pub fn current_user(&self) -> AppResult<Option<Record<User>>> {
        let Some(token) = self.token()? else {
            return Ok(None);
        };
        let Some(claims) = decode_token(&token) else {
            return Ok(None);
        };
        self.store.get::<User>(&claims.id)
    }

    /// Clear both session keys unconditionally and send the caller home.
    pub fn logout(&self, nav: &dyn NavigationSink) -> AppResult<()> {
        self.store.medium().remove(TOKEN_KEY)?;
        self.store.medium().remove(USER_KEY)?;
        nav.navigate(routes::INDEX);
        Ok(())
    }
}
