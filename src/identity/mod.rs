//! Session and authorization layer over the record store.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod navigation;
mod provider;
mod session;

pub use authorizer::{has_role, is_admin, is_partner, require_auth, Role};
pub use navigation::{routes, NavigationSink, NoNavigation};
pub use provider::{AuthProvider, LocalAuthProvider, LoginOutcome, LoginRequest};
pub use session::{
    decode_token, encode_token, SessionManager, TokenClaims, UserSnapshot, TOKEN_KEY, USER_KEY,
};
