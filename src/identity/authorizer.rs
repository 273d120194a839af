pub use crate::storage::Role;

use crate::error::AppResult;

use super::navigation::{routes, NavigationSink};
use super::session::SessionManager;

/// True iff the current user's role matches. A missing or malformed session
/// resolves to false.
pub fn has_role(sessions: &SessionManager, role: Role) -> AppResult<bool> {
    Ok(sessions.current_user()?.map(|u| u.fields.role == role).unwrap_or(false))
}

pub fn is_admin(sessions: &SessionManager) -> AppResult<bool> {
    has_role(sessions, Role::Admin)
}

pub fn is_partner(sessions: &SessionManager) -> AppResult<bool> {
    has_role(sessions, Role::Partner)
}

/// Composite page gate. Authentication is evaluated before role; a
/// malformed token counts as "not authenticated" and never faults. On a
/// role mismatch the caller is redirected to the other role's dashboard,
/// mirroring the page flow of the consuming UI.
pub fn require_auth(
    sessions: &SessionManager,
    required: Option<Role>,
    nav: &dyn NavigationSink,
) -> AppResult<bool> {
    if !sessions.is_authenticated()? {
        nav.navigate(routes::LOGIN);
        return Ok(false);
    }
    match required {
        None => Ok(true),
        Some(role) => {
            if has_role(sessions, role)? {
                return Ok(true);
            }
            let target = match role {
                Role::Admin => routes::PARTNER_DASHBOARD,
                Role::Partner => routes::ADMIN_DASHBOARD,
            };
            nav.navigate(target);
            Ok(false)
        }
    }
}
