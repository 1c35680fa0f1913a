//! Deciding whether a page may be shown.

use crate::SessionState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Who may see a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    RedirectTo(&'static str),
}

/// Should a route requiring `access` be shown for the current session?
pub fn decide(session: &SessionState, access: Access) -> Decision {
    match access {
        Access::Public => Decision::Allow,
        Access::Authenticated if session.is_authenticated() => Decision::Allow,
        Access::Authenticated => Decision::RedirectTo(LOGIN_PATH),
        Access::AdminOnly if session.is_admin() => Decision::Allow,
        Access::AdminOnly if session.is_authenticated() => {
            Decision::RedirectTo(DASHBOARD_PATH)
        },
        Access::AdminOnly => Decision::RedirectTo(LOGIN_PATH),
    }
}
