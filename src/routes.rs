//! The application's pages and who may visit them.

use crate::{
    guard::{self, Access, Decision},
    SessionState,
};

/// Where unknown paths are sent.
pub const FALLBACK_PATH: &str = "/";

/// A path pattern such as `/event/:eventId`, where `:`-prefixed segments
/// match any single non-empty segment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: &'static str,
    pub access: Access,
}

impl Route {
    pub const fn new(pattern: &'static str, access: Access) -> Self {
        Route { pattern, access }
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut expected = segments(self.pattern);
        let mut actual = segments(path);

        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return true,
                (Some(e), Some(a)) if e.starts_with(':') || e == a => {},
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
    path.split('/').filter(|segment| !segment.is_empty())
}

const DEFAULT_ROUTES: &[Route] = &[
    Route::new("/", Access::Public),
    Route::new("/login", Access::Public),
    Route::new("/register", Access::Public),
    Route::new("/reset-password", Access::Public),
    Route::new("/event/:eventId", Access::Public),
    Route::new("/events/:eventId/register", Access::Authenticated),
    Route::new("/dashboard", Access::Authenticated),
    Route::new("/financial", Access::AdminOnly),
    Route::new("/admin", Access::AdminOnly),
];

/// The set of known routes, checked in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self { RouteTable { routes } }

    pub fn routes(&self) -> &[Route] { &self.routes }

    /// Find the first route matching `path`.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// What happens when the session tries to visit `path`?
    pub fn navigate(&self, session: &SessionState, path: &str) -> Decision {
        match self.resolve(path) {
            Some(route) => guard::decide(session, route.access),
            None => {
                log::debug!("No route matches {}", path);
                Decision::RedirectTo(FALLBACK_PATH)
            },
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self { RouteTable::new(DEFAULT_ROUTES.to_vec()) }
}
