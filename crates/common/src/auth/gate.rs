//! Role-based navigation gate
//!
//! Pure functions of the session's role; no I/O.

use super::Session;
use crate::errors::{AppError, Result};
use crate::models::Role;
use serde::Serialize;

/// A navigable destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    pub name: &'static str,
    pub path: &'static str,
}

const fn route(name: &'static str, path: &'static str) -> RouteDescriptor {
    RouteDescriptor { name, path }
}

pub const DASHBOARD: RouteDescriptor = route("Dashboard", "/");
pub const COMPANIES: RouteDescriptor = route("Companies", "/admin/companies");

/// Visible to every role, in display order
pub const COMMON_ROUTES: [RouteDescriptor; 7] = [
    DASHBOARD,
    route("Attendance", "/attendance"),
    route("Goals", "/goals"),
    route("Growth", "/growth"),
    route("Profile", "/profile"),
    route("Login", "/login"),
    route("Signup Company", "/signup-company"),
];

/// Appended after the common set for admins
pub const ADMIN_ROUTES: [RouteDescriptor; 2] = [route("Users", "/admin/users"), COMPANIES];

/// Routes visible to `role`; total over every input including `None`
pub fn visible_routes(role: Option<Role>) -> Vec<RouteDescriptor> {
    let mut routes = COMMON_ROUTES.to_vec();
    if role == Some(Role::Admin) {
        routes.extend_from_slice(&ADMIN_ROUTES);
    }
    routes
}

pub fn can_access(role: Option<Role>, path: &str) -> bool {
    visible_routes(role).iter().any(|r| r.path == path)
}

/// Where to go right after signing in
pub fn landing_route(role: Option<Role>) -> RouteDescriptor {
    match role {
        Some(Role::Admin) => COMPANIES,
        _ => DASHBOARD,
    }
}

pub fn require_admin(session: &Session) -> Result<()> {
    match session.role() {
        Some(Role::Admin) => Ok(()),
        Some(_) => Err(AppError::Forbidden {
            message: "Admin role required".to_string(),
        }),
        None => Err(AppError::NotAuthenticated),
    }
}
