//! Navigation gate over `(path, session)`.
//!
//! The guard is a pure function of the path and the session as it is right
//! now. It never refreshes; callers that need a usable token run the refresh
//! coordinator before making API calls.

use crate::policy::{SessionFlags, SessionPolicy};
use crate::types::Session;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME: &str = "/admin";
pub const HOME: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    RequiresAuth,
    RequiresAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send to `/login?callbackUrl=<original path>`
    RedirectToLogin { callback_url: String },
    /// Send to the role-appropriate home (`/admin` or `/`)
    RedirectHome(&'static str),
}

impl GuardDecision {
    /// Redirect target, if any.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin { callback_url } => Some(format!(
                "{}?callbackUrl={}",
                LOGIN_PATH,
                urlencoding::encode(callback_url)
            )),
            GuardDecision::RedirectHome(home) => Some(home.to_string()),
        }
    }
}

/// Path prefixes that decide a route's class. Everything unlisted requires auth.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub public: Vec<String>,
    pub admin: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: vec![LOGIN_PATH.to_string()],
            admin: vec![ADMIN_HOME.to_string()],
        }
    }
}

impl RouteTable {
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = strip_query(path);
        if self.public.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::Public
        } else if self.admin.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::RequiresAdmin
        } else {
            RouteClass::RequiresAuth
        }
    }
}

pub struct RouteGuard {
    table: RouteTable,
    policy: SessionPolicy,
}

impl RouteGuard {
    pub fn new(table: RouteTable, policy: SessionPolicy) -> Self {
        Self { table, policy }
    }

    /// `path` may carry a query string; it is kept in the callback URL.
    pub fn check(&self, path: &str, session: Option<&Session>) -> GuardDecision {
        let SessionFlags {
            is_authenticated,
            is_admin,
        } = self.policy.derive_flags(session);

        match self.table.classify(path) {
            RouteClass::Public if is_authenticated => {
                GuardDecision::RedirectHome(if is_admin { ADMIN_HOME } else { HOME })
            }
            RouteClass::Public => GuardDecision::Allow,
            RouteClass::RequiresAuth | RouteClass::RequiresAdmin if !is_authenticated => {
                GuardDecision::RedirectToLogin {
                    callback_url: path.to_string(),
                }
            }
            RouteClass::RequiresAdmin if !is_admin => GuardDecision::RedirectHome(HOME),
            RouteClass::RequiresAuth | RouteClass::RequiresAdmin => GuardDecision::Allow,
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Prefix match on path-segment boundaries: `/admin` matches `/admin/x` but not `/administrator`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == HOME {
        return path == HOME;
    }
    match path.strip_prefix(prefix.trim_end_matches('/')) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
