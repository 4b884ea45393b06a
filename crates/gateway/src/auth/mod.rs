//! Authentication surface of the gateway.
//!
//! This module provides:
//! - Credential and Google OAuth sign-in
//! - Session artifact cookies
//! - The page route guard middleware
//! - Session lookup for handlers

mod cookies;
mod handlers;
mod middleware;

pub use handlers::{google_callback, google_login, session, signin_credentials, signout};
pub use middleware::{resolve_session, route_guard, session_cookie};
