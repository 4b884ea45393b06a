//! Sign-in admission and role flags.

use crate::types::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub is_authenticated: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    domain_suffix: String,
}

impl SessionPolicy {
    pub fn new(domain_suffix: impl Into<String>) -> Self {
        Self {
            domain_suffix: domain_suffix.into(),
        }
    }

    /// Check an OAuth profile email against the organizational suffix.
    ///
    /// The match is case-sensitive. A bare suffix with no local part is rejected.
    pub fn admit_oauth_profile(&self, email: &str) -> bool {
        !self.domain_suffix.is_empty()
            && email.len() > self.domain_suffix.len()
            && email.ends_with(&self.domain_suffix)
    }

    pub fn derive_flags(&self, session: Option<&Session>) -> SessionFlags {
        match session {
            Some(session) if session.error.is_none() => SessionFlags {
                is_authenticated: true,
                is_admin: session.user.is_admin,
            },
            _ => SessionFlags::default(),
        }
    }
}
