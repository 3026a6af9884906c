//! Session credentials handed to the reconciler at construction.
//!
//! The reconciler never reads ambient state; whoever owns authentication
//! implements [`Session`] and passes it in.

use std::sync::RwLock;

use vetbook_config::SessionConfig;

use crate::error::{auth_error, forbidden, VetbookError};
use crate::models::{LoginResponse, Role};

pub trait Session: Send + Sync {
    /// Bearer token, if the user is logged in.
    fn token(&self) -> Option<String>;

    /// Role string as issued by the auth service (e.g. "DOCTOR").
    fn role(&self) -> Option<String>;
}

/// A session whose credentials can be replaced after login or logout.
#[derive(Debug, Default)]
pub struct StaticSession {
    inner: RwLock<Credentials>,
}

#[derive(Debug, Default, Clone)]
struct Credentials {
    token: Option<String>,
    role: Option<String>,
}

impl StaticSession {
    pub fn new(token: Option<String>, role: Option<String>) -> Self {
        Self {
            inner: RwLock::new(Credentials {
                token: token.filter(|t| !t.trim().is_empty()),
                role,
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.token.clone(), config.role.clone())
    }

    /// Replaces the credentials with the ones issued by a login.
    pub fn apply_login(&self, login: &LoginResponse) {
        if let Ok(mut creds) = self.inner.write() {
            *creds = Credentials {
                token: Some(login.token.clone()).filter(|t| !t.trim().is_empty()),
                role: login.role.clone(),
            };
        }
    }

    pub fn logout(&self) {
        if let Ok(mut creds) = self.inner.write() {
            *creds = Credentials::default();
        }
    }
}

impl Session for StaticSession {
    fn token(&self) -> Option<String> {
        self.inner.read().ok().and_then(|c| c.token.clone())
    }

    fn role(&self) -> Option<String> {
        self.inner.read().ok().and_then(|c| c.role.clone())
    }
}

/// Token of the current session, or an authentication error.
pub fn require_token(session: &dyn Session) -> Result<String, VetbookError> {
    session
        .token()
        .ok_or_else(|| auth_error("please login to continue"))
}

/// Token and role of the current session if the role is one of `allowed`.
pub fn require_role(
    session: &dyn Session,
    allowed: &[Role],
) -> Result<(String, Role), VetbookError> {
    let token = require_token(session)?;
    let role = session
        .role()
        .ok_or_else(|| forbidden("no role attached to this session"))?
        .parse::<Role>()
        .map_err(forbidden)?;

    if allowed.contains(&role) {
        Ok((token, role))
    } else {
        Err(forbidden(format!("the {role} role cannot do this")))
    }
}
