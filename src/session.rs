//! Authentication predicate
//!
//! The engine only needs to know whether a user is signed in and which bearer
//! token to attach to the write. Sign-in, refresh and logout live elsewhere.

use parking_lot::RwLock;

pub trait AuthGate: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Token holder updated by the surrounding session flow
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, token: String) {
        *self.token.write() = Some(token).filter(|t| !t.is_empty());
    }

    pub fn sign_out(&self) {
        *self.token.write() = None;
    }
}

impl AuthGate for Session {
    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
