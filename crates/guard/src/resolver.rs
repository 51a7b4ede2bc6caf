//! Principal resolution.

use std::collections::HashMap;
use std::future::Future;

use policy::Principal;

/// Looks up the principal behind a verified identity.
///
/// Implemented by the user store. `None` means the identity does not resolve
/// and the request is rejected; the guard never retries.
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, id: &str) -> impl Future<Output = Option<Principal>> + Send;
}

/// In-memory principal directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    principals: HashMap<String, Principal>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, principal: Principal) {
        self.principals.insert(principal.id.clone(), principal);
    }

    pub fn with(mut self, principal: Principal) -> Self {
        self.insert(principal);
        self
    }

    pub fn remove(&mut self, id: &str) -> Option<Principal> {
        self.principals.remove(id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Principal> {
        self.principals.values().find(|p| p.email == email)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl PrincipalResolver for Directory {
    async fn resolve(&self, id: &str) -> Option<Principal> {
        self.principals.get(id).cloned()
    }
}
