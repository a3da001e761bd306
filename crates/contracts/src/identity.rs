//! Authenticated caller identity supplied by the host

/// Source of the user telemetry is attributed to.
///
/// Dispatch never starts while this returns `None`.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Identity fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(user: Option<String>) -> Self {
        Self(user.filter(|u| !u.trim().is_empty()))
    }

    pub fn user(user: impl Into<String>) -> Self {
        Self::new(Some(user.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.0.clone()
    }
}
