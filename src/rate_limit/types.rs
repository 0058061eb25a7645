use std::time::Duration;

/// Outcome of an admission check. A queued request surfaces as `Admitted`
/// once its delay has elapsed; callers only ever see these two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    Rejected { retry_after: Duration },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted)
    }

    /// Retry hint in whole seconds, rounded up so clients never retry early.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Decision::Admitted => None,
            Decision::Rejected { retry_after } => Some(retry_after.as_secs().max(1)),
        }
    }
}

/// Which route-specific policy applies on top of the global window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/refresh/logout: token-bucket protected.
    Auth,
    /// Authenticated general API: sliding-window protected.
    Api,
    /// Health probes and documentation: admitted unconditionally.
    Exempt,
}
