//! Authorization gate.
//!
//! Every protected command entry point passes through [`authorize`]
//! before any capability action runs. The check is stateless logic
//! over session state, re-evaluated on every inbound message; nothing
//! is cached beyond the session's `authenticated` flag.

use crate::session::{ChatId, Session};

/// Outcome of the gate. Callers must branch on it; there is no
/// decorator-style wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(DeniedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedReason {
    /// Caller is not the configured principal.
    NotPrincipal,
    /// Caller is the principal but has not logged in.
    NotAuthenticated,
}

/// Gate a call: denied when the caller is not the principal, or when
/// the session has not authenticated. Denial mutates nothing.
pub fn authorize(principal: ChatId, caller: ChatId, session: &Session) -> Access {
    if caller != principal {
        return Access::Denied(DeniedReason::NotPrincipal);
    }
    if !session.authenticated {
        return Access::Denied(DeniedReason::NotAuthenticated);
    }
    Access::Allowed
}

/// Principal check alone, for the few commands (`/start`, `/help`,
/// `/login`) that run before authentication.
pub fn is_principal(principal: ChatId, caller: ChatId) -> bool {
    caller == principal
}
