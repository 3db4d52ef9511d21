//! Route classification for the auth gate.
//!
//! Paths are matched by prefix against two static ordered lists; the guest
//! list is consulted first and the first match wins. The two lists must be
//! disjoint by construction; this is a caller contract, not runtime-checked.

/// Redirect destination for every gate failure.
pub const LOGIN_PATH: &str = "/auth/login";

/// Classification of a request path. Recomputed per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/signup pages; must render even for garbage credentials.
    Guest,
    /// Requires a resolved identity.
    Protected,
    /// Everything else; passive decoding only, no enforcement.
    Other,
}

/// Static route lists consulted by the gate.
#[derive(Debug, Clone)]
pub struct RouteTable {
    guest: &'static [&'static str],
    protected: &'static [&'static str],
}

const GUEST_ROUTES: &[&str] = &["/auth/login", "/auth/signup"];
const PROTECTED_ROUTES: &[&str] = &["/dashboard", "/profile", "/settings", "/account"];

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            guest: GUEST_ROUTES,
            protected: PROTECTED_ROUTES,
        }
    }
}

impl RouteTable {
    pub fn new(guest: &'static [&'static str], protected: &'static [&'static str]) -> Self {
        Self { guest, protected }
    }

    /// Classify a request path. Pure function of the path.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.guest.iter().any(|route| path.starts_with(route)) {
            RouteClass::Guest
        } else if self.protected.iter().any(|route| path.starts_with(route)) {
            RouteClass::Protected
        } else {
            RouteClass::Other
        }
    }
}
