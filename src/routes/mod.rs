/// Router Module Index
///
/// Splits the route table by access requirement so the authentication layer is applied
/// once, at the router level, rather than remembered per handler.

/// Routes reachable without a token: health, signup and signin.
pub mod public;

/// Routes wrapped in `auth_middleware`. Every handler here receives a verified `AuthUser`.
pub mod authenticated;
