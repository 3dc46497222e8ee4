use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that must work before the client holds a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for load balancers and supervisors.
        .route("/health", get(|| async { "ok" }))
        // POST /signup
        // Creates an account. The body is validated, then the password is hashed before storage.
        .route("/signup", post(handlers::signup))
        // POST /signin
        // Checks credentials and issues a token (and the `jwt` cookie in cookie mode).
        .route("/signin", post(handlers::signin))
}
