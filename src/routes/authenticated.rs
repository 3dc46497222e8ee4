use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Authenticated Router Module
///
/// Every route below sits behind the `auth_middleware` route layer applied in
/// `create_router`, so a missing or invalid token is answered with 401 before any
/// handler or store call runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /signout
        // Clears the token cookie.
        .route("/signout", post(handlers::signout))
        // --- Users ---
        .route("/users", get(handlers::get_users))
        // GET/PATCH /users/me
        // The caller's own profile; PATCH updates name and/or about.
        .route(
            "/users/me",
            get(handlers::get_me).patch(handlers::update_profile),
        )
        .route("/users/me/avatar", patch(handlers::update_avatar))
        // GET /users/{userId}
        // Static `/users/me` wins over this capture in axum's router.
        .route("/users/{userId}", get(handlers::get_user))
        // --- Cards ---
        .route(
            "/cards",
            get(handlers::get_cards).post(handlers::create_card),
        )
        // DELETE /cards/{cardId}
        // Owner-only; the ownership check lives in the handler.
        .route("/cards/{cardId}", axum::routing::delete(handlers::delete_card))
        // PUT/DELETE /cards/{cardId}/likes
        // Idempotent like / unlike.
        .route(
            "/cards/{cardId}/likes",
            put(handlers::like_card).delete(handlers::dislike_card),
        )
}
