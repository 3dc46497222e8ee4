use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Card, NewCard, NewUser, ObjectId, User, UserCredentials, UserPatch};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// StoreError
///
/// What a store can report back. Handlers never inspect driver errors directly; they
/// classify one of these through `AppError::from_store`. "Not found" is not an error
/// here: lookups return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint (the user email) was violated.
    #[error("duplicate key")]
    Duplicate,
    /// The store refused the data itself (constraint or cast failure).
    #[error("invalid data: {0}")]
    Invalid(String),
    /// Connectivity or any other unexpected failure.
    #[error("store failure: {0}")]
    Backend(String),
}

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers talk to an
/// `Arc<dyn Repository>` and never know whether Postgres or the in-memory store sits
/// behind it.
///
/// **Send + Sync + async_trait** are required so the trait object can be shared across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Inserts a user; `Duplicate` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    /// The only read that returns the password hash. Used by signin.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;
    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    /// Applies the `Some` fields of `patch`. `None` if the user does not exist.
    async fn update_user(&self, id: &ObjectId, patch: UserPatch)
    -> Result<Option<User>, StoreError>;

    // --- Cards ---
    async fn list_cards(&self) -> Result<Vec<Card>, StoreError>;
    async fn create_card(&self, card: NewCard) -> Result<Card, StoreError>;
    async fn get_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError>;
    /// Removes the card and returns what was deleted. Ownership is checked by the caller.
    async fn delete_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError>;
    /// Idempotent: liking twice leaves a single entry.
    async fn add_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError>;
    async fn remove_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError>;

    /// Releases pooled resources at shutdown.
    async fn close(&self) {}
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
