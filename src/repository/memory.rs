use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Repository, StoreError};
use crate::{
    models::{Card, NewCard, NewUser, ObjectId, User, UserCredentials, UserPatch},
    validation::is_url,
};

/// InMemoryRepository
///
/// A complete `Repository` kept in process memory. Used when no `DATABASE_URL` is set
/// in local mode and as the backing store for the HTTP test suite. It mirrors the
/// constraints the SQL schema enforces so both stores fail the same way.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    cards: Vec<Card>,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_length(field: &str, value: &str) -> Result<(), StoreError> {
    let len = value.chars().count();
    if (2..=30).contains(&len) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("{field} must be 2 to 30 characters")))
    }
}

fn check_link(field: &str, value: &str) -> Result<(), StoreError> {
    if is_url(value) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("{field} is not a valid link")))
    }
}

impl Store {
    fn card_mut(&mut self, id: &ObjectId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| &card.id == id)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        check_length("name", &user.name)?;
        check_length("about", &user.about)?;
        check_link("avatar", &user.avatar)?;

        let mut store = self.inner.write().await;
        if store.users.iter().any(|stored| stored.user.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        let created = User {
            id: ObjectId::new(),
            name: user.name,
            about: user.about,
            avatar: user.avatar,
            email: user.email,
        };
        store.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let store = self.inner.read().await;
        Ok(store
            .users
            .iter()
            .find(|stored| stored.user.email == email)
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        let store = self.inner.read().await;
        Ok(store
            .users
            .iter()
            .find(|stored| &stored.user.id == id)
            .map(|stored| stored.user.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let store = self.inner.read().await;
        Ok(store.users.iter().map(|stored| stored.user.clone()).collect())
    }

    async fn update_user(
        &self,
        id: &ObjectId,
        patch: UserPatch,
    ) -> Result<Option<User>, StoreError> {
        if let Some(name) = &patch.name {
            check_length("name", name)?;
        }
        if let Some(about) = &patch.about {
            check_length("about", about)?;
        }
        if let Some(avatar) = &patch.avatar {
            check_link("avatar", avatar)?;
        }

        let mut store = self.inner.write().await;
        let Some(stored) = store.users.iter_mut().find(|stored| &stored.user.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            stored.user.name = name;
        }
        if let Some(about) = patch.about {
            stored.user.about = about;
        }
        if let Some(avatar) = patch.avatar {
            stored.user.avatar = avatar;
        }
        Ok(Some(stored.user.clone()))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.inner.read().await.cards.clone())
    }

    async fn create_card(&self, card: NewCard) -> Result<Card, StoreError> {
        check_length("name", &card.name)?;
        check_link("link", &card.link)?;

        let mut store = self.inner.write().await;
        if !store.users.iter().any(|stored| stored.user.id == card.owner) {
            return Err(StoreError::Invalid("owner does not exist".to_string()));
        }

        let created = Card {
            id: ObjectId::new(),
            name: card.name,
            link: card.link,
            owner: card.owner,
            likes: Vec::new(),
            created_at: Utc::now(),
        };
        store.cards.push(created.clone());
        Ok(created)
    }

    async fn get_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError> {
        let store = self.inner.read().await;
        Ok(store.cards.iter().find(|card| &card.id == id).cloned())
    }

    async fn delete_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError> {
        let mut store = self.inner.write().await;
        let position = store.cards.iter().position(|card| &card.id == id);
        Ok(position.map(|index| store.cards.remove(index)))
    }

    async fn add_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError> {
        let mut store = self.inner.write().await;
        Ok(store.card_mut(card_id).map(|card| {
            if !card.likes.contains(user_id) {
                card.likes.push(user_id.clone());
            }
            card.clone()
        }))
    }

    async fn remove_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError> {
        let mut store = self.inner.write().await;
        Ok(store.card_mut(card_id).map(|card| {
            card.likes.retain(|liked| liked != user_id);
            card.clone()
        }))
    }
}
