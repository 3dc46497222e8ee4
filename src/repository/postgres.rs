use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Repository, StoreError};
use crate::models::{Card, NewCard, NewUser, ObjectId, User, UserCredentials, UserPatch};

const USER_COLUMNS: &str = "id, name, about, avatar, email";

// Aggregates likes in the order they arrived; a card with no likes yields an empty array.
const CARD_SELECT: &str = r#"
    SELECT c.id, c.name, c.link, c.owner, c.created_at,
           COALESCE(
               array_agg(l.user_id ORDER BY l.liked_at, l.user_id)
                   FILTER (WHERE l.user_id IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS likes
    FROM cards c
    LEFT JOIN card_likes l ON l.card_id = c.id
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are checked at runtime so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }

    async fn fetch_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError> {
        let query = format!("{CARD_SELECT} WHERE c.id = $1 GROUP BY c.id");
        sqlx::query_as::<_, CardRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Card::try_from)
            .transpose()
    }
}

// --- Row types ---

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    about: String,
    avatar: String,
    email: String,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: String,
    name: String,
    link: String,
    owner: String,
    created_at: DateTime<Utc>,
    likes: Vec<String>,
}

fn stored_id(raw: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse(raw).map_err(|_| StoreError::Backend(format!("corrupt identifier in store: {raw:?}")))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: stored_id(&row.id)?,
            name: row.name,
            about: row.about,
            avatar: row.avatar,
            email: row.email,
        })
    }
}

impl TryFrom<CardRow> for Card {
    type Error = StoreError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        Ok(Card {
            id: stored_id(&row.id)?,
            name: row.name,
            link: row.link,
            owner: stored_id(&row.owner)?,
            likes: row
                .likes
                .iter()
                .map(|id| stored_id(id))
                .collect::<Result<_, _>>()?,
            created_at: row.created_at,
        })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Duplicate;
            }
            // 22001: value too long, 22P02: invalid text representation.
            let cast_failure = matches!(db.code().as_deref(), Some("22001") | Some("22P02"));
            if db.is_check_violation() || db.is_foreign_key_violation() || cast_failure {
                return StoreError::Invalid(db.message().to_string());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, name, about, avatar, email, password) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(ObjectId::new().as_str())
            .bind(&user.name)
            .bind(&user.about)
            .bind(&user.avatar)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        User::try_from(row)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS}, password FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, CredentialsRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(UserCredentials {
                user: User::try_from(row.user)?,
                password_hash: row.password,
            })
        })
        .transpose()
    }

    async fn get_user(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Partial update via COALESCE: unset fields keep their stored value.
    async fn update_user(
        &self,
        id: &ObjectId,
        patch: UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                about = COALESCE($3, about), \
                avatar = COALESCE($4, avatar) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id.as_str())
            .bind(patch.name)
            .bind(patch.about)
            .bind(patch.avatar)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        let query = format!("{CARD_SELECT} GROUP BY c.id ORDER BY c.created_at, c.id");
        sqlx::query_as::<_, CardRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Card::try_from)
            .collect()
    }

    async fn create_card(&self, card: NewCard) -> Result<Card, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(
            "INSERT INTO cards (id, name, link, owner) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, link, owner, created_at, ARRAY[]::TEXT[] AS likes",
        )
        .bind(ObjectId::new().as_str())
        .bind(&card.name)
        .bind(&card.link)
        .bind(card.owner.as_str())
        .fetch_one(&self.pool)
        .await?;
        Card::try_from(row)
    }

    async fn get_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError> {
        self.fetch_card(id).await
    }

    async fn delete_card(&self, id: &ObjectId) -> Result<Option<Card>, StoreError> {
        let Some(card) = self.fetch_card(id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(card))
    }

    /// ON CONFLICT DO NOTHING on the composite key makes repeated likes a no-op.
    async fn add_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError> {
        sqlx::query(
            "INSERT INTO card_likes (card_id, user_id) \
             SELECT $1, $2 WHERE EXISTS (SELECT 1 FROM cards WHERE id = $1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(card_id.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        self.fetch_card(card_id).await
    }

    async fn remove_like(
        &self,
        card_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Card>, StoreError> {
        sqlx::query("DELETE FROM card_likes WHERE card_id = $1 AND user_id = $2")
            .bind(card_id.as_str())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;

        self.fetch_card(card_id).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
