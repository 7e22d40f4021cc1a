use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::info;
use uuid::Uuid;

use super::models::{GiftCard, GiftCardPatch, NewGiftCard, NewUser, User, UserPatch};
use super::{GiftCardRepository, Page, Store, StoreError, UserRepository};
use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS giftcards (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        price TEXT NOT NULL,
        image TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        password TEXT NOT NULL,
        avatar TEXT,
        role TEXT NOT NULL DEFAULT 'user',
        cart JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
];

const GIFTCARD_COLUMNS: &str = "id, title, price, image";
const USER_COLUMNS: &str = "id, name, email, password, avatar, role, cart";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Connected to database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create tables and constraints if they do not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

/// Turn a unique-constraint violation into [`StoreError::Duplicate`]
fn duplicate_or(err: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(email.to_string());
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl GiftCardRepository for PgStore {
    async fn list_giftcards(&self) -> Result<Vec<GiftCard>, StoreError> {
        let sql = format!("SELECT {} FROM giftcards ORDER BY created_at, id", GIFTCARD_COLUMNS);
        Ok(sqlx::query_as::<_, GiftCard>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError> {
        let sql = format!("SELECT {} FROM giftcards WHERE id = $1", GIFTCARD_COLUMNS);
        Ok(sqlx::query_as::<_, GiftCard>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_giftcard(&self, card: NewGiftCard) -> Result<GiftCard, StoreError> {
        let sql = format!(
            "INSERT INTO giftcards (id, title, price, image) VALUES ($1, $2, $3, $4) RETURNING {}",
            GIFTCARD_COLUMNS
        );
        Ok(sqlx::query_as::<_, GiftCard>(&sql)
            .bind(Uuid::new_v4())
            .bind(&card.title)
            .bind(&card.price)
            .bind(&card.image)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_giftcard(
        &self,
        id: Uuid,
        patch: GiftCardPatch,
    ) -> Result<Option<GiftCard>, StoreError> {
        let sql = format!(
            r#"
            UPDATE giftcards SET
                title = COALESCE($2, title),
                price = COALESCE($3, price),
                image = COALESCE($4, image)
            WHERE id = $1
            RETURNING {}
            "#,
            GIFTCARD_COLUMNS
        );
        Ok(sqlx::query_as::<_, GiftCard>(&sql)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.price)
            .bind(&patch.image)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError> {
        let sql = format!("DELETE FROM giftcards WHERE id = $1 RETURNING {}", GIFTCARD_COLUMNS);
        Ok(sqlx::query_as::<_, GiftCard>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn page_users(&self, offset: u64, limit: u64) -> Result<Page<User>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at, id OFFSET $1 LIMIT $2",
            USER_COLUMNS
        );
        let docs = sqlx::query_as::<_, User>(&sql)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(docs, total as u64, offset, limit))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password, avatar, role, cart)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(user.role.as_str())
            .bind(Json(&user.cart))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, &user.email))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                avatar = COALESCE($4, avatar),
                role = COALESCE($5, role),
                cart = COALESCE($6, cart)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let email = patch.email.clone().unwrap_or_default();
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&patch.name)
            .bind(&patch.email)
            .bind(&patch.avatar)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(patch.cart.as_ref().map(Json))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, &email))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {}", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
