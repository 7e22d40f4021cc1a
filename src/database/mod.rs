pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use models::{GiftCard, GiftCardPatch, NewGiftCard, NewUser, User, UserPatch};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique email constraint rejected the write
    #[error("Duplicate email: {0}")]
    Duplicate(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait GiftCardRepository: Send + Sync {
    async fn list_giftcards(&self) -> Result<Vec<GiftCard>, StoreError>;

    async fn find_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError>;

    async fn create_giftcard(&self, card: NewGiftCard) -> Result<GiftCard, StoreError>;

    /// Returns `None` when no card has this id
    async fn update_giftcard(
        &self,
        id: Uuid,
        patch: GiftCardPatch,
    ) -> Result<Option<GiftCard>, StoreError>;

    /// Removes the card and returns what was removed
    async fn delete_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn page_users(&self, offset: u64, limit: u64) -> Result<Page<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

/// Everything the handlers need from a backing store
#[async_trait]
pub trait Store: GiftCardRepository + UserRepository {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store named by the configuration, creating tables when needed
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
    if config.is_memory() {
        tracing::warn!("Using in-memory store; data is lost on restart");
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        return Ok(store);
    }

    let store = PgStore::connect(config).await?;
    store.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(store);
    Ok(store)
}

/// One page of an offset/limit listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub offset: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub page: u64,
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Page<T> {
    /// `limit` must be non-zero
    pub fn new(docs: Vec<T>, total_docs: u64, offset: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total_docs.div_ceil(limit).max(1);
        let page = (offset / limit).saturating_add(1);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            offset,
            limit,
            total_pages,
            page,
            paging_counter: offset.saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page.saturating_add(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            offset: self.offset,
            limit: self.limit,
            total_pages: self.total_pages,
            page: self.page,
            paging_counter: self.paging_counter,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}
