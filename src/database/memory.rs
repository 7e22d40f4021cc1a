//! In-process store with the same semantics as the Postgres store

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{GiftCard, GiftCardPatch, NewGiftCard, NewUser, User, UserPatch};
use super::{GiftCardRepository, Page, Store, StoreError, UserRepository};

/// Insertion-ordered in-memory store.
///
/// Used by tests and by `DATABASE_URL=memory`. Email uniqueness is checked
/// under the write lock, so it holds even for concurrent registrations.
#[derive(Default)]
pub struct MemoryStore {
    giftcards: RwLock<Vec<GiftCard>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GiftCardRepository for MemoryStore {
    async fn list_giftcards(&self) -> Result<Vec<GiftCard>, StoreError> {
        Ok(self.giftcards.read().await.clone())
    }

    async fn find_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError> {
        Ok(self.giftcards.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn create_giftcard(&self, card: NewGiftCard) -> Result<GiftCard, StoreError> {
        let card = GiftCard {
            id: Uuid::new_v4(),
            title: card.title,
            price: card.price,
            image: card.image,
        };
        self.giftcards.write().await.push(card.clone());
        Ok(card)
    }

    async fn update_giftcard(
        &self,
        id: Uuid,
        patch: GiftCardPatch,
    ) -> Result<Option<GiftCard>, StoreError> {
        let mut cards = self.giftcards.write().await;
        Ok(cards.iter_mut().find(|c| c.id == id).map(|card| {
            patch.apply(card);
            card.clone()
        }))
    }

    async fn delete_giftcard(&self, id: Uuid) -> Result<Option<GiftCard>, StoreError> {
        let mut cards = self.giftcards.write().await;
        Ok(cards
            .iter()
            .position(|c| c.id == id)
            .map(|index| cards.remove(index)))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn page_users(&self, offset: u64, limit: u64) -> Result<Page<User>, StoreError> {
        let users = self.users.read().await;
        let docs = users
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(docs, users.len() as u64, offset, limit))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(user.email));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            avatar: user.avatar,
            role: user.role,
            cart: user.cart,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(email) = &patch.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate(email.clone()));
            }
        }

        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            patch.apply(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|index| users.remove(index)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
