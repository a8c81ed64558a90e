use std::sync::Arc;

use chrono::Utc;
use estate_core::{Buyer, NewBuyer, NewSeller, NewUser, Seller, User};
use parking_lot::RwLock;

use crate::{
    BuyerRepository, SellerRepository, StoreError, StoreResult, UniqueField, UserRepository,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    buyers: Arc<RwLock<Vec<Buyer>>>,
    sellers: Arc<RwLock<Vec<Seller>>>,
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Rows are appended in insertion order, so ids are 1-based positions.
fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

impl BuyerRepository for MemoryStore {
    async fn create_buyer(&self, buyer: NewBuyer) -> StoreResult<Buyer> {
        let mut buyers = self.buyers.write();
        let record = Buyer {
            id: next_id(buyers.len()),
            name: buyer.name,
            budget: buyer.budget,
            location: buyer.location,
            property_type: buyer.property_type,
            contact: buyer.contact,
            created_at: Utc::now(),
        };
        buyers.push(record.clone());
        Ok(record)
    }

    async fn list_buyers(&self) -> StoreResult<Vec<Buyer>> {
        let mut buyers = self.buyers.read().clone();
        buyers.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(buyers)
    }

    async fn count_buyers(&self) -> StoreResult<u64> {
        Ok(self.buyers.read().len() as u64)
    }
}

impl SellerRepository for MemoryStore {
    async fn create_seller(&self, seller: NewSeller) -> StoreResult<Seller> {
        let mut sellers = self.sellers.write();
        let record = Seller {
            id: next_id(sellers.len()),
            name: seller.name,
            property_type: seller.property_type,
            location: seller.location,
            price: seller.price,
            contact: seller.contact,
            created_at: Utc::now(),
        };
        sellers.push(record.clone());
        Ok(record)
    }

    async fn list_sellers(&self) -> StoreResult<Vec<Seller>> {
        let mut sellers = self.sellers.read().clone();
        sellers.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(sellers)
    }

    async fn count_sellers(&self) -> StoreResult<u64> {
        Ok(self.sellers.read().len() as u64)
    }
}

impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write();

        if users.iter().any(|existing| existing.username == user.username) {
            return Err(StoreError::Duplicate {
                field: UniqueField::Username,
            });
        }
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate {
                field: UniqueField::Email,
            });
        }

        let role = user.role_or_default().to_string();
        let record = User {
            id: next_id(users.len()),
            username: user.username,
            email: user.email,
            password: user.password,
            full_name: user.full_name,
            phone: user.phone,
            location: user.location,
            role,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }
}
