mod fixtures;
mod memory;
mod sqlite;

use estate_core::{Buyer, NewBuyer, NewSeller, NewUser, Seller, User};

pub use fixtures::{seed_fixtures, SeedReport, FIXTURE_BUYERS, FIXTURE_SELLERS};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} already taken", .field.as_str())]
    Duplicate { field: UniqueField },
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait BuyerRepository: Send + Sync {
    async fn create_buyer(&self, buyer: NewBuyer) -> StoreResult<Buyer>;
    /// Newest first.
    async fn list_buyers(&self) -> StoreResult<Vec<Buyer>>;
    async fn count_buyers(&self) -> StoreResult<u64>;
}

pub trait SellerRepository: Send + Sync {
    async fn create_seller(&self, seller: NewSeller) -> StoreResult<Seller>;
    /// Newest first.
    async fn list_sellers(&self) -> StoreResult<Vec<Seller>>;
    async fn count_sellers(&self) -> StoreResult<u64>;
}

pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username or email exists.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> StoreResult<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    /// `memory://` selects the in-memory store, anything else is a SQLite URL.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        if database_url == MEMORY_DATABASE_URL {
            Ok(Self::memory())
        } else {
            Self::sqlite(database_url).await
        }
    }

    /// [`Store::connect`] followed by fixture seeding of empty tables.
    pub async fn open(database_url: &str) -> StoreResult<(Self, SeedReport)> {
        let store = Self::connect(database_url).await?;
        let report = seed_fixtures(&store).await?;
        Ok((store, report))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl BuyerRepository for Store {
    async fn create_buyer(&self, buyer: NewBuyer) -> StoreResult<Buyer> {
        match self {
            Store::Memory(store) => store.create_buyer(buyer).await,
            Store::Sqlite(store) => store.create_buyer(buyer).await,
        }
    }

    async fn list_buyers(&self) -> StoreResult<Vec<Buyer>> {
        match self {
            Store::Memory(store) => store.list_buyers().await,
            Store::Sqlite(store) => store.list_buyers().await,
        }
    }

    async fn count_buyers(&self) -> StoreResult<u64> {
        match self {
            Store::Memory(store) => store.count_buyers().await,
            Store::Sqlite(store) => store.count_buyers().await,
        }
    }
}

impl SellerRepository for Store {
    async fn create_seller(&self, seller: NewSeller) -> StoreResult<Seller> {
        match self {
            Store::Memory(store) => store.create_seller(seller).await,
            Store::Sqlite(store) => store.create_seller(seller).await,
        }
    }

    async fn list_sellers(&self) -> StoreResult<Vec<Seller>> {
        match self {
            Store::Memory(store) => store.list_sellers().await,
            Store::Sqlite(store) => store.list_sellers().await,
        }
    }

    async fn count_sellers(&self) -> StoreResult<u64> {
        match self {
            Store::Memory(store) => store.count_sellers().await,
            Store::Sqlite(store) => store.count_sellers().await,
        }
    }
}

impl UserRepository for Store {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        match self {
            Store::Memory(store) => store.create_user(user).await,
            Store::Sqlite(store) => store.create_user(user).await,
        }
    }
}
