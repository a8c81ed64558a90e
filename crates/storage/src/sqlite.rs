use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use estate_core::{Buyer, NewBuyer, NewSeller, NewUser, Seller, User};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::{
    BuyerRepository, SellerRepository, StoreError, StoreResult, UniqueField, UserRepository,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives only as long as its one connection.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              username TEXT UNIQUE NOT NULL,
              email TEXT UNIQUE NOT NULL,
              password TEXT NOT NULL,
              full_name TEXT NOT NULL,
              phone TEXT NOT NULL,
              location TEXT NOT NULL,
              role TEXT NOT NULL DEFAULT 'user',
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS buyers (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              budget TEXT NOT NULL,
              location TEXT NOT NULL,
              property_type TEXT NOT NULL,
              contact TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sellers (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              property_type TEXT NOT NULL,
              location TEXT NOT NULL,
              price TEXT NOT NULL,
              contact TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Fixed-width nanosecond timestamps keep lexical order equal to time order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// SQLite's `CURRENT_TIMESTAMP` text (UTC, no offset) is accepted for
// rows written by earlier deployments against the same file.
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
        .map(|at| at.and_utc())
        .map_err(|err| StoreError::Corrupt(format!("created_at {:?}: {}", raw, err)))
}

fn decode_timestamp(row: &SqliteRow) -> StoreResult<DateTime<Utc>> {
    let raw: String = row.try_get("created_at")?;
    parse_timestamp(&raw)
}

fn buyer_from_row(row: &SqliteRow) -> StoreResult<Buyer> {
    Ok(Buyer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        budget: row.try_get("budget")?,
        location: row.try_get("location")?,
        property_type: row.try_get("property_type")?,
        contact: row.try_get("contact")?,
        created_at: decode_timestamp(row)?,
    })
}

fn seller_from_row(row: &SqliteRow) -> StoreResult<Seller> {
    Ok(Seller {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        property_type: row.try_get("property_type")?,
        location: row.try_get("location")?,
        price: row.try_get("price")?,
        contact: row.try_get("contact")?,
        created_at: decode_timestamp(row)?,
    })
}

fn user_from_row(row: &SqliteRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        location: row.try_get("location")?,
        role: row.try_get("role")?,
        created_at: decode_timestamp(row)?,
    })
}

/// SQLite reports `UNIQUE constraint failed: users.<column>`. Only reached
/// when a concurrent insert slips past the existence checks.
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.username") {
                return StoreError::Duplicate {
                    field: UniqueField::Username,
                };
            }
            if message.contains("users.email") {
                return StoreError::Duplicate {
                    field: UniqueField::Email,
                };
            }
        }
    }
    StoreError::Database(err)
}

impl BuyerRepository for SqliteStore {
    async fn create_buyer(&self, buyer: NewBuyer) -> StoreResult<Buyer> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO buyers (name, budget, location, property_type, contact, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&buyer.name)
        .bind(&buyer.budget)
        .bind(&buyer.location)
        .bind(&buyer.property_type)
        .bind(&buyer.contact)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Buyer {
            id: result.last_insert_rowid(),
            name: buyer.name,
            budget: buyer.budget,
            location: buyer.location,
            property_type: buyer.property_type,
            contact: buyer.contact,
            created_at,
        })
    }

    async fn list_buyers(&self) -> StoreResult<Vec<Buyer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, budget, location, property_type, contact, created_at
            FROM buyers
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(buyer_from_row).collect()
    }

    async fn count_buyers(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buyers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

impl SellerRepository for SqliteStore {
    async fn create_seller(&self, seller: NewSeller) -> StoreResult<Seller> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sellers (name, property_type, location, price, contact, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&seller.name)
        .bind(&seller.property_type)
        .bind(&seller.location)
        .bind(&seller.price)
        .bind(&seller.contact)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Seller {
            id: result.last_insert_rowid(),
            name: seller.name,
            property_type: seller.property_type,
            location: seller.location,
            price: seller.price,
            contact: seller.contact,
            created_at,
        })
    }

    async fn list_sellers(&self) -> StoreResult<Vec<Seller>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, property_type, location, price, contact, created_at
            FROM sellers
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(seller_from_row).collect()
    }

    async fn count_sellers(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sellers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

impl SqliteStore {
    async fn user_field_taken(&self, field: UniqueField, value: &str) -> StoreResult<bool> {
        let sql = match field {
            UniqueField::Username => "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            UniqueField::Email => "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        };
        let taken: i64 = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken != 0)
    }
}

impl UserRepository for SqliteStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        // Username is checked first, matching the in-memory store.
        for (field, value) in [
            (UniqueField::Username, &user.username),
            (UniqueField::Email, &user.email),
        ] {
            if self.user_field_taken(field, value).await? {
                return Err(StoreError::Duplicate { field });
            }
        }

        let created_at = Utc::now();
        let role = user.role_or_default().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password, full_name, phone, location, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.location)
        .bind(&role)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            email: user.email,
            password: user.password,
            full_name: user.full_name,
            phone: user.phone,
            location: user.location,
            role,
            created_at,
        })
    }
}
