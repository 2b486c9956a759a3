//! User accounts: credential hashing, the SQLite account store, and the
//! register/authenticate flows built on them.
//!
//! Credentials are hashed with PBKDF2-HMAC-SHA256 and a fresh random salt
//! per record. The encoded form carries its own parameters:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt hex>$<digest hex>
//! ```

use anyhow::Result;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::config::Config;
use crate::db;
use crate::models::UserRecord;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Hashes and verifies user secrets.
pub trait CredentialHasher: Send + Sync {
    /// Produce an opaque, self-describing hash of `secret`.
    fn hash(&self, secret: &str) -> String;
    /// Check `secret` against a value produced by [`hash`](Self::hash).
    /// Malformed input verifies as `false`.
    fn verify(&self, secret: &str, opaque: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2Hasher {
    iterations: u32,
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl Pbkdf2Hasher {
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }
}

impl CredentialHasher for Pbkdf2Hasher {
    fn hash(&self, secret: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = pbkdf2_sha256(secret.as_bytes(), &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(digest)
        )
    }

    fn verify(&self, secret: &str, opaque: &str) -> bool {
        let parts: Vec<&str> = opaque.split('$').collect();
        let [scheme, iterations, salt, digest] = parts.as_slice() else {
            return false;
        };
        if *scheme != SCHEME {
            return false;
        }
        let (Ok(iterations), Ok(salt), Ok(expected)) = (
            iterations.parse::<u32>(),
            hex::decode(salt),
            hex::decode(digest),
        ) else {
            return false;
        };
        if iterations == 0 {
            return false;
        }
        let actual = pbkdf2_sha256(secret.as_bytes(), &salt, iterations);
        constant_time_eq(&actual, &expected)
    }
}

/// PBKDF2 with HMAC-SHA256, one 32-byte output block.
fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let keyed = HmacSha256::new_from_slice(password).expect("HMAC can take key of any size");

    let mut mac = keyed.clone();
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u: [u8; 32] = mac.finalize().into_bytes().into();
    let mut out = u;

    for _ in 1..iterations {
        let mut mac = keyed.clone();
        mac.update(&u);
        u = mac.finalize().into_bytes().into();
        for (o, b) in out.iter_mut().zip(u.iter()) {
            *o ^= b;
        }
    }
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("user already exists: {0}")]
    AlreadyExists(String),
    #[error("no user found for {0}")]
    NotFound(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("credential hashing task failed: {0}")]
    Hashing(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Account lookups and inserts against the `users` table.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_identifier(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, email, password_hash, name FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            name: row.get("name"),
        }))
    }

    /// Insert a user and return the new row id.
    pub async fn create(&self, email: &str, credential_hash: &str, name: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(credential_hash)
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

/// Canonical form of a login identifier.
pub fn normalize_identifier(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hashing and verification run on the blocking pool.
pub async fn register<H: CredentialHasher + Clone + 'static>(
    store: &AccountStore,
    hasher: &H,
    email: &str,
    password: &str,
    name: &str,
) -> Result<UserRecord, AccountError> {
    let email = normalize_identifier(email);
    let name = name.trim();
    if email.is_empty() || name.is_empty() || password.is_empty() {
        return Err(AccountError::InvalidInput(
            "name, email and password are all required".to_string(),
        ));
    }

    if store.find_by_identifier(&email).await?.is_some() {
        return Err(AccountError::AlreadyExists(email));
    }

    let hasher = hasher.clone();
    let secret = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&secret)).await?;
    let id = store.create(&email, &password_hash, name).await?;
    tracing::info!(user_id = id, "account created");

    Ok(UserRecord {
        id,
        email,
        password_hash,
        name: name.to_string(),
    })
}

pub async fn authenticate<H: CredentialHasher + Clone + 'static>(
    store: &AccountStore,
    hasher: &H,
    email: &str,
    password: &str,
) -> Result<UserRecord, AccountError> {
    let email = normalize_identifier(email);
    let user = store
        .find_by_identifier(&email)
        .await?
        .ok_or_else(|| AccountError::NotFound(email.clone()))?;

    let hasher = hasher.clone();
    let secret = password.to_string();
    let stored = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored)).await?;
    if !ok {
        tracing::warn!(user_id = user.id, "failed login attempt");
        return Err(AccountError::InvalidCredentials);
    }
    Ok(user)
}

pub fn hasher_for(config: &Config) -> Pbkdf2Hasher {
    Pbkdf2Hasher::with_iterations(config.auth.pbkdf2_iterations)
}

pub async fn run_register(config: &Config, email: &str, name: &str, password: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = AccountStore::new(pool.clone());
    let user = register(&store, &hasher_for(config), email, password, name).await?;
    println!("Account created for {} ({})", user.name, user.email);
    pool.close().await;
    Ok(())
}
