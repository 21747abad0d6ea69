//! Repositories for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{RegisterRequest, User};

pub mod order;
pub mod product;

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// Emails are stored lowercase; the unique constraints on username and
    /// email back up the duplicate pre-check in the handler.
    pub async fn create(&self, payload: &RegisterRequest) -> ApiResult<User> {
        info!("Creating new user: {}", payload.username);

        // Hash the password
        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(payload.password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::Internal
            })?
            .to_string();

        let row = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password_hash, phone)
            VALUES ($1, $2, $3, lower($4), $5, $6)
            RETURNING id, first_name, last_name, username, email, password_hash, phone,
                      created_at, updated_at
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.username)
        .bind(&payload.email)
        .bind(&password_hash)
        .bind(&payload.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::user_from_row(&row))
    }

    /// Find a user by username or lowercased email
    pub async fn find_by_username_or_email(&self, username_or_email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, username, email, password_hash, phone,
                   created_at, updated_at
            FROM users
            WHERE username = $1 OR email = lower($1)
            "#,
        )
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::user_from_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, username, email, password_hash, phone,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::user_from_row))
    }

    /// Verify a user's password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Failed to parse password hash: {}", e);
            ApiError::Internal
        })?;

        let argon2 = Argon2::default();
        let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
        User {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            phone: row.get("phone"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Helpers for the repository tests that need a live PostgreSQL.
///
/// Fixtures use fresh UUID-derived product ids so runs never collide.
#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::PgPool;
    use uuid::Uuid;

    pub async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set for repository tests");
        let pool = PgPool::connect(&url).await.expect("failed to connect");

        sqlx::raw_sql(include_str!("../schema.sql"))
            .execute(&pool)
            .await
            .expect("failed to apply schema");

        pool
    }

    pub async fn insert_product(pool: &PgPool, price: f64, stock: i32) -> String {
        let id = format!("P-{}", Uuid::new_v4());

        sqlx::query(
            r#"
            INSERT INTO products (id, title, price, image_url, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&id)
        .bind("Test widget")
        .bind(price)
        .bind("https://cdn.example.com/widget.png")
        .bind("test-fixtures")
        .bind(stock)
        .execute(pool)
        .await
        .expect("failed to insert fixture product");

        id
    }

    pub async fn product_stock(pool: &PgPool, id: &str) -> i32 {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .expect("fixture product missing")
    }
}
