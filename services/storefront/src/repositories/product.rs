//! Product repository: catalog reads and the stock ledger
//!
//! The catalog side is read-only. The ledger side owns the stock counter
//! and only ever moves it through a single conditional UPDATE, so stock
//! can never go negative and two concurrent reservations of the last unit
//! cannot both succeed.

use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{ApiError, ApiResult};
use crate::models::product::{ItemRequest, Product, StockStatus};

const PRODUCT_COLUMNS: &str = "id, title, price, image_url, description, category, stock, \
                               rating, brand, details, created_at, updated_at";

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all products
    pub async fn list_all(&self) -> ApiResult<Vec<Product>> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    /// Find a product by its externally supplied id
    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    /// List products with an exact category match
    pub async fn list_by_category(&self, category: &str) -> ApiResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    /// Case-insensitive substring search across title, description,
    /// category, and brand. No match is an empty list, not an error.
    pub async fn search(&self, query: &str) -> ApiResult<Vec<Product>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE title ILIKE $1
               OR description ILIKE $1
               OR category ILIKE $1
               OR brand ILIKE $1
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    /// Atomically reserve and decrement stock, returning the new value
    ///
    /// The check and the decrement are one conditional UPDATE; zero rows
    /// affected means the product is missing or short on stock, and a
    /// follow-up read tells the two apart.
    pub async fn reserve_and_decrement(&self, id: &str, quantity: i32) -> ApiResult<i32> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.get("stock")),
            None => {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await?;

                match available {
                    Some(available) => Err(ApiError::InsufficientStock { available }),
                    None => Err(ApiError::NotFound(format!("Product {} not found", id))),
                }
            }
        }
    }

    /// Report per-item availability without mutating anything
    ///
    /// Every requested id gets an entry; an unknown product or a shortfall
    /// never fails the request as a whole.
    pub async fn check_stock(&self, items: &[ItemRequest]) -> ApiResult<Vec<StockStatus>> {
        let mut stock_status = Vec::with_capacity(items.len());

        for item in items {
            let stock: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                .bind(&item.id)
                .fetch_optional(&self.pool)
                .await?;

            let status = match stock {
                None => StockStatus {
                    id: item.id.clone(),
                    available: false,
                    requested_quantity: None,
                    available_stock: None,
                    message: "Product not found".to_string(),
                },
                Some(stock) if stock < item.quantity => StockStatus {
                    id: item.id.clone(),
                    available: false,
                    requested_quantity: Some(item.quantity),
                    available_stock: Some(stock),
                    message: format!("Only {} available", stock),
                },
                Some(_) => StockStatus {
                    id: item.id.clone(),
                    available: true,
                    requested_quantity: None,
                    available_stock: None,
                    message: "In stock".to_string(),
                },
            };

            stock_status.push(status);
        }

        Ok(stock_status)
    }
}

pub(crate) fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        title: row.get("title"),
        price: row.get("price"),
        image_url: row.get("image_url"),
        description: row.get("description"),
        category: row.get("category"),
        stock: row.get("stock"),
        rating: row.get("rating"),
        brand: row.get("brand"),
        details: row.get("details"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Escape LIKE wildcards so a search for "100%" matches literally
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::repositories::testutil::{insert_product, product_stock, test_pool};

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL and DATABASE_URL"]
    async fn test_reserve_and_decrement_updates_stock() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(pool.clone());
        let id = insert_product(&pool, 9.99, 5).await;

        let new_stock = repo.reserve_and_decrement(&id, 2).await.unwrap();

        assert_eq!(new_stock, 3);
        assert_eq!(product_stock(&pool, &id).await, 3);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL and DATABASE_URL"]
    async fn test_insufficient_stock_leaves_stock_unchanged() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(pool.clone());
        let id = insert_product(&pool, 9.99, 2).await;

        let err = repo.reserve_and_decrement(&id, 3).await.unwrap_err();

        assert!(matches!(err, ApiError::InsufficientStock { available: 2 }));
        assert_eq!(product_stock(&pool, &id).await, 2);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL and DATABASE_URL"]
    async fn test_decrement_of_unknown_product_is_not_found() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(pool.clone());

        let err = repo
            .reserve_and_decrement("P-does-not-exist", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL and DATABASE_URL"]
    async fn test_check_stock_reports_per_item() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(pool.clone());
        let in_stock = insert_product(&pool, 9.99, 5).await;
        let short = insert_product(&pool, 4.50, 1).await;

        let status = repo
            .check_stock(&[
                ItemRequest {
                    id: in_stock.clone(),
                    quantity: 2,
                },
                ItemRequest {
                    id: short.clone(),
                    quantity: 3,
                },
                ItemRequest {
                    id: "P-missing".to_string(),
                    quantity: 1,
                },
            ])
            .await
            .unwrap();

        assert_eq!(status.len(), 3);
        assert!(status[0].available);
        assert!(!status[1].available);
        assert_eq!(status[1].available_stock, Some(1));
        assert!(!status[2].available);
        assert_eq!(status[2].message, "Product not found");

        // Nothing was mutated
        assert_eq!(product_stock(&pool, &in_stock).await, 5);
        assert_eq!(product_stock(&pool, &short).await, 1);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL and DATABASE_URL"]
    async fn test_search_is_case_insensitive_and_empty_on_no_match() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(pool.clone());
        let id = insert_product(&pool, 9.99, 5).await;

        let hits = repo.search("tEsT WiDgEt").await.unwrap();
        assert!(hits.iter().any(|p| p.id == id));

        let misses = repo.search("no-such-product-anywhere").await.unwrap();
        assert!(misses.is_empty());
    }
}
