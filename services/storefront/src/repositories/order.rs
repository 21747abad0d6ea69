//! Order repository: placement and scoped reads
//!
//! Placement runs entirely inside one transaction: every line item is
//! reserved with a conditional decrement and the order row is inserted
//! before commit. Any failure rolls the whole thing back, so no stock is
//! lost without an order to show for it.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::order::{
    CustomerInfo, Order, OrderItem, OrderStatus, PaymentInfo, card_last4, generate_order_id,
    order_total,
};
use crate::models::product::ItemRequest;

/// Order repository
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for the authenticated identity
    ///
    /// Each item is reserved with a single conditional UPDATE that also
    /// returns the title/price/image snapshot, so the total is computed
    /// from the same read that decremented stock, never from client input.
    pub async fn place(
        &self,
        identity: &AuthUser,
        items: &[ItemRequest],
        customer_info: Option<&CustomerInfo>,
    ) -> ApiResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut lines: Vec<OrderItem> = Vec::with_capacity(items.len());

        for item in items {
            let row = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, updated_at = now()
                WHERE id = $1 AND stock >= $2
                RETURNING title, price, image_url
                "#,
            )
            .bind(&item.id)
            .bind(item.quantity)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(row) = row else {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(&item.id)
                        .fetch_optional(&mut *tx)
                        .await?;

                tx.rollback().await?;

                return Err(match available {
                    Some(available) => ApiError::InsufficientStock { available },
                    None => ApiError::NotFound(format!("Product {} not found", item.id)),
                });
            };

            lines.push(OrderItem {
                product_id: item.id.clone(),
                title: row.get("title"),
                price: row.get("price"),
                quantity: item.quantity,
                image_url: row.get("image_url"),
            });
        }

        let total_amount = order_total(&lines);
        let order_id = generate_order_id();
        let shipping_address = customer_info
            .map(CustomerInfo::shipping_address)
            .unwrap_or_default();
        let last4 = customer_info
            .and_then(|info| info.card_number.as_deref())
            .map(card_last4);

        let items_json = serde_json::to_value(&lines).map_err(|e| {
            tracing::error!("Failed to serialize order items: {}", e);
            ApiError::Internal
        })?;
        let shipping_json = serde_json::to_value(&shipping_address).map_err(|e| {
            tracing::error!("Failed to serialize shipping address: {}", e);
            ApiError::Internal
        })?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, user_email, user_name, items,
                                total_amount, status, shipping_address, payment_last4)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING created_at
            "#,
        )
        .bind(&order_id)
        .bind(identity.id)
        .bind(&identity.email)
        .bind(&identity.username)
        .bind(&items_json)
        .bind(total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(&shipping_json)
        .bind(&last4)
        .fetch_one(&mut *tx)
        .await?;

        let created_at: DateTime<Utc> = row.get("created_at");

        tx.commit().await?;

        info!("Order {} placed for user {}", order_id, identity.id);

        Ok(Order {
            order_id,
            user_id: identity.id,
            user_email: identity.email.clone(),
            user_name: identity.username.clone(),
            items: lines,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address,
            payment_info: PaymentInfo { last4 },
            created_at,
        })
    }

    /// List the identity's orders, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> ApiResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, user_id, user_email, user_name, items, total_amount,
                   status, shipping_address, payment_last4, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    /// Fetch one order by id, scoped to the identity
    ///
    /// An order owned by someone else comes back as `None`, exactly like
    /// an order that does not exist.
    pub async fn find_for_user(&self, order_id: &str, user_id: Uuid) -> ApiResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, user_id, user_email, user_name, items, total_amount,
                   status, shipping_address, payment_last4, created_at
            FROM orders
            WHERE order_id = $1 AND user_id = $2
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }
}

fn order_from_row(row: &PgRow) -> ApiResult<Order> {
    let items: Vec<OrderItem> = serde_json::from_value(row.get("items")).map_err(|e| {
        tracing::error!("Failed to deserialize order items: {}", e);
        ApiError::Internal
    })?;

    let shipping_address = serde_json::from_value(row.get("shipping_address")).map_err(|e| {
        tracing::error!("Failed to deserialize shipping address: {}", e);
        ApiError::Internal
    })?;

    let status: OrderStatus = row
        .get::<String, _>("status")
        .parse()
        .map_err(|e: String| {
            tracing::error!("Corrupt order status: {}", e);
            ApiError::Internal
        })?;

    Ok(Order {
        order_id: row.get("order_id"),
        user_id: row.get("user_id"),
        user_email: row.get("user_email"),
        user_name: row.get("user_name"),
        items,
        total_amount: row.get("total_amount"),
        status,
        shipping_address,
        payment_info: PaymentInfo {
            last4: row.get("payment_last4"),
        },
        created_at: row.get("created_at"),
    })
}
