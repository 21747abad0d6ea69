//! Order models and the pure pieces of order assembly
//!
//! Line items are snapshots captured at order time; they never reference
//! live product state. Totals are always computed server-side from those
//! snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::product::ItemRequest;

/// Order lifecycle status
///
/// Orders are always created `Pending`. No transition graph is enforced on
/// stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// One line item captured at order time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub price: f64,
    pub quantity: i32,
    pub image_url: Option<String>,
}

/// Shipping address snapshot, copied verbatim from customer info
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Payment snapshot; only the last 4 digits are ever persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub last4: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_info: PaymentInfo,
    pub created_at: DateTime<Utc>,
}

/// Checkout details supplied by the client
///
/// The full card number is accepted transiently and truncated to its last
/// 4 characters before anything is persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub card_number: Option<String>,
}

impl CustomerInfo {
    /// Build the shipping snapshot, absent fields becoming empty strings
    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: self.name.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            zip: self.zip.clone().unwrap_or_default(),
        }
    }
}

/// Request body for order placement
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    pub customer_info: Option<CustomerInfo>,
}

/// The slice of the persisted order echoed back to the caller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Response for order placement
///
/// The caller should treat this copy of the persisted order as the source
/// of truth over anything held client-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub message: String,
    pub order_id: String,
    pub order: OrderSummary,
}

/// Sum of unit price times quantity across the captured line items
pub fn order_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price * item.quantity as f64)
        .sum()
}

/// Truncate a card number to its last 4 characters
pub fn card_last4(card_number: &str) -> String {
    let chars: Vec<char> = card_number.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars[start..].iter().collect()
}

/// Generate an order id from the current millisecond timestamp
///
/// Sub-millisecond concurrent creation can collide; the primary key
/// constraint on the orders table rejects the loser.
pub fn generate_order_id() -> String {
    format!("ORD-{}", Utc::now().timestamp_millis())
}
