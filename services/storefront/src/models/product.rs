//! Product models for the catalog and stock endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product entity
///
/// Product ids are externally supplied strings; products are created by an
/// out-of-scope import process and only their stock is mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub stock: i32,
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response wrapper for product listings
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub items: Vec<Product>,
}

/// Request body for a direct stock decrement
#[derive(Debug, Deserialize)]
pub struct StockUpdateRequest {
    #[serde(default)]
    pub quantity: i32,
}

/// One requested item in a stock check or an order
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRequest {
    pub id: String,
    pub quantity: i32,
}

/// Request body for a batch stock check
#[derive(Debug, Deserialize)]
pub struct CheckStockRequest {
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

/// Per-item availability report
///
/// The check never fails the whole request for an individual item; every
/// requested id gets an entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus {
    pub id: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<i32>,
    pub message: String,
}

/// Response wrapper for a batch stock check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStockResponse {
    pub stock_status: Vec<StockStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product {
            id: "P1".to_string(),
            title: "Widget".to_string(),
            price: 9.99,
            image_url: Some("https://cdn.example.com/p1.png".to_string()),
            description: None,
            category: "tools".to_string(),
            stock: 5,
            rating: Some(4.5),
            brand: None,
            details: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["imageUrl"], "https://cdn.example.com/p1.png");
        assert_eq!(json["stock"], 5);
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_stock_status_omits_absent_detail_fields() {
        let status = StockStatus {
            id: "P1".to_string(),
            available: true,
            requested_quantity: None,
            available_stock: None,
            message: "In stock".to_string(),
        };

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("requestedQuantity").is_none());
        assert!(json.get("availableStock").is_none());
    }
}
