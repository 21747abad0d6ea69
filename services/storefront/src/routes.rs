//! Storefront service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        AuthResponse, LoginRequest, RegisterRequest, UserResponse,
        order::{OrderSummary, PlaceOrderRequest, PlaceOrderResponse},
        product::{CheckStockRequest, CheckStockResponse, ProductListResponse, StockUpdateRequest},
    },
    state::AppState,
    validation::validate_registration,
};

/// Create the router for the storefront service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/orders/place", post(place_order))
        .route("/api/orders/my-orders", get(my_orders))
        .route("/api/orders/:order_id", get(get_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/products", get(list_products))
        .route("/api/products/check-stock", post(check_stock))
        .route("/api/products/search/:query", get(search_products))
        .route("/api/products/category/:category", get(products_by_category))
        .route("/api/products/:id", get(get_product))
        .route("/api/products/:id/stock", patch(update_stock))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "storefront"
    }))
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_registration(&payload).map_err(ApiError::Validation)?;

    // Duplicate pre-check; the unique constraints are the backstop
    let username_taken = state
        .user_repository
        .find_by_username_or_email(&payload.username)
        .await?
        .is_some();
    let email_taken = state
        .user_repository
        .find_by_username_or_email(&payload.email)
        .await?
        .is_some();

    if username_taken || email_taken {
        return Err(ApiError::Conflict(
            "Email or username already registered".to_string(),
        ));
    }

    let user = state.user_repository.create(&payload).await?;
    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        tracing::error!("Failed to generate token: {}", e);
        ApiError::Internal
    })?;

    info!("User {} registered", user.username);

    let response = AuthResponse {
        success: true,
        message: "Account created successfully!".to_string(),
        token,
        user: UserResponse::from(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log a user in with username or email
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    // One error for both unknown user and wrong password
    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username)
        .await?
        .ok_or(ApiError::InvalidCredential)?;

    if !state.user_repository.verify_password(&user, &payload.password)? {
        return Err(ApiError::InvalidCredential);
    }

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        tracing::error!("Failed to generate token: {}", e);
        ApiError::Internal
    })?;

    info!("User {} logged in", user.username);

    let response = AuthResponse {
        success: true,
        message: "Login successful!".to_string(),
        token,
        user: UserResponse::from(user),
    };

    Ok(Json(response))
}

/// Get the current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}

/// Log out
///
/// Stateless: the token stays valid until expiry and the client discards it.
pub async fn logout(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    info!("User {} logged out", auth.username);

    Json(json!({
        "success": true,
        "message": "Logged out successfully"
    }))
}

/// List all products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = state.product_repository.list_all().await?;
    Ok(Json(ProductListResponse { items }))
}

/// Get one product by id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let product = state
        .product_repository
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// List products with an exact category match
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let items = state.product_repository.list_by_category(&category).await?;
    Ok(Json(ProductListResponse { items }))
}

/// Search products by case-insensitive substring
pub async fn search_products(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let items = state.product_repository.search(&query).await?;
    Ok(Json(ProductListResponse { items }))
}

/// Decrement a product's stock directly
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StockUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.quantity < 1 {
        return Err(ApiError::Validation("Valid quantity required".to_string()));
    }

    let new_stock = state
        .product_repository
        .reserve_and_decrement(&id, payload.quantity)
        .await?;

    Ok(Json(json!({
        "message": "Stock updated successfully",
        "newStock": new_stock
    })))
}

/// Report per-item stock availability
pub async fn check_stock(
    State(state): State<AppState>,
    Json(payload): Json<CheckStockRequest>,
) -> ApiResult<impl IntoResponse> {
    let stock_status = state.product_repository.check_stock(&payload.items).await?;
    Ok(Json(CheckStockResponse { stock_status }))
}

/// Place an order for the authenticated identity
pub async fn place_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<PlaceOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.items.is_empty() {
        return Err(ApiError::EmptyCart);
    }

    if payload.items.iter().any(|item| item.quantity < 1) {
        return Err(ApiError::Validation(
            "Valid quantity required for each item".to_string(),
        ));
    }

    let order = state
        .order_repository
        .place(&auth, &payload.items, payload.customer_info.as_ref())
        .await?;

    let response = PlaceOrderResponse {
        success: true,
        message: "Order placed successfully!".to_string(),
        order_id: order.order_id.clone(),
        order: OrderSummary {
            order_id: order.order_id,
            items: order.items,
            total_amount: order.total_amount,
            created_at: order.created_at,
        },
    };

    Ok(Json(response))
}

/// List the authenticated identity's orders, newest first
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let orders = state.order_repository.list_for_user(auth.id).await?;

    Ok(Json(json!({
        "success": true,
        "orders": orders
    })))
}

/// Fetch one order by id, scoped to the authenticated identity
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(order_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .order_repository
        .find_for_user(&order_id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "order": order
    })))
}
