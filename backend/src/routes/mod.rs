//! Route definitions for the Meridian ERP Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Product catalog
        .nest("/products", product_routes())
        // Stock locations
        .nest("/warehouses", warehouse_routes())
        // Batch costing
        .nest("/batches", batch_routes())
        // Inventory ledger and allocation
        .nest("/inventory", inventory_routes())
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
}

/// Warehouse routes
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_warehouses).post(handlers::create_warehouse))
        .route("/:warehouse_id", get(handlers::get_warehouse))
}

/// Batch costing routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::create_batch))
        .route("/:batch_id", get(handlers::get_batch))
        .route("/:batch_id/confirm", post(handlers::confirm_batch))
        .route("/:batch_id/cancel", post(handlers::cancel_batch))
        .route("/:batch_id/recalculate", post(handlers::recalculate_batch_costs))
        // Landed cost items (draft batches only)
        .route("/:batch_id/landed-costs", post(handlers::add_landed_cost_item))
        .route(
            "/:batch_id/landed-costs/:item_id",
            put(handlers::update_landed_cost_item).delete(handlers::remove_landed_cost_item),
        )
}

/// Inventory ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/receive", post(handlers::receive_inventory))
        .route("/allocate", post(handlers::allocate_inventory))
        .route("/reserve", post(handlers::reserve_inventory))
        .route("/release", post(handlers::release_reservation))
        .route("/deduct", post(handlers::deduct_inventory))
        .route("/products/:product_id/levels", get(handlers::get_inventory_levels))
        .route("/products/:product_id/summary", get(handlers::get_inventory_summary))
}
