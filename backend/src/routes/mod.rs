//! Route definitions for the Paintrack warehouse platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth routes (login public, me protected)
        .nest("/auth", auth_routes())
        // Protected routes - article catalog and batches
        .nest("/articles", article_routes())
        .nest("/batches", batch_routes())
        // Protected routes - approval workflow
        .nest("/drafts", draft_routes())
        .nest("/draft-groups", draft_group_routes())
        // Protected routes - inventory engine
        .nest("/inventory", inventory_routes())
        .nest("/receiving", receiving_routes())
        .nest("/transactions", transaction_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(handlers::login)).merge(
        Router::new()
            .route("/me", get(handlers::me))
            .route_layer(middleware::from_fn(auth_middleware)),
    )
}

/// Article catalog routes (protected)
fn article_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/:article_no", get(handlers::get_article))
        .route("/:article_no/batches", get(handlers::list_article_batches))
        .route("/:article_id/archive", post(handlers::archive_article))
        .route("/:article_id/restore", post(handlers::restore_article))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Batch registry routes (protected)
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_batch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Single-draft approval routes (protected)
fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_drafts))
        .route("/:draft_id", get(handlers::get_draft))
        .route("/:draft_id/approve", post(handlers::approve_draft))
        .route("/:draft_id/reject", post(handlers::reject_draft))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Draft group routes (protected)
fn draft_group_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_draft_groups).post(handlers::create_draft_group),
        )
        .route(
            "/:group_id",
            get(handlers::get_draft_group).patch(handlers::rename_draft_group),
        )
        .route("/:group_id/approve", post(handlers::approve_draft_group))
        .route("/:group_id/reject", post(handlers::reject_draft_group))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory engine routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::adjust_inventory))
        .route("/count", post(handlers::perform_inventory_count))
        .route("/summary", get(handlers::get_inventory_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Receiving routes (protected)
fn receiving_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::receive_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Ledger routes (protected)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transactions))
        .route_layer(middleware::from_fn(auth_middleware))
}
