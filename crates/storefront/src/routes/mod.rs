//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the product listing
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?category=&trending=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Orders
//! GET  /account/orders         - Orders placed with an email (?email=)
//! GET  /admin/orders           - Staff progress editor
//! POST /admin/orders/{id}/progress - Save one line's progress
//!
//! # Products (staff)
//! GET  /admin/products         - Product list with delete actions
//! GET  /admin/products/new     - New product form
//! POST /admin/products         - Create a product (multipart, uploads images)
//! POST /admin/products/{id}/delete - Delete a product
//! ```

pub mod admin_products;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted new product form, images included.
const PRODUCT_FORM_LIMIT: usize = 10 * 1024 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the staff routes router.
///
/// Expected to be exposed only behind the operator's access proxy.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::admin_index))
        .route("/orders/{id}/progress", post(orders::update_progress))
        .route(
            "/products",
            get(admin_products::index)
                .post(admin_products::create)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT)),
        )
        .route("/products/new", get(admin_products::new))
        .route("/products/{id}/delete", post(admin_products::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/account/orders", get(orders::index))
        .nest("/admin", admin_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the API.
async fn health() -> &'static str {
    "ok"
}
