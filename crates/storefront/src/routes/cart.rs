//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The session carries the cart id; mutating handlers hold the cart's lock
//! in the [`CartStore`](crate::carts::CartStore) while they apply one store
//! operation.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{Cart, CartItem, LineKey, Price, ProductId, Quantity};
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::carts::CartId;
use crate::error::{AppError, Result};
use crate::notice::{self, Notice};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    /// Raw color name for form fields; empty when no color was chosen.
    pub color: String,
    pub color_label: String,
    pub title: String,
    pub category: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Build the display model, resolving image paths through `state`.
    #[must_use]
    pub fn new(cart: &Cart, state: &AppState) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, state))
                .collect(),
            subtotal: Price::new(cart.total()).display(),
            item_count: cart.item_count(),
        }
    }
}

impl CartItemView {
    fn new(item: &CartItem, state: &AppState) -> Self {
        let key = item.key();
        Self {
            product_id: item.product_id.to_string(),
            color: key.color.clone().unwrap_or_default(),
            color_label: key.color_label().to_string(),
            title: item.title.clone(),
            category: item.category.clone(),
            quantity: item.quantity.get(),
            price: Price::new(item.unit_price).display(),
            line_price: Price::new(item.line_total()).display(),
            image_url: state.image_url(item.display_image()),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Copy of the session's cart for rendering; no cart yet reads as empty.
async fn current_cart(state: &AppState, session: &Session) -> Result<Cart> {
    let id = CartId::current(session).await?;
    Ok(state.carts().snapshot(id).await)
}

// =============================================================================
// Forms
// =============================================================================

/// Empty color fields mean "no color selected".
fn color_field(color: Option<String>) -> Option<String> {
    color.filter(|c| !c.trim().is_empty())
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub color: Option<String>,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub color: Option<String>,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub color: Option<String>,
}

impl RemoveFromCartForm {
    fn key(self) -> Result<LineKey> {
        Ok(LineKey::new(
            ProductId::parse(&self.product_id)?,
            color_field(self.color),
        ))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub notices: Vec<Notice>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Respond with a fragment plus the `HX-Trigger` events for `notice`.
fn fragment_with_notice(fragment: impl IntoResponse, notice: Option<&Notice>) -> Response {
    (
        AppendHeaders([("HX-Trigger", notice::hx_trigger(notice))]),
        fragment,
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = current_cart(&state, &session).await?;
    let notices = notice::take_all(&session).await;

    Ok(CartShowTemplate {
        cart: CartView::new(&cart, &state),
        notices,
    })
}

/// Add item to cart (HTMX).
///
/// Looks the product up in the catalog, refuses out-of-stock products and
/// clamps the requested quantity to the stock level. Returns the cart count
/// badge with an HTMX trigger to refresh other cart elements.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::parse(&form.product_id)?;
    let requested = Quantity::new(form.quantity.unwrap_or(1))?;

    let product = state.catalog().get_product(&product_id).await?;

    let color = match color_field(form.color) {
        Some(name) => Some(
            product
                .color(&name)
                .cloned()
                .ok_or_else(|| AppError::BadRequest(format!("Unknown color: {name}")))?,
        ),
        None => None,
    };

    let quantity = product
        .clamp_quantity(requested)
        .ok_or_else(|| AppError::BadRequest(format!("{} is out of stock", product.title)))?;

    let id = CartId::get_or_assign(&session).await?;
    let mut cart = state.carts().lock(id).await;
    let event = cart.add(CartItem::from_product(&product, color, quantity));

    tracing::info!(?event, "Cart updated");

    Ok(fragment_with_notice(
        CartCountTemplate {
            count: cart.item_count(),
        },
        Notice::for_cart_event(&event).as_ref(),
    ))
}

/// Update cart item quantity (HTMX).
///
/// Quantities below one are refused without touching the cart.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let key = LineKey::new(
        ProductId::parse(&form.product_id)?,
        color_field(form.color),
    );
    let quantity = Quantity::new(form.quantity)?;

    let id = CartId::get_or_assign(&session).await?;
    let mut cart = state.carts().lock(id).await;
    let event = cart.update_quantity(&key, quantity);

    tracing::debug!(?event, "Cart quantity updated");

    Ok(fragment_with_notice(
        CartItemsTemplate {
            cart: CartView::new(&cart, &state),
        },
        Notice::for_cart_event(&event).as_ref(),
    ))
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let key = form.key()?;

    let id = CartId::get_or_assign(&session).await?;
    let mut cart = state.carts().lock(id).await;
    let event = cart.remove(&key);

    Ok(fragment_with_notice(
        CartItemsTemplate {
            cart: CartView::new(&cart, &state),
        },
        Notice::for_cart_event(&event).as_ref(),
    ))
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Response> {
    let id = CartId::get_or_assign(&session).await?;
    let mut cart = state.carts().lock(id).await;
    let event = cart.clear();

    Ok(fragment_with_notice(
        CartItemsTemplate {
            cart: CartView::new(&cart, &state),
        },
        Notice::for_cart_event(&event).as_ref(),
    ))
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let cart = current_cart(&state, &session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_field_blank_is_none() {
        assert_eq!(color_field(None), None);
        assert_eq!(color_field(Some(String::new())), None);
        assert_eq!(color_field(Some("  ".into())), None);
        assert_eq!(color_field(Some("Red".into())), Some("Red".to_string()));
    }
}
