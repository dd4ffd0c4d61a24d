//! Order route handlers: the customer order dashboard and the staff
//! progress editor.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::progress::{self, ProgressKey, ProgressStep};
use atelier_core::{Email, Order, OrderId, Price};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::notice::{self, Notice, NoticeKind};
use crate::state::AppState;

/// One selectable milestone for an order line.
#[derive(Clone)]
pub struct StepOption {
    pub percent: u8,
    pub checked: bool,
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderLineView {
    /// Progress key of the line (`product|color`).
    pub key: String,
    pub product_id: String,
    pub title: String,
    pub color: String,
    pub progress: u8,
    pub steps: Vec<StepOption>,
}

/// Order display data.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub short_ref: String,
    pub name: String,
    pub total: String,
    pub placed_on: Option<String>,
    pub lines: Vec<OrderLineView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_ref: order.short_ref().to_string(),
            name: order.name.clone(),
            total: Price::new(order.total_price).display(),
            placed_on: order
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string()),
            lines: order
                .products
                .iter()
                .map(|line| {
                    let key = line.progress_key();
                    let current = order.progress_of(&key);
                    OrderLineView {
                        key: key.to_string(),
                        product_id: line.product.id.to_string(),
                        title: line.product.title.clone(),
                        color: line.color.name.clone(),
                        progress: current.percent(),
                        steps: ProgressStep::STEPS
                            .into_iter()
                            .map(|step| StepOption {
                                percent: step.percent(),
                                checked: step == current,
                            })
                            .collect(),
                    }
                })
                .collect(),
        }
    }
}

// =============================================================================
// Customer dashboard
// =============================================================================

/// Order lookup query.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub email: Option<String>,
}

/// Customer order dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub email: String,
    pub orders: Vec<OrderView>,
    pub searched: bool,
    pub notices: Vec<Notice>,
}

/// List the orders placed with an email address.
#[instrument(skip(state, session, query))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersTemplate> {
    let notices = notice::take_all(&session).await;

    let Some(raw) = query.email.filter(|e| !e.trim().is_empty()) else {
        return Ok(OrdersTemplate {
            email: String::new(),
            orders: Vec::new(),
            searched: false,
            notices,
        });
    };

    let email = Email::parse(&raw)?;
    let orders = state.catalog().orders_for_email(&email).await?;

    Ok(OrdersTemplate {
        email: email.to_string(),
        orders: orders.iter().map(OrderView::from).collect(),
        searched: true,
        notices,
    })
}

// =============================================================================
// Staff progress editor
// =============================================================================

/// Staff order progress template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct AdminOrdersTemplate {
    pub orders: Vec<OrderView>,
    pub notices: Vec<Notice>,
}

/// Display every order with per-line progress controls.
#[instrument(skip(state, session))]
pub async fn admin_index(
    State(state): State<AppState>,
    session: Session,
) -> Result<AdminOrdersTemplate> {
    let orders = state.catalog().list_orders().await?;

    Ok(AdminOrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
        notices: notice::take_all(&session).await,
    })
}

/// Progress update form data.
#[derive(Debug, Deserialize)]
pub struct ProgressForm {
    /// Progress key of the order line (`product|color`).
    pub line: String,
    pub progress: u8,
}

/// Save one order line's progress and notify the customer at milestones.
///
/// The progress is stored first; a failed notification is reported but does
/// not undo the saved progress.
#[instrument(skip(state, session))]
pub async fn update_progress(
    State(state): State<AppState>,
    session: Session,
    Path(order_id): Path<String>,
    Form(form): Form<ProgressForm>,
) -> Result<Redirect> {
    let order_id = OrderId::parse(&order_id)?;
    let key = ProgressKey::parse(&form.line)?;
    let step = ProgressStep::try_from(form.progress)?;

    let order = state.catalog().get_order(&order_id).await?;
    if !order.products.iter().any(|line| line.progress_key() == key) {
        return Err(AppError::NotFound(format!("order line {key}")));
    }
    let update = progress::plan_update(&order, &key, step);

    state
        .catalog()
        .update_order_progress(&order_id, &update.product_progress)
        .await?;
    tracing::info!(%order_id, %key, %step, "Order progress saved");
    notice::flash(
        &session,
        Notice::new(NoticeKind::Success, "Order progress saved."),
    )
    .await?;

    if let Some(notification) = update.notification {
        let result = state
            .catalog()
            .send_progress_notification(&order_id, &notification)
            .await;
        let flashed = match result {
            Ok(()) => Notice::new(
                NoticeKind::Info,
                format!(
                    "A notification was sent to {} for {step} progress.",
                    order.name
                ),
            ),
            Err(e) => {
                tracing::error!(%order_id, "Failed to send progress notification: {e}");
                Notice::new(
                    NoticeKind::Error,
                    "Progress saved, but the customer notification failed.",
                )
            }
        };
        notice::flash(&session, flashed).await?;
    }

    Ok(Redirect::to("/admin/orders"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_view() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "65a0b1c2d3e4f5",
            "name": "Amina",
            "products": [
                { "productId": { "_id": "p1", "title": "Kaftan" }, "color": { "colorName": "Red" } }
            ],
            "totalPrice": "240.5",
            "productProgress": { "p1|Red": 80 },
            "createdAt": "2025-03-01T10:00:00Z"
        }))
        .unwrap();

        let view = OrderView::from(&order);
        assert_eq!(view.short_ref, "65a0b1c2");
        assert_eq!(view.total, "$240.50");
        assert_eq!(view.placed_on.as_deref(), Some("2025-03-01"));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].progress, 80);
        assert_eq!(view.lines[0].color, "Red");
        assert_eq!(view.lines[0].key, "p1|Red");
        let checked: Vec<u8> = view.lines[0]
            .steps
            .iter()
            .filter(|s| s.checked)
            .map(|s| s.percent)
            .collect();
        assert_eq!(checked, vec![80]);
    }
}
