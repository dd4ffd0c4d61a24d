//! Product catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{Price, Product, ProductId};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::notice::{self, Notice};
use crate::state::AppState;

/// Maximum description length on product cards.
const EXCERPT_CHARS: usize = 60;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub price: String,
    pub old_price: Option<String>,
    pub stock_quantity: u32,
    pub in_stock: bool,
    pub trending: bool,
    pub colors: Vec<ColorView>,
}

/// Color option display data.
#[derive(Clone)]
pub struct ColorView {
    pub name: String,
    pub image_url: String,
}

impl ProductCardView {
    fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            excerpt: excerpt(&product.description, EXCERPT_CHARS),
            description: product.description.clone(),
            category: product.category.clone(),
            image_url: state.image_url(product.cover_image.as_deref()),
            price: Price::new(product.new_price).display(),
            // Struck-through prices are shown rounded to whole units
            old_price: product
                .old_price
                .map(|old| format!("{}{}", Price::SYMBOL, old.round().normalize())),
            stock_quantity: product.stock_quantity,
            in_stock: product.in_stock(),
            trending: product.trending,
            colors: product
                .colors
                .iter()
                .map(|c| ColorView {
                    name: c.name.clone(),
                    image_url: state.image_url(c.image.as_deref().or(product.cover_image.as_deref())),
                })
                .collect(),
        }
    }
}

/// Cut `text` to `max_chars` characters, appending "..." when shortened.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", text.get(..end).unwrap_or(text)),
        None => text.to_string(),
    }
}

/// Product listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Category name; `all` or empty means every category.
    pub category: Option<String>,
    /// Only trending products when `true`.
    pub trending: Option<bool>,
}

impl ProductFilter {
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    fn matches(&self, product: &Product) -> bool {
        self.category().is_none_or(|c| product.in_category(c))
            && (self.trending != Some(true) || product.trending)
    }
}

/// Category filter option for templates.
#[derive(Clone)]
pub struct CategoryOption {
    pub name: String,
    pub href: String,
    pub selected: bool,
}

/// Distinct categories in display order (case-insensitive, first spelling wins).
fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in products {
        let category = product.category.trim();
        if !category.is_empty() && !seen.iter().any(|s| s.eq_ignore_ascii_case(category)) {
            seen.push(category.to_string());
        }
    }
    seen.sort_by_key(|c| c.to_lowercase());
    seen
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryOption>,
    pub all_selected: bool,
    pub trending_only: bool,
    pub notices: Vec<Notice>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductCardView,
    pub notices: Vec<Notice>,
}

/// Display product listing page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<ProductFilter>,
) -> Result<ProductsIndexTemplate> {
    let products = state.catalog().list_products().await?;

    let cards = products
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| ProductCardView::new(p, &state))
        .collect();

    Ok(ProductsIndexTemplate {
        products: cards,
        categories: categories(&products)
            .into_iter()
            .map(|name| CategoryOption {
                selected: filter.category().is_some_and(|c| c.eq_ignore_ascii_case(&name)),
                href: format!("/products?category={}", urlencoding::encode(&name)),
                name,
            })
            .collect(),
        all_selected: filter.category().is_none(),
        trending_only: filter.trending == Some(true),
        notices: notice::take_all(&session).await,
    })
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let id = ProductId::parse(&id)?;
    let product = state.catalog().get_product(&id).await?;

    Ok(ProductShowTemplate {
        product: ProductCardView::new(&product, &state),
        notices: notice::take_all(&session).await,
    })
}
