//! Staff product management: listing, creation with image uploads, and
//! deletion.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{Color, NewProduct, PRODUCT_CATEGORIES, Price, Product, ProductId, known_category};
use axum::{
    extract::{Multipart, Path, State, multipart::Field},
    response::Redirect,
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ImageUpload;
use crate::error::{AppError, Result};
use crate::notice::{self, Notice, NoticeKind};
use crate::state::AppState;

/// Color rows offered on the new product form.
const COLOR_ROWS: usize = 3;

/// Product row display data.
#[derive(Clone)]
pub struct ProductRowView {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub image_url: String,
    pub category: String,
    /// Color names sorted alphabetically; empty when there are none.
    pub colors: Vec<String>,
    pub price: String,
    pub stock_quantity: u32,
    pub in_stock: bool,
}

impl ProductRowView {
    fn new(product: &Product, state: &AppState) -> Self {
        let mut colors: Vec<String> = product.colors.iter().map(|c| c.name.clone()).collect();
        colors.sort_by_key(|c| c.to_lowercase());

        Self {
            id: product.id.to_string(),
            short_id: product.id.as_str().chars().take(8).collect(),
            title: product.title.clone(),
            image_url: state.image_url(product.cover_image.as_deref()),
            category: product.category.clone(),
            colors,
            price: Price::new(product.new_price).display(),
            stock_quantity: product.stock_quantity,
            in_stock: product.in_stock(),
        }
    }
}

// =============================================================================
// Listing and deletion
// =============================================================================

/// Staff product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub products: Vec<ProductRowView>,
    pub notices: Vec<Notice>,
}

/// Display every product with its management actions.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<AdminProductsTemplate> {
    let products = state.catalog().list_products().await?;

    Ok(AdminProductsTemplate {
        products: products
            .iter()
            .map(|p| ProductRowView::new(p, &state))
            .collect(),
        notices: notice::take_all(&session).await,
    })
}

/// Delete a product, then return to the list.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = ProductId::parse(&id)?;
    state.catalog().delete_product(&id).await?;
    tracing::info!(product_id = %id, "Product deleted");

    notice::flash(
        &session,
        Notice::new(NoticeKind::Success, "The product has been deleted."),
    )
    .await?;
    Ok(Redirect::to("/admin/products"))
}

// =============================================================================
// Creation
// =============================================================================

/// New product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_new.html")]
pub struct NewProductTemplate {
    pub categories: Vec<&'static str>,
    pub color_rows: Vec<usize>,
    pub notices: Vec<Notice>,
}

/// Display the new product form.
#[instrument(skip(session))]
pub async fn new(session: Session) -> NewProductTemplate {
    NewProductTemplate {
        categories: PRODUCT_CATEGORIES.to_vec(),
        color_rows: (1..=COLOR_ROWS).collect(),
        notices: notice::take_all(&session).await,
    }
}

/// Fields of the new product form, read from a multipart body.
#[derive(Debug, Default)]
struct ProductForm {
    title: String,
    description: String,
    category: String,
    old_price: String,
    new_price: String,
    stock_quantity: String,
    trending: bool,
    cover_image: Option<ImageUpload>,
    color_names: Vec<String>,
    color_images: Vec<Option<ImageUpload>>,
}

/// Product details validated from the text fields of the form.
#[derive(Debug, PartialEq, Eq)]
struct ProductDetails {
    title: String,
    description: String,
    category: &'static str,
    old_price: Option<Decimal>,
    new_price: Decimal,
    stock_quantity: u32,
    trending: bool,
}

fn bad_request(err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(err.to_string())
}

/// Read a file field; a file input left empty reads as `None`.
async fn read_upload(field: Field<'_>) -> Result<Option<ImageUpload>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_request)?;

    if file_name.is_empty() || bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

fn parse_price(field: &str, raw: &str) -> Result<Decimal> {
    let price = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))?;
    if price.is_sign_negative() {
        return Err(AppError::BadRequest(format!("{field} cannot be negative")));
    }
    Ok(price)
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "cover_image" => form.cover_image = read_upload(field).await?,
                "color_image" => form.color_images.push(read_upload(field).await?),
                _ => {
                    let value = field.text().await.map_err(bad_request)?;
                    match name.as_str() {
                        "title" => form.title = value,
                        "description" => form.description = value,
                        "category" => form.category = value,
                        "old_price" => form.old_price = value,
                        "new_price" => form.new_price = value,
                        "stock_quantity" => form.stock_quantity = value,
                        "trending" => form.trending = true,
                        "color_name" => form.color_names.push(value),
                        _ => {}
                    }
                }
            }
        }

        Ok(form)
    }

    fn details(&self) -> Result<ProductDetails> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        let old_price = match self.old_price.trim() {
            "" => None,
            raw => Some(parse_price("Old price", raw)?),
        };
        let stock_quantity = self
            .stock_quantity
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest("Stock must be a whole number".to_string()))?;

        Ok(ProductDetails {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            category: known_category(&self.category),
            old_price,
            new_price: parse_price("New price", &self.new_price)?,
            stock_quantity,
            trending: self.trending,
        })
    }

    /// Color rows that have both a name and an image, in form order.
    fn take_colors(&mut self) -> Vec<(String, ImageUpload)> {
        let names = std::mem::take(&mut self.color_names);
        let images = std::mem::take(&mut self.color_images);
        names
            .into_iter()
            .zip(images)
            .filter_map(|(name, image)| {
                let name = name.trim().to_string();
                match image {
                    Some(image) if !name.is_empty() => Some((name, image)),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Create a product from the multipart form.
///
/// The cover image and each color image are uploaded first; the product is
/// then created with the returned paths.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect> {
    let mut form = ProductForm::read(multipart).await?;
    let details = form.details()?;
    let cover = form
        .cover_image
        .take()
        .ok_or_else(|| AppError::BadRequest("A cover image is required".to_string()))?;

    let catalog = state.catalog();
    let cover_image = catalog.upload_image(cover).await?;

    let mut colors = Vec::new();
    for (name, image) in form.take_colors() {
        let path = catalog.upload_image(image).await?;
        colors.push(Color {
            name,
            image: Some(path),
        });
    }

    let product = NewProduct {
        title: details.title,
        description: details.description,
        category: details.category.to_string(),
        cover_image,
        colors,
        old_price: details.old_price,
        new_price: details.new_price,
        stock_quantity: details.stock_quantity,
        trending: details.trending,
    };
    catalog.create_product(&product).await?;
    tracing::info!(title = %product.title, "Product created");

    notice::flash(
        &session,
        Notice::new(NoticeKind::Success, "Product added successfully."),
    )
    .await?;
    Ok(Redirect::to("/admin/products"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: name.to_string(),
            content_type: None,
            bytes: vec![1, 2, 3],
        })
    }

    fn form() -> ProductForm {
        ProductForm {
            title: " Kaftan ".to_string(),
            description: "Linen".to_string(),
            category: "women".to_string(),
            old_price: String::new(),
            new_price: "19.99".to_string(),
            stock_quantity: "4".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_details_normalizes_fields() {
        let details = form().details();
        assert_eq!(
            details.ok(),
            Some(ProductDetails {
                title: "Kaftan".to_string(),
                description: "Linen".to_string(),
                category: "Women",
                old_price: None,
                new_price: Decimal::new(1999, 2),
                stock_quantity: 4,
                trending: false,
            })
        );
    }

    #[test]
    fn test_details_rejects_bad_input() {
        let mut missing_title = form();
        missing_title.title = "  ".to_string();
        assert!(matches!(missing_title.details(), Err(AppError::BadRequest(_))));

        let mut bad_price = form();
        bad_price.new_price = "cheap".to_string();
        assert!(matches!(bad_price.details(), Err(AppError::BadRequest(_))));

        let mut negative = form();
        negative.old_price = "-5".to_string();
        assert!(matches!(negative.details(), Err(AppError::BadRequest(_))));

        let mut bad_stock = form();
        bad_stock.stock_quantity = "2.5".to_string();
        assert!(matches!(bad_stock.details(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_take_colors_requires_name_and_image() {
        let mut form = form();
        form.color_names = vec!["Indigo".into(), String::new(), "Saffron".into()];
        form.color_images = vec![upload("indigo.jpg"), upload("blank.jpg"), None];

        let colors = form.take_colors();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].0, "Indigo");
        assert_eq!(colors[0].1.file_name, "indigo.jpg");
    }
}
