//! Image URL resolution.
//!
//! Products and colors store either absolute URLs (external hosting), upload
//! paths served by the catalog API, or names of static assets.

/// Placeholder shown when a product has no image.
pub const DEFAULT_IMAGE: &str = "/static/default-image.svg";

/// Resolve a stored image reference to a URL the browser can load.
///
/// - empty or missing: [`DEFAULT_IMAGE`]
/// - `http://` / `https://`: returned unchanged
/// - `/uploads/...` or `uploads/...`: served from `api_base_url`
/// - anything else: a root-relative static asset
///
/// ```
/// use atelier_core::image::resolve_image_url;
///
/// let base = "https://api.atelier.shop";
/// assert_eq!(resolve_image_url(Some("uploads/a.jpg"), base), "https://api.atelier.shop/uploads/a.jpg");
/// assert_eq!(resolve_image_url(None, base), "/static/default-image.svg");
/// ```
#[must_use]
pub fn resolve_image_url(name: Option<&str>, api_base_url: &str) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return DEFAULT_IMAGE.to_string();
    }

    if name.starts_with("http://") || name.starts_with("https://") {
        return name.to_string();
    }

    let base = api_base_url.trim_end_matches('/');
    if name.starts_with("/uploads/") {
        return format!("{base}{name}");
    }
    if name.starts_with("uploads/") {
        return format!("{base}/{name}");
    }

    format!("/{}", name.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:5000/";

    #[test]
    fn test_empty_uses_placeholder() {
        assert_eq!(resolve_image_url(None, BASE), DEFAULT_IMAGE);
        assert_eq!(resolve_image_url(Some(""), BASE), DEFAULT_IMAGE);
        assert_eq!(resolve_image_url(Some("  "), BASE), DEFAULT_IMAGE);
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let url = "https://cdn.example.com/kaftan.jpg";
        assert_eq!(resolve_image_url(Some(url), BASE), url);
        assert_eq!(
            resolve_image_url(Some("http://x/y.png"), BASE),
            "http://x/y.png"
        );
    }

    #[test]
    fn test_uploads_are_prefixed() {
        assert_eq!(
            resolve_image_url(Some("/uploads/a.jpg"), BASE),
            "http://localhost:5000/uploads/a.jpg"
        );
        assert_eq!(
            resolve_image_url(Some("uploads/a.jpg"), BASE),
            "http://localhost:5000/uploads/a.jpg"
        );
    }

    #[test]
    fn test_static_assets_are_root_relative() {
        assert_eq!(resolve_image_url(Some("kaftan.png"), BASE), "/kaftan.png");
        assert_eq!(resolve_image_url(Some("/img/k.png"), BASE), "/img/k.png");
    }
}
