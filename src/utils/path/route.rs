//! URL processing utilities.

/// Convert a URL path to a safe filename for caching
///
/// Replaces `/` with `_` to create filesystem-safe names
/// The leading slash is preserved as `_` to distinguish root from `/index`
///
/// # Examples
/// ```ignore
/// assert_eq!(url_to_safe_filename("/"), "_");
/// assert_eq!(url_to_safe_filename("/collections/all"), "_collections_all");
/// ```
#[inline]
pub fn url_to_safe_filename(url: &str) -> String {
    url.replace(['/', '?', '&', '='], "_")
}

/// Split a request URL into path and query parts
///
/// # Examples
/// ```ignore
/// assert_eq!(split_path_query("/search?q=hat"), ("/search", "q=hat"));
/// assert_eq!(split_path_query("/about"), ("/about", ""));
/// ```
#[inline]
pub fn split_path_query(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

/// Whether a request path looks like a storefront page rather than a static file.
///
/// Pages have no extension in their last segment (`/products/hat`), static
/// files do (`/cdn/shop/t/1/assets/main.min.js`).
pub fn is_page_path(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    !last.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_safe_filename() {
        assert_eq!(url_to_safe_filename("/"), "_");
        assert_eq!(url_to_safe_filename("/index"), "_index");
        assert_eq!(url_to_safe_filename("/search?q=a"), "_search_q_a");
        // No collision between / and /index
        assert_ne!(url_to_safe_filename("/"), url_to_safe_filename("/index"));
    }

    #[test]
    fn test_split_path_query() {
        assert_eq!(split_path_query("/search?q=hat"), ("/search", "q=hat"));
        assert_eq!(split_path_query("/about"), ("/about", ""));
        assert_eq!(split_path_query("?x=1"), ("", "x=1"));
    }

    #[test]
    fn test_is_page_path() {
        assert!(is_page_path("/"));
        assert!(is_page_path("/products/hat"));
        assert!(!is_page_path("/assets/main.min.js"));
        assert!(!is_page_path("/favicon.ico"));
    }
}
