//! RFC 5988 `Link` header parsing.

use std::sync::OnceLock;

use regex::Regex;

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<([^>]*)>[ \t]*;[ \t]*rel="?([^",; \t]+)"?"#).expect("static regex"))
}

/// Extract the `rel="next"` target from a `Link` header value.
///
/// ```ignore
/// next_link(r#"<https://a/p.json?page_info=x>; rel="previous", <https://a/p.json?page_info=y>; rel="next""#)
///     == Some("https://a/p.json?page_info=y")
/// ```
pub fn next_link(header: &str) -> Option<String> {
    link_regex()
        .captures_iter(header)
        .find(|caps| caps[2].trim().eq_ignore_ascii_case("next"))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_only() {
        let header = r#"<https://shop.example.com/admin/products.json?limit=50&page_info=abc>; rel="next""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://shop.example.com/admin/products.json?limit=50&page_info=abc")
        );
    }

    #[test]
    fn test_previous_and_next() {
        let header = r#"<https://a/p.json?page_info=1>; rel="previous", <https://a/p.json?page_info=3>; rel="next""#;
        assert_eq!(next_link(header).as_deref(), Some("https://a/p.json?page_info=3"));
    }

    #[test]
    fn test_no_next() {
        assert_eq!(next_link(r#"<https://a/p.json?page_info=1>; rel="previous""#), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_unquoted_rel() {
        assert_eq!(next_link("<https://a/n>; rel=next").as_deref(), Some("https://a/n"));
    }
}
