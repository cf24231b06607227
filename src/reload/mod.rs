//! Live reload.
//!
//! Proxied pages load a small script that opens a WebSocket to this
//! server. After each synced change the server sends the outcome and
//! closes the connection; the script reloads the page on close.

mod message;
mod server;

pub use message::ReloadMessage;
pub use server::LiveReload;

const LIVERELOAD_JS: &str = include_str!("livereload.js");

/// Inline `<script>` tag connecting to `ws_port`.
pub fn script_tag(ws_port: u16) -> String {
    format!(
        "<script>{}</script>",
        LIVERELOAD_JS.replace("__THEMESYNC_WS_PORT__", &ws_port.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_tag_carries_port() {
        let tag = script_tag(35729);
        assert!(tag.starts_with("<script>"));
        assert!(tag.ends_with("</script>"));
        assert!(tag.contains("var port = 35729;"));
        assert!(!tag.contains("__THEMESYNC_WS_PORT__"));
    }
}
