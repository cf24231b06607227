/// Insert `tag` before the last `</body>` (case-insensitive).
///
/// Pages without `</body>` get the tag appended; browsers handle that.
pub fn inject_before_body_end(html: &str, tag: &str) -> String {
    const PATTERN: &[u8] = b"</body>";

    let bytes = html.as_bytes();
    let pos = bytes
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(bytes.len());

    let mut result = String::with_capacity(html.len() + tag.len());
    result.push_str(&html[..pos]);
    result.push_str(tag);
    result.push_str(&html[pos..]);
    result
}
