//! Pluralization utilities.

/// Return "s" suffix for plural counts
///
/// # Examples
///
/// - `plural_s(0)` -> `"s"` (0 files)
/// - `plural_s(1)` -> `""` (1 file)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// - `plural_count(1, "asset")` -> `"1 asset"`
/// - `plural_count(5, "asset")` -> `"5 assets"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

/// Pluralize a resource name for REST collection paths.
///
/// - `pluralize("product")` -> `"products"`
/// - `pluralize("smart_collection")` -> `"smart_collections"`
/// - `pluralize("country")` -> `"countries"`
/// - `pluralize("address")` -> `"addresses"`
pub fn pluralize(noun: &str) -> String {
    let lower = noun.to_ascii_lowercase();
    if lower.ends_with('s') || lower.ends_with('x') || lower.ends_with("ch") {
        return format!("{lower}es");
    }
    if let Some(stem) = lower.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{stem}ies");
    }
    format!("{lower}s")
}
