//! Config key paths used to address diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted key of a config field, e.g. `store.theme_id`.
///
/// Sections declare theirs as associated constants so a diagnostic always
/// names a key that exists:
///
/// ```ignore
/// impl StoreConfig {
///     pub const HOST: FieldPath = FieldPath::new("store.host");
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Table the key lives in (`store` for `store.host`).
    pub fn section(self) -> &'static str {
        self.0.split_once('.').map_or(self.0, |(section, _)| section)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section() {
        assert_eq!(FieldPath::new("store.host").section(), "store");
        assert_eq!(FieldPath::new("root").section(), "root");
    }
}
