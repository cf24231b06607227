//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! entry = "main.scss"            # Entry file inside the styles root
//! output = "main.min.css"        # Compiled asset name (key `assets/<output>`)
//! compiler = ["sass", "--style=compressed", "--no-source-map"]
//! minify = true                  # Post-minify compiler output
//! ```

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Style compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub entry: String,
    pub output: String,
    /// Compiler command; the entry path is appended as the last argument.
    pub compiler: Vec<String>,
    pub minify: bool,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: "main.scss".to_string(),
            output: "main.min.css".to_string(),
            compiler: vec![
                "sass".to_string(),
                "--style=compressed".to_string(),
                "--no-source-map".to_string(),
            ],
            minify: true,
        }
    }
}

impl StylesConfig {
    pub const ENTRY: FieldPath = FieldPath::new("styles.entry");
    pub const OUTPUT: FieldPath = FieldPath::new("styles.output");
    pub const COMPILER: FieldPath = FieldPath::new("styles.compiler");

    /// Remote key of the compiled stylesheet.
    pub fn output_key(&self) -> String {
        format!("assets/{}", self.output)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.entry.is_empty() {
            diag.error(Self::ENTRY, "entry is required");
        }
        if self.output.is_empty() || self.output.contains('/') {
            diag.error(Self::OUTPUT, "output must be a plain file name");
        } else if !self.output.contains(".min.") {
            diag.error_with_hint(
                Self::OUTPUT,
                "output must be a generated `.min.` name",
                "the compiled file is written to theme/assets, which only ignores `.min.` files",
            );
        }
        match self.compiler.first() {
            None => diag.error(Self::COMPILER, "compiler command is empty"),
            Some(program) if which::which(program).is_err() => diag.hint(
                Self::COMPILER,
                format!("`{program}` not found in PATH, style changes will fail to compile"),
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_styles_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.entry, "main.scss");
        assert_eq!(config.styles.output_key(), "assets/main.min.css");
        assert_eq!(config.styles.compiler[0], "sass");
        assert!(config.styles.minify);
    }

    #[test]
    fn test_styles_override() {
        let config = test_parse_config("[styles]\noutput = \"theme.min.css\"\ncompiler = [\"npx\", \"sass\"]");
        assert_eq!(config.styles.output_key(), "assets/theme.min.css");
        assert_eq!(config.styles.compiler, vec!["npx", "sass"]);
        assert_eq!(config.styles.entry, "main.scss");
    }

    #[test]
    fn test_output_must_be_generated_name() {
        let mut diag = ConfigDiagnostics::new();
        StylesConfig {
            output: "theme.css".into(),
            compiler: vec!["cat".into()],
            ..Default::default()
        }
        .validate(&mut diag);
        assert!(diag.has_errors());

        let mut diag = ConfigDiagnostics::new();
        StylesConfig {
            compiler: vec!["cat".into()],
            ..Default::default()
        }
        .validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
