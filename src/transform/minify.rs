//! Asset minification for scripts and stylesheets.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. A configured external
//! minifier replaces oxc for scripts.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use crate::config::ScriptsConfig;
use crate::debug;
use crate::utils::exec::Cmd;

/// Minify JavaScript source code.
///
/// Parsed as a classic script so top-level names stay global.
pub fn minify_js(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(first) = ret.errors.first() {
        return Err(anyhow!(
            "script parse failed ({} error(s)): {}",
            ret.errors.len(),
            first
        ));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| anyhow!("stylesheet parse failed: {e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("stylesheet print failed: {e}"))?;
    Ok(result.code)
}

fn script_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)(<script[^>]*>)(.*?)(</script>)").expect("static regex"))
}

/// Script minifier: oxc in-process, or an external stdin → stdout command.
#[derive(Debug, Clone, Default)]
pub struct ScriptMinifier {
    external: Option<Vec<String>>,
}

impl ScriptMinifier {
    pub fn new(config: &ScriptsConfig) -> Self {
        Self {
            external: config.minifier.clone().filter(|cmd| !cmd.is_empty()),
        }
    }

    /// Minify one script.
    pub fn minify(&self, source: &str) -> Result<String> {
        match &self.external {
            Some(cmd) => Cmd::from_slice(cmd).stdin(source).stdout_text(),
            None => minify_js(source),
        }
    }

    /// Minify the bodies of `<script>` blocks in a snippet, keeping the tags.
    ///
    /// Blocks that fail to minify (typically because they interpolate liquid)
    /// are kept verbatim.
    pub fn minify_inline(&self, text: &str) -> String {
        script_tag_regex()
            .replace_all(text, |caps: &regex::Captures| {
                let body = &caps[2];
                let minified = if body.trim().is_empty() {
                    body.to_string()
                } else {
                    match self.minify(body) {
                        Ok(code) => code.trim_end().to_string(),
                        Err(e) => {
                            debug!("script"; "inline block kept as-is: {:#}", e);
                            body.to_string()
                        }
                    }
                };
                format!("{}{}{}", &caps[1], minified, &caps[3])
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js_shrinks() {
        let source = "function greet(name) {\n  // say hi\n  return 'hi ' + name;\n}\nwindow.greet = greet;\n";
        let out = minify_js(source).unwrap();
        assert!(out.len() < source.len());
        assert!(!out.contains("say hi"));
        assert!(out.contains("window.greet"));
    }

    #[test]
    fn test_minify_js_reports_parse_errors() {
        let err = minify_js("function (").unwrap_err();
        assert!(err.to_string().contains("parse failed"));
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css(".a {\n  color: #ff0000;\n}\n").unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn test_minify_inline_keeps_tags() {
        let minifier = ScriptMinifier::default();
        let text = "<div>{{ x }}</div>\n<script type=\"text/javascript\">\n  var count = 1 + 2;\n  window.count = count;\n</script>\n";
        let out = minifier.minify_inline(text);

        assert!(out.starts_with("<div>{{ x }}</div>\n<script type=\"text/javascript\">"));
        assert!(out.trim_end().ends_with("</script>"));
        assert!(out.contains("window.count"));
        assert!(!out.contains("\n  var count"));
    }

    #[test]
    fn test_minify_inline_keeps_liquid_blocks() {
        let minifier = ScriptMinifier::default();
        let text = "<script>var id = {{ product.id }};</script>";
        assert_eq!(minifier.minify_inline(text), text);
    }

    #[cfg(unix)]
    #[test]
    fn test_external_minifier() {
        let minifier = ScriptMinifier {
            external: Some(vec!["tr".into(), "-d".into(), " ".into()]),
        };
        assert_eq!(minifier.minify("var a = 1;").unwrap(), "vara=1;");
    }
}
