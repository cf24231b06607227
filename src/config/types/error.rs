//! Config errors and collected validation problems.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),

    // Not #[from]: `source()` would render the problems a second time.
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

#[derive(Debug, Clone)]
struct Problem {
    field: FieldPath,
    message: String,
    hint: Option<String>,
}

/// Every validation problem found in one pass, reported together at start-up.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    problems: Vec<Problem>,
    /// Keys serde skipped while parsing.
    unknown: Vec<String>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.problems.push(Problem {
            field,
            message: message.into(),
            hint: None,
        });
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.problems.push(Problem {
            field,
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// Advice that does not fail validation; printed right away.
    pub fn hint(&mut self, field: FieldPath, message: impl Into<String>) {
        crate::log!("hint"; "[{}] {}", field.as_str(), message.into());
    }

    pub fn unknown_fields(&mut self, fields: impl IntoIterator<Item = String>) {
        self.unknown.extend(fields);
    }

    /// Warn about skipped keys, once per file.
    pub fn print_warnings(&self, file_name: &str) {
        if self.unknown.is_empty() {
            return;
        }
        crate::log!("warning"; "ignoring unknown fields in {}: {}", file_name, self.unknown.join(", "));
    }

    pub fn has_errors(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "invalid configuration".red().bold())?;
        let mut section = "";
        for problem in &self.problems {
            if problem.field.section() != section {
                section = problem.field.section();
                write!(f, "\n\n{}", format!("[{section}]").dimmed())?;
            }
            write!(f, "\n  {}: {}", problem.field, problem.message)?;
            if let Some(hint) = &problem.hint {
                write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
            }
        }
        if self.problems.len() > 1 {
            write!(f, "\n\n{} problems", self.problems.len().to_string().red().bold())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
