//! Terminal output: prefixed log lines, per-change status lines and the
//! `push` progress line.
//!
//! ```ignore
//! log!("upload"; "upload failed: {} ({})", key, status);
//! debug!("throttle"; "{} queued", n);   // only with --verbose
//!
//! let progress = ProgressLine::new("push", &[("scripts", 4), ("theme", 120)]);
//! progress.inc("theme");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{StdoutLock, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// A progress line owns the current terminal line; log lines must clear it first.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Serializes status lines written from concurrent upload tasks.
static STATUS_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Set by `--verbose`.
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

// ============================================================================
// Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Log lines
// ============================================================================

pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::Relaxed) {
        clear_line(&mut out);
    } else {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

/// `[module]`, colored by the subsystem it belongs to.
fn prefix(module: &str) -> String {
    let label = format!("[{module}]");
    match module {
        "serve" | "proxy" | "reload" => label.bright_blue().bold().to_string(),
        "watch" | "push" | "pull" | "export" => label.bright_green().bold().to_string(),
        "upload" | "delete" | "throttle" => label.bright_red().bold().to_string(),
        _ => label.bright_yellow().bold().to_string(),
    }
}

fn clear_line(out: &mut StdoutLock<'_>) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

// ============================================================================
// Status lines
// ============================================================================

/// Wall-clock time of day (UTC), `HH:MM:SS`.
fn clock() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

fn status_line(symbol: String, message: &str) {
    let _guard = STATUS_LOCK.lock();
    let stamp = format!("[{}]", clock()).dimmed().to_string();
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::Relaxed) {
        clear_line(&mut out);
    }
    writeln!(out, "{stamp} {symbol} {message}").ok();
    out.flush().ok();
}

/// `✓ uploaded assets/app.min.js`
pub fn status_success(message: &str) {
    status_line("✓".green().to_string(), message);
}

/// `✗ upload failed: assets/app.min.js`, with the cause on the next line.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    status_line("✗".red().to_string(), &message);
}

pub fn status_warning(detail: &str) {
    status_line("⚠".yellow().to_string(), detail);
}

// ============================================================================
// Progress line
// ============================================================================

/// In-place counters for one batch, e.g. `[push] scripts(3/4) theme(42/120)`.
///
/// Redraws are skipped while another task is drawing, so `inc` never waits.
pub struct ProgressLine {
    label: &'static str,
    counters: Vec<(&'static str, usize, AtomicUsize)>,
    drawing: Mutex<()>,
}

impl ProgressLine {
    /// Categories with nothing to do are left out.
    pub fn new(label: &'static str, items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| (name, total, AtomicUsize::new(0)))
            .collect();

        PROGRESS_ACTIVE.store(true, Ordering::Relaxed);
        let progress = Self {
            label,
            counters,
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self, name: &str) {
        let Some((_, _, done)) = self.counters.iter().find(|(n, ..)| *n == name) else {
            return;
        };
        done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|(name, total, done)| format!("{name}({}/{total})", done.load(Ordering::Relaxed)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn draw(&self, keep: bool) {
        let mut out = stdout().lock();
        clear_line(&mut out);
        let line = format!("{} {}", prefix(self.label), self.render());
        if keep {
            writeln!(out, "{line}").ok();
        } else {
            write!(out, "{line}").ok();
        }
        out.flush().ok();
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        {
            let _guard = self.drawing.lock();
            self.draw(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        let mut out = stdout().lock();
        clear_line(&mut out);
        out.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_format() {
        let t = clock();
        assert_eq!(t.len(), 8);
        assert_eq!(t.as_bytes()[2], b':');
        assert_eq!(t.as_bytes()[5], b':');
    }

    #[test]
    fn test_progress_skips_empty_counters() {
        let progress = ProgressLine::new("push", &[("scripts", 0), ("theme", 3)]);
        assert_eq!(progress.counters.len(), 1);
        progress.inc("theme");
        progress.inc("unknown");
        assert_eq!(progress.render(), "theme(1/3)");
        progress.finish();
    }
}
