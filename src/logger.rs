//! Terminal output: module-prefixed log lines and the render progress line.
//!
//! ```ignore
//! log!("ssg"; "rendering {}", plural_count(n, "page"));
//! debug!("node"; "using {}", path.display());
//!
//! let progress = ProgressLine::new("pages", n);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Whether a progress line currently owns the last terminal row.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Enable `debug!` output (`--verbose`).
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("vite"; "{} modules transformed", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, only shown with `--verbose`
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print `[module] message`, above the progress line if one is showing.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::Relaxed) {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "ssg" => tag.bright_cyan().bold().to_string(),
        "vite" => tag.bright_magenta().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Progress line
// ============================================================================

/// In-place counter, shown as `[ssg] pages(3/12)`.
///
/// Safe to bump from render workers; a worker that finds the display busy
/// skips the redraw instead of waiting.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    draw: Mutex<()>,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::Relaxed);
        let progress = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            draw: Mutex::new(()),
        };
        progress.redraw(false);
        progress
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.draw.try_lock() {
            self.redraw(false);
        }
    }

    fn line(&self) -> String {
        format!(
            "{}({}/{})",
            self.label,
            self.done.load(Ordering::Relaxed),
            self.total
        )
    }

    fn redraw(&self, newline: bool) {
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(out, "{} {}", prefix("ssg"), self.line()).ok();
        } else {
            write!(out, "{} {}", prefix("ssg"), self.line()).ok();
        }
        out.flush().ok();
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        {
            let _guard = self.draw.lock();
            self.redraw(true);
        }
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    // dropped without `finish`: the run failed, wipe the partial count
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts() {
        let progress = ProgressLine::new("pages", 3);
        assert_eq!(progress.line(), "pages(0/3)");
        progress.inc();
        progress.inc();
        assert_eq!(progress.line(), "pages(2/3)");
        progress.finish();
    }

    #[test]
    fn test_prefix_contains_module() {
        assert!(prefix("ssg").contains("[ssg]"));
        assert!(prefix("Vite").contains("[Vite]"));
    }
}
