//! Presentation hooks.
//!
//! The connection manager never touches a UI directly. It drives a
//! [`Presenter`] with three capabilities:
//!
//! - show or hide one of two indicators ([`Indicator::Open`], [`Indicator::Closed`])
//! - append one rendered line to an append-only log
//! - clear the input control after a submit
//!
//! # Implementations
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MemoryPresenter`] | Keeps indicator state and log in memory |
//! | [`TracingPresenter`] | Emits lines through `tracing` |
//! | [`WriterPresenter`] | Writes lines to any `io::Write` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

// ============================================================================
// Indicator
// ============================================================================

/// A binary visible/hidden connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Shown while the connection is open.
    Open,
    /// Shown while the connection is closed.
    Closed,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Whether an indicator is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Indicator is visible.
    Shown,
    /// Indicator is hidden.
    Hidden,
}

impl Visibility {
    /// Returns `true` if shown.
    #[inline]
    #[must_use]
    pub const fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

// ============================================================================
// Presenter
// ============================================================================

/// Presentation layer driven by the connection manager.
///
/// Indicator and log calls arrive from the manager's event loop task, one
/// at a time. [`clear_input`](Presenter::clear_input) runs on the thread
/// that called `send`, so it may overlap with them.
pub trait Presenter: Send + Sync + 'static {
    /// Shows or hides an indicator.
    fn set_indicator(&self, indicator: Indicator, visibility: Visibility);

    /// Appends one rendered line to the log.
    fn append_line(&self, line: String);

    /// Clears and refocuses the input control after a submit.
    fn clear_input(&self) {}
}

impl<P: Presenter + ?Sized> Presenter for Arc<P> {
    fn set_indicator(&self, indicator: Indicator, visibility: Visibility) {
        (**self).set_indicator(indicator, visibility);
    }

    fn append_line(&self, line: String) {
        (**self).append_line(line);
    }

    fn clear_input(&self) {
        (**self).clear_input();
    }
}

/// Applies the indicator pair for an open connection.
pub(crate) fn show_open(presenter: &dyn Presenter) {
    presenter.set_indicator(Indicator::Open, Visibility::Shown);
    presenter.set_indicator(Indicator::Closed, Visibility::Hidden);
}

/// Applies the indicator pair for a closed connection.
pub(crate) fn show_closed(presenter: &dyn Presenter) {
    presenter.set_indicator(Indicator::Open, Visibility::Hidden);
    presenter.set_indicator(Indicator::Closed, Visibility::Shown);
}

// ============================================================================
// MemoryPresenter
// ============================================================================

#[derive(Debug)]
struct MemoryState {
    open: Visibility,
    closed: Visibility,
    lines: Vec<String>,
    inputs_cleared: usize,
}

/// Presenter that records everything in memory.
///
/// Cheap to clone; clones share the same state. Both indicators start
/// hidden until the manager first drives them.
#[derive(Debug, Clone)]
pub struct MemoryPresenter {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryPresenter {
    /// Creates an empty presenter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                open: Visibility::Hidden,
                closed: Visibility::Hidden,
                lines: Vec::new(),
                inputs_cleared: 0,
            })),
        }
    }

    /// Returns the current visibility of an indicator.
    #[must_use]
    pub fn indicator(&self, indicator: Indicator) -> Visibility {
        let state = self.inner.lock();
        match indicator {
            Indicator::Open => state.open,
            Indicator::Closed => state.closed,
        }
    }

    /// Returns `true` if the indicators read "open".
    #[must_use]
    pub fn shows_open(&self) -> bool {
        self.indicator(Indicator::Open).is_shown() && !self.indicator(Indicator::Closed).is_shown()
    }

    /// Returns `true` if the indicators read "closed".
    #[must_use]
    pub fn shows_closed(&self) -> bool {
        !self.indicator(Indicator::Open).is_shown() && self.indicator(Indicator::Closed).is_shown()
    }

    /// Returns a copy of the rendered log.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.clone()
    }

    /// Returns how many times the input was cleared.
    #[must_use]
    pub fn inputs_cleared(&self) -> usize {
        self.inner.lock().inputs_cleared
    }
}

impl Default for MemoryPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for MemoryPresenter {
    fn set_indicator(&self, indicator: Indicator, visibility: Visibility) {
        let mut state = self.inner.lock();
        match indicator {
            Indicator::Open => state.open = visibility,
            Indicator::Closed => state.closed = visibility,
        }
    }

    fn append_line(&self, line: String) {
        self.inner.lock().lines.push(line);
    }

    fn clear_input(&self) {
        self.inner.lock().inputs_cleared += 1;
    }
}

// ============================================================================
// TracingPresenter
// ============================================================================

/// Presenter that reports through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn set_indicator(&self, indicator: Indicator, visibility: Visibility) {
        if visibility.is_shown() {
            info!(%indicator, "Indicator shown");
        }
    }

    fn append_line(&self, line: String) {
        info!(line = %line, "Message");
    }
}

// ============================================================================
// WriterPresenter
// ============================================================================

/// Presenter that writes each line to a writer, e.g. stdout.
///
/// Indicator changes are written as `[open]` / `[closed]` lines.
pub struct WriterPresenter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterPresenter<W> {
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Failed to write line");
        }
    }
}

impl<W: Write + Send + 'static> Presenter for WriterPresenter<W> {
    fn set_indicator(&self, indicator: Indicator, visibility: Visibility) {
        if visibility.is_shown() {
            self.write_line(&format!("[{indicator}]"));
        }
    }

    fn append_line(&self, line: String) {
        self.write_line(&line);
    }
}

// ============================================================================
// Tests
// ============================================================================
