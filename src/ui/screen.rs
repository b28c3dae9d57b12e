//! Host-side state for the post list: scroll position, which rows are bound
//! into which adapter views, and the signals the adapter raises.

use crate::adapter::{ListObserver, LoadError, PostListAdapter, ViewId};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Terminal lines per row: title, description, image status.
pub const ROW_HEIGHT: u16 = 3;

const STATUS_TTL: Duration = Duration::from_secs(4);

/// Flags raised by the adapter's observer callbacks, read by the loop.
#[derive(Debug, Default)]
pub struct Signals {
    pub content_changed: bool,
    pub row_changed: bool,
    pub last_error: Option<String>,
}

/// Observer registered on the adapter; shares [`Signals`] with the screen.
#[derive(Clone, Default)]
pub struct ScreenObserver(Arc<Mutex<Signals>>);

impl ScreenObserver {
    /// Take the pending signals, leaving defaults behind.
    pub fn take(&self) -> Signals {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }

    fn update(&self, f: impl FnOnce(&mut Signals)) {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl ListObserver for ScreenObserver {
    fn content_changed(&mut self, _rows: usize) {
        self.update(|s| s.content_changed = true);
    }

    fn row_changed(&mut self, _view: ViewId) {
        self.update(|s| s.row_changed = true);
    }

    fn load_failed(&mut self, error: &LoadError) {
        let message = match error {
            LoadError::FeedTransport(e) => format!("Could not load feed: {e}"),
            LoadError::MalformedFeed(_) => "Feed is malformed".to_string(),
            // Skipped entries are only logged
            LoadError::MalformedPostEntry { .. } => return,
            // The fallback image already shows this
            LoadError::ImageTransport { .. } => return,
        };
        self.update(|s| s.last_error = Some(message));
    }
}

pub struct Screen {
    pub selected: usize,
    pub offset: usize,
    /// Rows per page, from the last known terminal height.
    pub capacity: usize,
    /// Whether any feed result has been applied yet.
    pub loaded: bool,
    pub needs_redraw: bool,
    status: Option<(String, Instant)>,
    /// Visible rows and the view each is bound into, ordered by row.
    bound: Vec<(usize, ViewId)>,
    /// Views whose rows scrolled out, available for recycling.
    spare: Vec<ViewId>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            selected: 0,
            offset: 0,
            capacity: 1,
            loaded: false,
            needs_redraw: true,
            status: None,
            bound: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Rows that fit in a list of `height` terminal lines (borders included).
    pub fn capacity_for(height: u16) -> usize {
        (height.saturating_sub(2) / ROW_HEIGHT).max(1) as usize
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
        self.needs_redraw = true;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Returns true if a status message expired.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status {
            Some((_, at)) if at.elapsed() >= STATUS_TTL => {
                self.status = None;
                true
            }
            _ => false,
        }
    }

    /// Bound `(row, view)` pairs in row order.
    pub fn bound(&self) -> &[(usize, ViewId)] {
        &self.bound
    }

    /// Apply observer signals raised while events were handled.
    pub fn apply_signals(&mut self, signals: Signals) {
        if signals.content_changed {
            self.loaded = true;
            // Every binding refers to the old sequence
            self.spare.extend(self.bound.drain(..).map(|(_, view)| view));
            self.needs_redraw = true;
        }
        if signals.row_changed {
            self.needs_redraw = true;
        }
        if let Some(error) = signals.last_error {
            self.loaded = true;
            self.set_status(error);
        }
    }

    pub fn select_next(&mut self, rows: usize) {
        if self.selected + 1 < rows {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self, rows: usize) {
        self.selected = (self.selected + self.capacity).min(rows.saturating_sub(1));
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(self.capacity);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self, rows: usize) {
        self.selected = rows.saturating_sub(1);
    }

    /// Clamp selection and scroll offset to `rows`, then make sure every
    /// visible row is bound to a view.
    ///
    /// Rows that left the window give up their views; newly visible rows take
    /// one of those (or a fresh one) through `render_row`, which issues that
    /// row's image request.
    pub fn bind_visible(&mut self, adapter: &mut PostListAdapter) {
        let rows = adapter.row_count();
        if rows == 0 {
            self.selected = 0;
            self.offset = 0;
        } else {
            self.selected = self.selected.min(rows - 1);
            if self.selected < self.offset {
                self.offset = self.selected;
            } else if self.selected >= self.offset + self.capacity {
                self.offset = self.selected + 1 - self.capacity;
            }
        }

        let window = self.offset..(self.offset + self.capacity).min(rows);

        let (keep, gone): (Vec<_>, Vec<_>) = self
            .bound
            .drain(..)
            .partition(|(row, _)| window.contains(row));
        self.spare.extend(gone.into_iter().map(|(_, view)| view));
        self.bound = keep;

        for row in window {
            if self.bound.iter().any(|(bound_row, _)| *bound_row == row) {
                continue;
            }
            let recycled = self.spare.pop();
            match adapter.render_row(row, recycled) {
                Ok(view) => {
                    self.bound.push((row, view));
                    self.needs_redraw = true;
                }
                Err(e) => {
                    tracing::warn!(row, error = %e, "Failed to bind row");
                    self.spare.extend(recycled);
                    break;
                }
            }
        }
        self.bound.sort_unstable_by_key(|(row, _)| *row);
    }
}
