//! Terminal render surface for the post list.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `screen` - Scroll state, row/view bindings, adapter observer
//! - `input` - Keyboard input handling
//! - `render` - List and status bar drawing
//! - `text` - Single-line sanitizing and truncation of feed text

mod input;
mod loop_runner;
mod render;
mod screen;
mod text;

pub use loop_runner::{run, Action};
pub use screen::{Screen, ScreenObserver, Signals};
pub use text::fit_line;
