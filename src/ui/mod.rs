//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input routing through the keybinding registry
//! - `events` - Background task event processing
//! - `render` - Shell layout and view dispatch
//! - `helpers` - Task spawning and shared formatting
//! - `login` - Login screen
//! - `nav` - Top bar and side navigation
//! - `articles` - Filterable, sortable, paginated article table
//! - `detail` - Read-only article page
//! - `editor` - Publish / edit form
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod articles;
mod detail;
mod editor;
mod events;
mod help;
pub(crate) mod helpers;
mod input;
mod login;
mod loop_runner;
mod nav;
mod render;
mod status;

// Re-export the public API
pub use events::handle_app_event;
pub use loop_runner::{run, Action};
