//! Terminal content-management console for an article publishing API.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive `api` and the `app` state machine directly.

pub mod api;
pub mod app;
pub mod config;
pub mod editor;
pub mod keybindings;
pub mod login;
pub mod query;
pub mod session;
pub mod theme;
pub mod ui;
pub mod util;
pub mod validation;
