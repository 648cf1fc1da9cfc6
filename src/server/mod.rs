//! Server core functionality
//!
//! HTTP surface of the file manager: routing, request handlers, response
//! mapping and the listener lifecycle.

pub mod core;
pub mod handlers;
pub mod responses;
pub mod state;

pub use core::{Server, router};
pub use state::AppState;
