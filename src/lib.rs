//! media-shelf
//!
//! A web file manager for a folder tree of photos and other files: folder
//! listings with image metadata, uploads, folder creation, deletion,
//! downloads and cached JPEG renditions.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod render;
pub mod server;
pub mod storage;

pub use config::ServerConfig;
pub use server::{Server, router};
