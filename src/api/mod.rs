//! HTTP API for caption acquisition and streaming translation

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{start_http_server, AppState};
