//! Library crate for cups-display, exposing modules for the binary and tests.

/// Configuration file loading.
pub mod config;
mod dto;
mod error;
/// HTTP routes: health and display event stream.
pub mod routes;
/// Round orchestration, server link and presentation.
pub mod services;
/// State shared with the HTTP routes.
pub mod state;
