//! HTTP backend for the Kanban board application.
//!
//! The binary in `main.rs` wires configuration, logging and the chosen store
//! together; everything else lives here so the integration tests can build
//! the exact same [`Router`](axum::Router) over a [`store::MemoryStore`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod store;

pub use config::Config;
pub use db::DbPool;
pub use routes::{create_router, AppState};
