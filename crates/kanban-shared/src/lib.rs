//! Domain types shared by the Kanban server and its tests.
//!
//! Nothing in here performs I/O: models, the access policy, validation rules,
//! aggregate counters and the per-action request/response shapes are all plain
//! data and pure functions.

pub mod api;
pub mod models;
pub mod policy;
pub mod stats;
pub mod validation;

pub use models::*;
