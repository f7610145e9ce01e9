//! Request and response shapes, one record per action.
//!
//! Resources deliberately have several independent shapes rather than one
//! struct with optional parts: what a client may send on create differs from
//! what it may send on a partial update, and list, detail and update responses
//! each expose a different field set.

mod auth;
mod body;
mod boards;
mod comments;
pub mod fields;
mod tasks;

pub use auth::*;
pub use body::{FieldReader, FieldValue, FromJson};
pub use boards::*;
pub use comments::*;
pub use tasks::*;
