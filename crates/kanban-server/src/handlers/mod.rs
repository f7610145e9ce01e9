pub mod boards;
pub mod comments;
pub mod identity;
mod lookup;
pub mod tasks;
