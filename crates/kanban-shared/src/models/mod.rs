mod board;
mod comment;
mod task;
mod user;

pub use board::*;
pub use comment::*;
pub use task::*;
pub use user::*;
