mod middleware;
mod password;
mod token;

pub use middleware::{auth_middleware, AuthUser};
pub use password::{hash_password, verify_password};
pub use token::{generate_token, parse_authorization};
