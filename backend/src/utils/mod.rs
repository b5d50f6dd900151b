pub mod cookies;
pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenError, TokenKind, TokenService};
pub use password::*;
