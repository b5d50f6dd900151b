pub mod cart;
pub mod product;
pub mod transaction;
pub mod user;
pub mod user_repository;

pub use transaction::*;
pub use user::PgCredentialStore;
pub use user_repository::CredentialStore;
