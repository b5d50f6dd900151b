pub mod auth;
pub mod cart;
pub mod users;

pub use auth::AuthService;
pub use cart::CartService;
pub use users::UserService;
