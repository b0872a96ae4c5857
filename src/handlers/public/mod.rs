// handlers/public/mod.rs - Endpoints reachable without a token

pub mod health;
pub mod login;

pub use health::{health_get, root_get};
pub use login::login_post;
