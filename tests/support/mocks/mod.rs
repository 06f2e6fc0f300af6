// tests/support/mocks/mod.rs
pub mod mailer;
pub mod security;
pub mod store;
pub mod time;
pub mod users;

pub use mailer::*;
pub use security::*;
pub use store::*;
pub use time::*;
pub use users::*;
