pub mod authorization;
pub mod errors;
pub mod token;
pub mod user;
pub mod verification;
