pub mod entity;
pub mod repository;
pub mod value_objects;

pub use entity::{NewUser, User, UserProfile};
pub use repository::UserDirectory;
pub use value_objects::{DisplayName, Email, PasswordHash, UserId};
