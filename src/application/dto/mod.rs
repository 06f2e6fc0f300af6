pub mod auth;
pub mod sessions;
pub mod users;

pub use auth::{
    AuthorizationRedirect, AuthorizeOutcome, AuthorizeRequest, TokenResponse,
};
pub use sessions::SessionFacts;
pub use users::UserInfoDto;
