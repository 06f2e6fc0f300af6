use crate::domain::user::UserProfile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfoDto {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<UserProfile> for UserInfoDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.into(),
            email: profile.email.into(),
            name: profile.name.into(),
        }
    }
}
