// src/infrastructure/repositories/error.rs
use crate::domain::errors::DomainError;

const CNT_USER_EMAIL: &str = "users_email_key";

pub fn map_sqlx(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if db_err.constraint() == Some(CNT_USER_EMAIL) {
                return DomainError::Conflict("email already registered".into());
            }

            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "23505" => return DomainError::Conflict("unique constraint violated".into()),
                    "23514" => return DomainError::Validation("check constraint violated".into()),
                    _ => {}
                }
            }

            DomainError::Persistence(db_err.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DomainError::Persistence("database unavailable".into())
        }
        _ => DomainError::Persistence(err.to_string()),
    }
}
