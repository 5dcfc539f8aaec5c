// src/models/user.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::{LOGIN_LOCK_MINUTES, MAX_LOGIN_ATTEMPTS};

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Consecutive failed logins.
    #[serde(skip)]
    pub login_attempts: i32,

    #[serde(skip)]
    pub locked_until: Option<DateTime<Utc>>,

    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Login state after one more failed attempt: (attempts, locked_until).
    pub fn after_failed_login(&self, now: DateTime<Utc>) -> (i32, Option<DateTime<Utc>>) {
        let attempts = self.login_attempts + 1;
        let locked_until = if attempts >= MAX_LOGIN_ATTEMPTS {
            Some(now + Duration::minutes(LOGIN_LOCK_MINUTES))
        } else {
            self.locked_until
        };
        (attempts, locked_until)
    }
}

/// DTO for user registration.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username length must be between 3 and 20 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 6,
        max = 50,
        message = "Password length must be between 6 and 50 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}
