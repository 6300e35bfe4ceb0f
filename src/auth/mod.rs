//! User accounts and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys};
pub use user::{User, UserID, create_user, create_user_table};

#[cfg(test)]
pub use log_in::{LogInData, LogInResponse};
#[cfg(test)]
pub use register_user::RegisterData;
