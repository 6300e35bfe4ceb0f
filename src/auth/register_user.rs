//! The route for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, UserID, user::create_user},
    db::lock_connection,
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used when hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The details needed to register a user.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email address the user will log in with.
    pub email: String,
    /// The password the user will log in with.
    pub password: String,
}

/// The public details of a newly registered user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RegisteredUser {
    /// The ID of the new user.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: String,
}

/// A route handler for registering a new user, responds with 201 and the new user's ID.
///
/// # Errors
///
/// Responds with:
/// - 400 if the email is invalid or the password is too weak,
/// - 409 if the email is already registered,
/// - 500 if the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<RegistrationState>,
    body: Result<Json<RegisterData>, JsonRejection>,
) -> Response {
    match register(&state, body) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(error) => error.into_json_response("Registration failed"),
    }
}

fn register(
    state: &RegistrationState,
    body: Result<Json<RegisterData>, JsonRejection>,
) -> Result<RegisteredUser, Error> {
    let Json(data) = body?;

    let email: EmailAddress = data
        .email
        .parse()
        .map_err(|error: email_address::Error| Error::InvalidEmail(error.to_string()))?;
    let password_hash = PasswordHash::from_raw_password(&data.password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(email, password_hash, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok(RegisteredUser {
        id: user.id,
        email: user.email.to_string(),
    })
}
