//! Defines the route for exchanging an email and password for a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{token::encode_token, user::get_user_by_email},
    db::lock_connection,
};

/// The state needed to perform a log-in.
#[derive(Clone)]
pub struct LogInState {
    /// The key used to sign bearer tokens.
    pub encoding_key: EncodingKey,
    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.token_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log-in.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The email address the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
}

/// The response to a successful log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The bearer token to send in the `Authorization` header of later requests.
    pub token: String,
}

/// Handler for log-in requests.
///
/// Responds with a bearer token if the email and password belong to a registered user.
///
/// # Errors
///
/// Responds with an error in a few situations.
/// - The email does not belong to a registered user (401).
/// - The password is not correct (401).
/// - An internal error occurred when verifying the password or signing the token (500).
pub async fn post_log_in(
    State(state): State<LogInState>,
    body: Result<Json<LogInData>, JsonRejection>,
) -> Response {
    match log_in(&state, body) {
        Ok(response) => Json(response).into_response(),
        Err(error) => error.into_json_response("Log in failed"),
    }
}

fn log_in(
    state: &LogInState,
    body: Result<Json<LogInData>, JsonRejection>,
) -> Result<LogInResponse, Error> {
    let Json(data) = body?;

    // An unparseable email cannot belong to a user, so it is reported the same way as an unknown one.
    let email: EmailAddress = data.email.parse().map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let password_is_correct = user.password_hash.verify(&data.password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.encoding_key,
    )?;

    tracing::info!("User {} logged in", user.id);

    Ok(LogInResponse { token })
}
