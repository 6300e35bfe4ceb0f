//! Tally is a backend for tracking personal income and expenses.
//!
//! This library provides a JSON REST API where each user can record
//! transactions, list them, and get income/expense summaries. Every
//! transaction route requires a bearer token obtained from the log-in route.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod routing;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, Transaction, TransactionType, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email or password given at log-in did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry a valid bearer token.
    ///
    /// The string describes why the token was rejected and is only intended
    /// for debugging, e.g. "missing authorization header" or "token expired".
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// A bearer token could not be created for a user.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The user provided a string that is not a valid email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A calendar date in a query string could not be parsed.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not parse date: {0}")]
    InvalidDate(String),

    /// The JSON body of a request could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The requested resource was not found.
    ///
    /// For transactions this covers IDs that do not exist, IDs that belong to
    /// another user and path segments that are not IDs at all. A client cannot
    /// tell another user's record apart from a missing one.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.email") => Error::DuplicateEmail,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidBody(rejection.body_text())
    }
}

/// A path segment that is not a valid ID cannot name a resource.
impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", rejection.body_text());
        Error::NotFound
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// A short summary of the operation that failed, e.g. "Create failed".
    pub message: String,
    /// The underlying cause of the failure.
    pub error: String,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_) | Error::InvalidEmail(_) | Error::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Bad dates in by-date lookups are part of the 500 contract of that route.
            Error::InvalidDate(_)
            | Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a JSON response of the form `{message, error}`.
    ///
    /// `message` names the operation that failed. It is replaced with
    /// "Not found" and "Not authorized" for [Error::NotFound] and auth errors
    /// so that those responses look the same regardless of the route.
    pub(crate) fn into_json_response(self, message: &str) -> Response {
        let status = self.status_code();
        let message = match self {
            Error::NotFound => "Not found",
            Error::Unauthorized(_) => "Not authorized",
            _ => message,
        };

        if status.is_server_error() {
            tracing::error!("{message}: {self}");
        }

        let body = ErrorBody {
            message: message.to_owned(),
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_json_response("Request failed")
    }
}
