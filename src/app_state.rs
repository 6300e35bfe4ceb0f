//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, PasswordHash, TokenKeys},
    db::initialize,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The keys used for signing and verifying bearer tokens.
    pub token_keys: TokenKeys,

    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing the passwords of new users.
    pub password_hash_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Calendar days, such as "today", are interpreted in this timezone.
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `token_secret` is used to sign bearer tokens and `local_timezone` should be a valid,
    /// canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            token_keys: TokenKeys::from_secret(token_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_hash_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            db_connection: connection,
        })
    }
}
