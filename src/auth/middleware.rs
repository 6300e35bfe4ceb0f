//! Authentication middleware that validates bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, token::decode_token, user::get_user_by_id},
    db::lock_connection,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify the signature of bearer tokens.
    pub decoding_key: DecodingKey,
    /// The database connection, used to check that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.token_keys.decoding_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request and the request executed normally if the token is
/// valid, otherwise a 401 response is returned and the route handler is never called.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let user_id = match authenticate(&mut parts, &state).await {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri);
            return error.into_response();
        }
    };

    parts.extensions.insert(user_id);
    next.run(Request::from_parts(parts, body)).await
}

async fn authenticate(parts: &mut Parts, state: &AuthState) -> Result<UserID, Error> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|rejection| Error::Unauthorized(rejection.to_string()))?;

    let user_id = decode_token(bearer.token(), &state.decoding_key)?;

    let connection = lock_connection(&state.db_connection)?;
    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(user.id),
        Err(Error::NotFound) => Err(Error::Unauthorized(format!(
            "user {user_id} no longer exists"
        ))),
        Err(error) => Err(error),
    }
}
