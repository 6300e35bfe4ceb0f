//! Defines the bearer token issued at log-in and how to sign and verify it.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The default duration for which bearer tokens are valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(1);

/// The keys for signing and verifying bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    /// The key used to sign new tokens.
    pub encoding_key: EncodingKey,
    /// The key used to verify the signature of tokens sent by clients.
    pub decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Derive a signing key from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
        }
    }
}

/// The contents of a bearer token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// When the token was issued, as a Unix timestamp.
    pub iat: i64,
    /// When the token expires, as a Unix timestamp.
    pub exp: i64,
}

/// Create a signed bearer token for `user_id` that expires `duration` after `issued_at`.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    issued_at: OffsetDateTime,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and get the ID of the user it was issued to.
///
/// # Errors
/// Returns an [Error::Unauthorized] if the token is malformed, has an invalid
/// signature, or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<UserID, Error> {
    let token_data = decode::<Claims>(token, decoding_key, &Validation::default())
        .map_err(|error| Error::Unauthorized(error.to_string()))?;

    token_data
        .claims
        .sub
        .parse()
        .map(UserID::new)
        .map_err(|_| Error::Unauthorized("token subject is not a user ID".to_owned()))
}
