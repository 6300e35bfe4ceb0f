//! The route for partially updating a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, named_params};
use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    db::lock_connection,
    transaction::{
        Transaction, TransactionType,
        core::{TRANSACTION_COLUMNS, map_transaction_row, to_unix_millis},
    },
};

/// The state needed for updating a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The fields of a transaction that may be changed.
///
/// Fields that are left out keep their current value. The ID and owner of a
/// transaction cannot be changed, so `id` and `userId` in the request body are dropped.
#[derive(Debug, Deserialize)]
pub struct TransactionPatch {
    /// The new transaction type.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The new amount.
    #[serde(default)]
    pub amount: Option<f64>,
    /// The new remark, `Some(None)` clears the remark.
    #[serde(default, deserialize_with = "present_or_null")]
    pub remark: Option<Option<String>>,
    /// The new date.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

/// Distinguishes a field set to `null` (`Some(None)`) from a missing field (`None`).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A route handler for updating a transaction owned by the authenticated user.
///
/// Responds with the updated transaction, or 404 if the user does not own a
/// transaction with the ID in the path. A path ID that is not an integer is also 404.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
    body: Result<Json<TransactionPatch>, JsonRejection>,
) -> Response {
    let result = transaction_id
        .map_err(Error::from)
        .and_then(|Path(transaction_id)| {
            let Json(patch) = body?;
            let connection = lock_connection(&state.db_connection)?;
            update_transaction(user_id, transaction_id, patch, &connection)
        });

    match result {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => {
            tracing::debug!("Could not update transaction: {error}");
            error.into_json_response("Update failed")
        }
    }
}

/// Apply `patch` to the transaction `id` owned by `user_id` and return the updated transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let set_remark = patch.remark.is_some();

    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET
                type = COALESCE(:type, type),
                amount = COALESCE(:amount, amount),
                remark = CASE WHEN :set_remark THEN :remark ELSE remark END,
                date = COALESCE(:date, date)
             WHERE id = :id AND user_id = :user_id
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":type": patch.transaction_type,
                ":amount": patch.amount,
                ":set_remark": set_remark,
                ":remark": patch.remark.flatten(),
                ":date": patch.date.map(to_unix_millis),
                ":id": id,
                ":user_id": user_id.as_i64(),
            },
            map_transaction_row,
        )?;

    Ok(transaction)
}
