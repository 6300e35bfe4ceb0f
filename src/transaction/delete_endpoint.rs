//! The route for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, auth::UserID, database_id::TransactionId, db::lock_connection,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The confirmation sent after a transaction is deleted.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    /// Always "Deleted".
    pub message: String,
}

/// A route handler for deleting a transaction owned by the authenticated user.
///
/// Responds with 404 if the user does not own a transaction with the ID in the path,
/// including when it has already been deleted or the ID is not an integer.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Response {
    let result = transaction_id
        .map_err(Error::from)
        .and_then(|Path(transaction_id)| {
            let connection = lock_connection(&state.db_connection)?;
            delete_transaction(user_id, transaction_id, &connection)?;
            Ok(transaction_id)
        });

    match result {
        Ok(transaction_id) => {
            tracing::debug!("User {user_id} deleted transaction {transaction_id}");
            Json(DeleteResponse {
                message: "Deleted".to_owned(),
            })
            .into_response()
        }
        Err(error) => error.into_json_response("Delete failed"),
    }
}

fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}
