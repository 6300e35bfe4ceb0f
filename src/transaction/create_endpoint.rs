//! The route for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    transaction::{NewTransaction, Transaction, TransactionType, create_transaction},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a transaction.
///
/// Any other fields, such as `userId` or `date`, are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionData {
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// An optional note about the transaction.
    #[serde(default)]
    pub remark: Option<String>,
}

/// A route handler for creating a new transaction owned by the authenticated user.
///
/// The transaction is dated with the current time. Responds with 201 and the new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    body: Result<Json<CreateTransactionData>, JsonRejection>,
) -> Response {
    match create(&state, user_id, body) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error.into_json_response("Create failed"),
    }
}

fn create(
    state: &CreateTransactionState,
    user_id: UserID,
    body: Result<Json<CreateTransactionData>, JsonRejection>,
) -> Result<Transaction, Error> {
    let Json(data) = body?;

    let new_transaction = NewTransaction {
        transaction_type: data.transaction_type,
        amount: data.amount,
        remark: data.remark,
        date: OffsetDateTime::now_utc(),
    };

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(user_id, new_transaction, &connection)?;

    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok(transaction)
}
