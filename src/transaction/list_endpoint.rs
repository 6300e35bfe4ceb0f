//! The routes for listing a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    transaction::{
        Transaction,
        query::{SortOrder, TransactionQuery, query_transactions},
        window::{day_window, local_timezone, parse_day},
    },
};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for [get_transactions_by_date].
#[derive(Debug, Deserialize)]
pub struct ByDateQuery {
    /// A calendar day in the format `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// A route handler that responds with all of the user's transactions, most recent first.
pub async fn get_transactions(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let query = TransactionQuery {
        date_range: None,
        sort_date: Some(SortOrder::Descending),
    };

    match list(&state, user_id, query) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_json_response("Get all failed"),
    }
}

/// A route handler that responds with the user's transactions on a single calendar day.
///
/// The day starts at midnight in the server's local timezone and ends just before the following
/// midnight.
///
/// # Errors
///
/// A missing or malformed `date` responds with 500, the same as a store failure.
pub async fn get_transactions_by_date(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(by_date): Query<ByDateQuery>,
) -> Response {
    let result = by_date_query(&state, by_date).and_then(|query| list(&state, user_id, query));

    match result {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_json_response("Get by date failed"),
    }
}

fn by_date_query(
    state: &ListTransactionsState,
    by_date: ByDateQuery,
) -> Result<TransactionQuery, Error> {
    let day = parse_day(by_date.date.as_deref())?;
    let tz = local_timezone(&state.local_timezone)?;

    Ok(TransactionQuery {
        date_range: Some(day_window(day, tz)),
        sort_date: Some(SortOrder::Descending),
    })
}

fn list(
    state: &ListTransactionsState,
    user_id: UserID,
    query: TransactionQuery,
) -> Result<Vec<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    query_transactions(user_id, query, &connection)
}
