//! Income and expense totals over a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    transaction::{
        Transaction, TransactionType,
        query::{TransactionQuery, query_transactions},
        window::{local_timezone, today_window},
    },
};

/// The total income and expenses over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// The sum of all income.
    pub income: f64,
    /// The sum of everything that is not income.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

impl Summary {
    /// Sum the amounts of `transactions`, split on whether each one is income.
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (income, expense) =
            transactions
                .into_iter()
                .fold((0.0, 0.0), |(income, expense), transaction| {
                    if transaction.transaction_type == TransactionType::Income {
                        (income + transaction.amount, expense)
                    } else {
                        (income, expense + transaction.amount)
                    }
                });

        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// The state needed for summarizing transactions.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the summary of the user's transactions today.
///
/// Today runs from local midnight up to and including 23:59:59.999.
pub async fn get_today_summary(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match summarize_today(&state, user_id, OffsetDateTime::now_utc()) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_json_response("Summary failed"),
    }
}

/// A route handler that responds with the summary of all the user's transactions.
pub async fn get_all_summary(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match summarize(&state, user_id, TransactionQuery::default()) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_json_response("Summary failed"),
    }
}

fn summarize_today(
    state: &SummaryState,
    user_id: UserID,
    now: OffsetDateTime,
) -> Result<Summary, Error> {
    let tz = local_timezone(&state.local_timezone)?;
    let query = TransactionQuery {
        date_range: Some(today_window(now, tz)),
        sort_date: None,
    };

    summarize(state, user_id, query)
}

fn summarize(
    state: &SummaryState,
    user_id: UserID,
    query: TransactionQuery,
) -> Result<Summary, Error> {
    let transactions = {
        let connection = lock_connection(&state.db_connection)?;
        query_transactions(user_id, query, &connection)?
    };

    Ok(Summary::from_transactions(&transactions))
}

#[cfg(test)]
mod summary_tests {
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::Summary;

    fn transaction(transaction_type: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(1),
            transaction_type,
            amount,
            remark: None,
            date: datetime!(2024-03-05 12:00 UTC),
        }
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(
            Summary::from_transactions(&Vec::<Transaction>::new()),
            Summary::default()
        );
    }

    #[test]
    fn splits_income_and_expense() {
        let transactions = [
            transaction(TransactionType::Income, 100.0),
            transaction(TransactionType::Expense, 30.0),
            transaction(TransactionType::Expense, 5.0),
        ];

        let got = Summary::from_transactions(&transactions);

        assert_eq!(
            got,
            Summary {
                income: 100.0,
                expense: 35.0,
                balance: 65.0
            }
        );
    }

    #[test]
    fn balance_can_be_negative() {
        let transactions = [
            transaction(TransactionType::Income, 10.0),
            transaction(TransactionType::Expense, 25.0),
        ];

        assert_eq!(Summary::from_transactions(&transactions).balance, -15.0);
    }
}

#[cfg(test)]
mod endpoint_tests {
    use axum::{Router, extract::FromRef, routing::get};
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        AppState, endpoints,
        transaction::{
            TransactionType,
            summary::{Summary, SummaryState, get_all_summary, get_today_summary, summarize_today},
            test_utils::{get_test_server, get_test_state, insert_transaction},
        },
    };

    fn router() -> Router<AppState> {
        Router::new()
            .route(endpoints::TODAY_SUMMARY, get(get_today_summary))
            .route(endpoints::ALL_SUMMARY, get(get_all_summary))
    }

    #[test]
    fn today_summary_includes_last_millisecond_of_day() {
        let (state, user_id, other_user_id) = get_test_state();
        let now = datetime!(2024-03-05 15:00 UTC);
        insert_transaction(
            &state,
            user_id,
            TransactionType::Income,
            100.0,
            datetime!(2024-03-05 00:00 UTC),
        );
        insert_transaction(
            &state,
            user_id,
            TransactionType::Expense,
            30.0,
            datetime!(2024-03-05 23:59:59.999 UTC),
        );
        insert_transaction(
            &state,
            user_id,
            TransactionType::Expense,
            7.0,
            datetime!(2024-03-06 00:00 UTC),
        );
        insert_transaction(
            &state,
            user_id,
            TransactionType::Income,
            11.0,
            datetime!(2024-03-04 23:59:59.999 UTC),
        );
        insert_transaction(&state, other_user_id, TransactionType::Income, 50.0, now);

        let got = summarize_today(&SummaryState::from_ref(&state), user_id, now).unwrap();

        assert_eq!(
            got,
            Summary {
                income: 100.0,
                expense: 30.0,
                balance: 70.0
            }
        );
    }

    #[test]
    fn today_summary_spans_daylight_saving_change() {
        let (mut state, user_id, _) = get_test_state();
        state.local_timezone = "Pacific/Auckland".to_owned();
        // 17:00 NZST on 2024-04-07, the day clocks went back an hour.
        let now = datetime!(2024-04-07 05:00 UTC);
        let dates = [
            (1.0, datetime!(2024-04-06 10:59:59.999 UTC)),
            (10.0, datetime!(2024-04-06 11:00 UTC)),
            (100.0, datetime!(2024-04-07 11:59:59.999 UTC)),
            (1000.0, datetime!(2024-04-07 12:00 UTC)),
        ];
        for (amount, date) in dates {
            insert_transaction(&state, user_id, TransactionType::Expense, amount, date);
        }

        let got = summarize_today(&SummaryState::from_ref(&state), user_id, now).unwrap();

        assert_eq!(
            got,
            Summary {
                income: 0.0,
                expense: 110.0,
                balance: -110.0
            }
        );
    }

    #[tokio::test]
    async fn today_summary_endpoint_counts_todays_transactions() {
        let (state, user_id, _) = get_test_state();
        let now = OffsetDateTime::now_utc();
        insert_transaction(&state, user_id, TransactionType::Income, 20.0, now);
        insert_transaction(
            &state,
            user_id,
            TransactionType::Expense,
            1000.0,
            now - Duration::days(2),
        );
        let server = get_test_server(router(), state, user_id);

        let response = server.get(endpoints::TODAY_SUMMARY).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Summary>(),
            Summary {
                income: 20.0,
                expense: 0.0,
                balance: 20.0
            }
        );
    }

    #[tokio::test]
    async fn all_summary_counts_every_owned_transaction() {
        let (state, user_id, other_user_id) = get_test_state();
        let date = datetime!(2020-01-01 00:00 UTC);
        insert_transaction(&state, user_id, TransactionType::Income, 100.0, date);
        insert_transaction(
            &state,
            user_id,
            TransactionType::Expense,
            30.0,
            date + Duration::days(400),
        );
        insert_transaction(&state, user_id, TransactionType::Expense, 5.0, date);
        insert_transaction(&state, other_user_id, TransactionType::Income, 1.0, date);
        let server = get_test_server(router(), state, user_id);

        let response = server.get(endpoints::ALL_SUMMARY).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Summary>(),
            Summary {
                income: 100.0,
                expense: 35.0,
                balance: 65.0
            }
        );
    }
}
