//! Database query helpers for listing a user's transactions.

use std::ops::Bound;

use rusqlite::{Connection, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    transaction::core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row, to_unix_millis},
};

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Defines how transactions should be fetched from [query_transactions].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TransactionQuery {
    /// Include transactions whose date falls within these bounds.
    pub date_range: Option<(Bound<OffsetDateTime>, Bound<OffsetDateTime>)>,
    /// Orders transactions by date, most recent first for [SortOrder::Descending].
    pub sort_date: Option<SortOrder>,
}

/// Query the transactions owned by `user_id`.
///
/// Transactions with the same date are ordered by ID so that the order is
/// stable between calls.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub(crate) fn query_transactions(
    user_id: UserID,
    query: TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut query_string_parts =
        vec![format!("SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"")];
    let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some((start, end)) = query.date_range {
        for (bound, inclusive_operator, exclusive_operator) in [(start, ">=", ">"), (end, "<=", "<")]
        {
            let (operator, date) = match bound {
                Bound::Included(date) => (inclusive_operator, date),
                Bound::Excluded(date) => (exclusive_operator, date),
                Bound::Unbounded => continue,
            };

            query_parameters.push(Value::Integer(to_unix_millis(date)));
            where_clause_parts.push(format!("date {operator} ?{}", query_parameters.len()));
        }
    }

    query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));

    match query.sort_date {
        Some(SortOrder::Ascending) => {
            query_string_parts.push("ORDER BY date ASC, id ASC".to_owned())
        }
        Some(SortOrder::Descending) => {
            query_string_parts.push("ORDER BY date DESC, id DESC".to_owned())
        }
        None => {}
    }

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        transaction::{NewTransaction, TransactionType, create_transaction},
    };

    use super::{SortOrder, TransactionQuery, query_transactions};

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "foo@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn insert(user_id: UserID, amount: f64, date: time::OffsetDateTime, conn: &Connection) {
        create_transaction(
            user_id,
            NewTransaction {
                transaction_type: TransactionType::Expense,
                amount,
                remark: None,
                date,
            },
            conn,
        )
        .expect("Could not create transaction");
    }

    #[test]
    fn query_returns_only_owned_transactions() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            &conn,
        )
        .unwrap();
        let date = datetime!(2025-10-05 12:00 UTC);
        insert(user_id, 1.0, date, &conn);
        insert(other_user.id, 2.0, date, &conn);

        let got = query_transactions(user_id, TransactionQuery::default(), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].user_id, user_id);
        assert_eq!(got[0].amount, 1.0);
    }

    #[test]
    fn query_sorts_by_date_descending() {
        let (conn, user_id) = get_test_connection();
        let start = datetime!(2025-10-05 12:00 UTC);
        for (i, days) in [3, 0, 5, 1, 4, 2].into_iter().enumerate() {
            insert(user_id, i as f64, start + Duration::days(days), &conn);
        }

        let got = query_transactions(
            user_id,
            TransactionQuery {
                sort_date: Some(SortOrder::Descending),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 6);
        for pair in got.windows(2) {
            assert!(
                pair[0].date >= pair[1].date,
                "{} should come before {}",
                pair[0].date,
                pair[1].date
            );
        }
    }

    #[test]
    fn query_sorts_by_date_ascending() {
        let (conn, user_id) = get_test_connection();
        let start = datetime!(2025-10-05 12:00 UTC);
        for days in [2, 0, 1] {
            insert(user_id, days as f64, start + Duration::days(days), &conn);
        }

        let got = query_transactions(
            user_id,
            TransactionQuery {
                sort_date: Some(SortOrder::Ascending),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        let amounts: Vec<f64> = got.iter().map(|transaction| transaction.amount).collect();
        assert_eq!(amounts, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn query_half_open_range_excludes_end() {
        let (conn, user_id) = get_test_connection();
        let start = datetime!(2024-03-05 00:00 UTC);
        let end = datetime!(2024-03-06 00:00 UTC);
        insert(user_id, 1.0, start, &conn);
        insert(user_id, 2.0, end - Duration::milliseconds(1), &conn);
        insert(user_id, 3.0, end, &conn);
        insert(user_id, 4.0, start - Duration::milliseconds(1), &conn);

        let got = query_transactions(
            user_id,
            TransactionQuery {
                date_range: Some((Bound::Included(start), Bound::Excluded(end))),
                sort_date: Some(SortOrder::Ascending),
            },
            &conn,
        )
        .unwrap();

        let amounts: Vec<f64> = got.iter().map(|transaction| transaction.amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }

    #[test]
    fn query_closed_range_includes_end() {
        let (conn, user_id) = get_test_connection();
        let start = datetime!(2024-03-05 00:00 UTC);
        let end = datetime!(2024-03-05 23:59:59.999 UTC);
        insert(user_id, 1.0, start, &conn);
        insert(user_id, 2.0, end, &conn);
        insert(user_id, 3.0, end + Duration::milliseconds(1), &conn);

        let got = query_transactions(
            user_id,
            TransactionQuery {
                date_range: Some((Bound::Included(start), Bound::Included(end))),
                sort_date: Some(SortOrder::Ascending),
            },
            &conn,
        )
        .unwrap();

        let amounts: Vec<f64> = got.iter().map(|transaction| transaction.amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }
}
