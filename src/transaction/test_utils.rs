use axum::{Extension, Router};
use axum_test::TestServer;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState,
    auth::{PasswordHash, UserID, create_user},
    transaction::{NewTransaction, Transaction, TransactionType, create_transaction},
};

/// Create an app state backed by an in-memory database with two registered users.
///
/// Returns the state, the ID of the user that requests are made as, and the ID of another user.
pub fn get_test_state() -> (AppState, UserID, UserID) {
    let state = AppState::new(Connection::open_in_memory().unwrap(), "42", "Etc/UTC")
        .expect("Could not create app state");

    let (user, other_user) = {
        let connection = state.db_connection.lock().unwrap();
        let user = create_user(
            "foo@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let other_user = create_user(
            "other@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();

        (user, other_user)
    };

    (state, user.id, other_user.id)
}

/// Serve `router` with every request authenticated as `user_id`.
pub fn get_test_server(router: Router<AppState>, state: AppState, user_id: UserID) -> TestServer {
    let app = router.layer(Extension(user_id)).with_state(state);

    TestServer::new(app).expect("Could not create test server.")
}

/// Insert a transaction directly into the database of `state`.
#[track_caller]
pub fn insert_transaction(
    state: &AppState,
    user_id: UserID,
    transaction_type: TransactionType,
    amount: f64,
    date: OffsetDateTime,
) -> Transaction {
    create_transaction(
        user_id,
        NewTransaction {
            transaction_type,
            amount,
            remark: None,
            date,
        },
        &state.db_connection.lock().unwrap(),
    )
    .expect("Could not create transaction")
}
