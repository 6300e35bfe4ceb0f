//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, post_log_in, register_user},
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_all_summary, get_today_summary, get_transactions, get_transactions_by_date,
    },
};

/// Return a router with all the app's routes.
///
/// Every transaction route requires a bearer token, see [auth_guard].
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(get_transactions),
        )
        .route(endpoints::TRANSACTIONS_BY_DATE, get(get_transactions_by_date))
        .route(endpoints::TODAY_SUMMARY, get(get_today_summary))
        .route(endpoints::ALL_SUMMARY, get(get_all_summary))
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_root() -> &'static str {
    "API is running..."
}

async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");
    Error::NotFound.into_json_response("Not found")
}
