//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The root route, which reports that the API is running.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for exchanging an email and password for a bearer token.
pub const LOG_IN: &str = "/api/log_in";
/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to list the transactions on a given day.
pub const TRANSACTIONS_BY_DATE: &str = "/api/transactions/by-date";
/// The route for the income and expense summary of the current day.
pub const TODAY_SUMMARY: &str = "/api/transactions/today-summary";
/// The route for the income and expense summary of all transactions.
pub const ALL_SUMMARY: &str = "/api/transactions/all-summary";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
