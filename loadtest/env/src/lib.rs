use std::env;

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("LOADTEST_SLOW_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn near_rpc_url() -> Option<String> {
    env::var("NEAR_RPC_URL").ok()
}

#[must_use]
pub fn loadtest_users() -> Option<usize> {
    env::var("LOADTEST_USERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
}

#[must_use]
pub fn loadtest_pace_millis() -> Option<u64> {
    env::var("LOADTEST_PACE_MILLIS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
}

#[must_use]
pub fn loadtest_run_secs() -> Option<u64> {
    env::var("LOADTEST_RUN_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
}

#[must_use]
pub fn loadtest_run_id() -> Option<String> {
    env::var("LOADTEST_RUN_ID").ok()
}

#[must_use]
pub fn funding_account_id() -> Option<String> {
    env::var("LOADTEST_FUNDING_ACCOUNT_ID").ok()
}

#[must_use]
pub fn funding_secret_key() -> Option<String> {
    env::var("LOADTEST_FUNDING_SECRET_KEY").ok()
}

#[must_use]
pub fn tx_wait_level() -> Option<String> {
    env::var("LOADTEST_TX_WAIT").ok()
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}
