use std::{env, time::Duration};

pub const READINESS_TIMEOUT_SECS: u64 = 120;
pub const RPC_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const BLOCK_HASH_MAX_AGE_SECS: u64 = 10;

fn env_duration(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

/// How long init hooks wait for the readiness signal before giving up.
pub fn readiness_timeout() -> Duration {
    env_duration("LOADTEST_READINESS_TIMEOUT_SECS", READINESS_TIMEOUT_SECS)
}

/// Per-request timeout applied to the node HTTP client.
pub fn rpc_request_timeout() -> Duration {
    env_duration("LOADTEST_RPC_TIMEOUT_SECS", RPC_REQUEST_TIMEOUT_SECS)
}

/// How long a cached block hash stays usable for signing.
pub fn block_hash_max_age() -> Duration {
    env_duration("LOADTEST_BLOCK_HASH_MAX_AGE_SECS", BLOCK_HASH_MAX_AGE_SECS)
}
