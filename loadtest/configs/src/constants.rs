use std::time::Duration;

/// Default node JSON-RPC endpoint targeted by a run.
pub const DEFAULT_RPC_URL: &str = "http://localhost:3030";

/// Default number of concurrent virtual users.
pub const DEFAULT_USER_COUNT: usize = 10;

/// Default delay between consecutive task invocations of one user.
pub const DEFAULT_PACE: Duration = Duration::from_secs(1);

/// Default wall-clock duration of a run.
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(60);

/// One NEAR in yoctoNEAR.
pub const ONE_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

/// Funds transferred to each virtual user account at startup.
pub const DEFAULT_USER_FUNDS: u128 = 50 * ONE_NEAR;

/// Gas attached to every function call (300 Tgas).
pub const FUNCTION_CALL_GAS: u64 = 300_000_000_000_000;

/// Longest account id accepted by the chain.
pub const MAX_ACCOUNT_ID_LEN: usize = 64;
