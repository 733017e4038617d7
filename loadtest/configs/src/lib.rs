use std::{ops::Mul as _, sync::LazyLock, time::Duration};

use loadtest_env as lt_env;

pub mod constants;
pub mod load;
pub mod timeouts;

pub use load::{ConfigError, LoadConfig, WaitLevel};

static IS_SLOW_TEST_ENV: LazyLock<bool> = LazyLock::new(lt_env::slow_test_env);

const SLOW_ENV_TIMEOUT_MULTIPLIER: u32 = 2;

/// In slow test environments like CI, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV {
        d.mul(SLOW_ENV_TIMEOUT_MULTIPLIER)
    } else {
        d
    }
}
