pub mod account;
pub mod node;
pub mod provision;
pub mod readiness;
pub mod sim;
pub mod stats;
pub mod transaction;

pub use loadtest_configs::adjust_timeout;
