use async_trait::async_trait;

use super::{DynError, environment::Environment};

#[async_trait]
/// Per-actor behavior driven by the simulation scheduler.
///
/// Each virtual user runs `on_start` once, then `task` repeatedly at the
/// configured pace until the run ends. Task errors are counted against the
/// user's stats channel and the loop keeps going; `on_start` errors stop the
/// whole run.
pub trait UserBehavior: Send {
    fn name(&self) -> &str;

    async fn on_start(&mut self, _environment: &Environment) -> Result<(), DynError> {
        Ok(())
    }

    async fn task(&mut self, environment: &Environment) -> Result<(), DynError>;
}
