use std::{future::Future, sync::Arc, time::Duration};

use futures::{FutureExt as _, future::BoxFuture};
use loadtest_configs::{ConfigError, LoadConfig};
use thiserror::Error;

use super::{
    DynError,
    environment::Environment,
    expectation::Expectation,
    runner::{self, SimulationError},
    user::UserBehavior,
};
use crate::stats::StatsReport;

/// One-shot callback run at simulation startup.
pub type InitHook =
    Box<dyn FnOnce(Arc<Environment>) -> BoxFuture<'static, Result<(), DynError>> + Send>;

pub(super) type UserFactory = Box<dyn Fn(usize) -> Box<dyn UserBehavior> + Send + Sync>;

#[derive(Debug, Error)]
pub enum SimulationBuildError {
    #[error("simulation requires a user behavior factory")]
    NoUsers,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builder collecting everything a run needs before it starts.
pub struct SimulationBuilder {
    config: LoadConfig,
    setup: Option<InitHook>,
    init_hooks: Vec<InitHook>,
    factory: Option<UserFactory>,
    expectations: Vec<Box<dyn Expectation>>,
}

impl SimulationBuilder {
    #[must_use]
    pub fn new(config: LoadConfig) -> Self {
        Self {
            config,
            setup: None,
            init_hooks: Vec::new(),
            factory: None,
            expectations: Vec::new(),
        }
    }

    /// Replace the designated setup path that prepares base state and opens
    /// the readiness gate. The default resolves the funding account and sets
    /// the signal immediately.
    #[must_use]
    pub fn with_setup<F, Fut>(mut self, setup: F) -> Self
    where
        F: FnOnce(Arc<Environment>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        self.setup = Some(Box::new(move |environment| setup(environment).boxed()));
        self
    }

    /// Register a one-time init hook. Hooks run in registration order after
    /// the setup path has been spawned, so they may block on the readiness
    /// signal.
    #[must_use]
    pub fn on_init<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce(Arc<Environment>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        self.init_hooks
            .push(Box::new(move |environment| hook(environment).boxed()));
        self
    }

    /// Provide the factory producing one behavior per virtual user index.
    #[must_use]
    pub fn with_users<F, U>(mut self, factory: F) -> Self
    where
        F: Fn(usize) -> U + Send + Sync + 'static,
        U: UserBehavior + 'static,
    {
        self.factory = Some(Box::new(move |index| Box::new(factory(index))));
        self
    }

    #[must_use]
    pub fn with_expectation<E>(mut self, expectation: E) -> Self
    where
        E: Expectation + 'static,
    {
        self.expectations.push(Box::new(expectation));
        self
    }

    #[must_use]
    pub const fn with_run_duration(mut self, duration: Duration) -> Self {
        self.config.run_duration = duration;
        self
    }

    /// Finalize the plan, validating the config.
    pub fn build(self) -> Result<Simulation, SimulationBuildError> {
        let Self {
            config,
            setup,
            init_hooks,
            factory,
            expectations,
        } = self;

        config.validate()?;
        let factory = factory.ok_or(SimulationBuildError::NoUsers)?;

        Ok(Simulation {
            config,
            setup,
            init_hooks,
            factory,
            expectations,
        })
    }
}

/// Immutable run plan produced by [`SimulationBuilder`].
pub struct Simulation {
    pub(super) config: LoadConfig,
    pub(super) setup: Option<InitHook>,
    pub(super) init_hooks: Vec<InitHook>,
    pub(super) factory: UserFactory,
    pub(super) expectations: Vec<Box<dyn Expectation>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Execute the plan: setup and init hooks, then paced users for the run
    /// duration, then expectations over the final stats.
    pub async fn run(self) -> Result<StatsReport, SimulationError> {
        runner::run(self).await
    }
}
