use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt as _;
use thiserror::Error;
use tokio::{
    task::JoinSet,
    time::{MissedTickBehavior, interval, sleep, timeout},
};
use tracing::{debug, info, warn};

use super::{
    DynError,
    definition::{InitHook, Simulation, UserFactory},
    environment::{Environment, EnvironmentError},
    expectation::Expectation,
    user::UserBehavior,
};
use crate::stats::StatsReport;

type UserOutcome = Result<(), DynError>;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error("setup failed")]
    Setup(#[source] DynError),
    #[error("init hook #{index} failed")]
    Init {
        index: usize,
        #[source]
        source: DynError,
    },
    #[error("user task failed")]
    User(#[source] DynError),
    #[error("expectations failed:\n{summary}")]
    Expectations { summary: String },
}

/// Drives one simulation: setup and init hooks first, then paced users until
/// the run window closes, then expectations over the final stats.
pub(super) async fn run(simulation: Simulation) -> Result<StatsReport, SimulationError> {
    let Simulation {
        config,
        setup,
        init_hooks,
        factory,
        expectations,
    } = simulation;

    let environment = Arc::new(Environment::new(config)?);
    info!(
        rpc_url = %environment.rpc_url(),
        users = environment.config().users,
        pace_ms = environment.config().pace.as_millis() as u64,
        run_secs = environment.config().run_duration.as_secs(),
        run_id = %environment.config().run_id,
        "starting simulation"
    );

    run_setup_and_init(setup, init_hooks, &environment).await?;

    let mut users = spawn_users(&environment, &factory);
    info!(users = environment.config().users, "virtual users spawned");

    drive_until_run_end(&mut users, environment.config().run_duration).await?;
    drain_users(&mut users).await?;

    let report = environment.stats_handle().report();
    report.log_summary();
    evaluate_expectations(&expectations, &report).await?;

    Ok(report)
}

/// Spawns the setup path, then runs init hooks in registration order so they
/// can genuinely block on the readiness signal while setup is still working.
async fn run_setup_and_init(
    setup: Option<InitHook>,
    init_hooks: Vec<InitHook>,
    environment: &Arc<Environment>,
) -> Result<(), SimulationError> {
    let setup = setup.unwrap_or_else(default_setup);
    let setup_task = tokio::spawn(setup(Arc::clone(environment)));

    let mut hook_failure = None;
    for (index, hook) in init_hooks.into_iter().enumerate() {
        if let Err(source) = hook(Arc::clone(environment)).await {
            hook_failure = Some(SimulationError::Init { index, source });
            break;
        }
        debug!(index, "init hook finished");
    }

    // A failed setup usually explains failed hooks, so it is surfaced first.
    match setup_task.await {
        Ok(Ok(())) => {}
        Ok(Err(source)) => return Err(SimulationError::Setup(source)),
        Err(join_error) => return Err(SimulationError::Setup(Box::new(join_error))),
    }

    hook_failure.map_or(Ok(()), Err)
}

/// Default setup: publish the funding account, then open the gate.
fn default_setup() -> InitHook {
    Box::new(|environment| {
        async move {
            environment.resolve_funding_account()?;
            environment.readiness().set();
            Ok(())
        }
        .boxed()
    })
}

fn spawn_users(environment: &Arc<Environment>, factory: &UserFactory) -> JoinSet<UserOutcome> {
    let pace = environment.config().pace;
    let mut users = JoinSet::new();

    for index in 0..environment.config().users {
        let mut user = factory(index);
        let env = Arc::clone(environment);

        users.spawn(async move {
            let outcome = AssertUnwindSafe(drive_user(&mut user, env.as_ref(), pace))
                .catch_unwind()
                .await;

            outcome.unwrap_or_else(|panic| {
                Err(format!("user task panicked: {}", panic_message(panic)).into())
            })
        });
    }

    users
}

async fn drive_user(
    user: &mut Box<dyn UserBehavior>,
    environment: &Environment,
    pace: Duration,
) -> Result<(), DynError> {
    user.on_start(environment).await?;
    debug!(user = user.name(), "user started");

    // Spread first ticks across the pace window so users do not fire in
    // lockstep.
    sleep(pace.mul_f64(rand::random::<f64>())).await;

    let mut ticks = interval(pace);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        if let Err(error) = user.task(environment).await {
            warn!(user = user.name(), error = %error, "user task failed");
        }
    }
}

/// Polls user tasks until the run window elapses or one reports an error.
async fn drive_until_run_end(
    users: &mut JoinSet<UserOutcome>,
    duration: Duration,
) -> Result<(), SimulationError> {
    let all_users = async {
        while let Some(result) = users.join_next().await {
            map_join_result(result)?;
        }
        Ok(())
    };

    match timeout(duration, all_users).await {
        Err(_elapsed) => Ok(()),
        Ok(result) => result,
    }
}

/// Aborts and drains remaining user tasks so nothing leaks across runs.
async fn drain_users(users: &mut JoinSet<UserOutcome>) -> Result<(), SimulationError> {
    users.abort_all();

    while let Some(result) = users.join_next().await {
        map_join_result(result)?;
    }

    Ok(())
}

/// Converts a joined user task outcome into the canonical error, tolerating
/// cancellation from the end-of-run abort.
fn map_join_result(
    result: Result<UserOutcome, tokio::task::JoinError>,
) -> Result<(), SimulationError> {
    match result {
        Ok(outcome) => outcome.map_err(SimulationError::User),
        Err(join_err) if join_err.is_cancelled() => Ok(()),
        Err(join_err) => Err(SimulationError::User(
            format!("user task failed: {join_err}").into(),
        )),
    }
}

/// Evaluates every expectation, aggregating failures so callers see all
/// missing conditions in a single report.
async fn evaluate_expectations(
    expectations: &[Box<dyn Expectation>],
    report: &StatsReport,
) -> Result<(), SimulationError> {
    let mut failures: Vec<(String, DynError)> = Vec::new();
    for expectation in expectations {
        if let Err(source) = expectation.evaluate(report).await {
            failures.push((expectation.name().to_owned(), source));
        }
    }

    if failures.is_empty() {
        return Ok(());
    }

    let summary = failures
        .into_iter()
        .map(|(name, source)| format!("{name}: {source}"))
        .collect::<Vec<_>>()
        .join("\n");

    Err(SimulationError::Expectations { summary })
}

/// Attempts to turn a panic payload into a readable string for diagnostics.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}
