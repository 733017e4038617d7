pub mod definition;
pub mod environment;
pub mod expectation;
pub mod runner;
pub mod user;

pub use definition::{Simulation, SimulationBuildError, SimulationBuilder};
pub use environment::{Environment, EnvironmentError};
pub use expectation::Expectation;
pub use runner::SimulationError;
pub use user::UserBehavior;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
