pub mod defaults;

pub use loadtest_workloads::SimulationBuilderExt;
