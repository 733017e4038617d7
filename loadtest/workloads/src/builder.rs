use loadtest_core::sim::{DynError, SimulationBuilder};

use crate::inscription::{
    DEFAULT_MINT_AMOUNT, DEFAULT_TICK, MintInitializer, MintInscriptionUser,
    MintSuccessExpectation,
};

/// Extension methods wiring inscription workloads into a simulation.
pub trait SimulationBuilderExt: Sized {
    #[must_use]
    /// Attach the full mint workload: init hook, paced mint users, and the
    /// success expectation.
    fn mint_inscriptions(self) -> Self;

    #[must_use]
    /// Like [`Self::mint_inscriptions`], minting a custom ticker and amount.
    fn mint_inscriptions_with(self, tick: &str, amt: u64) -> Self;
}

impl SimulationBuilderExt for SimulationBuilder {
    fn mint_inscriptions(self) -> Self {
        self.mint_inscriptions_with(DEFAULT_TICK, DEFAULT_MINT_AMOUNT)
    }

    fn mint_inscriptions_with(self, tick: &str, amt: u64) -> Self {
        tracing::info!(tick, amt, "attaching mint inscription workload");

        let initializer = MintInitializer::new();
        let tick = tick.to_owned();

        self.on_init(move |environment| async move {
            initializer
                .run(&environment)
                .await
                .map_err(DynError::from)
        })
        .with_users(move |index| {
            MintInscriptionUser::new(index)
                .with_tick(tick.clone())
                .with_amount(amt)
        })
        .with_expectation(MintSuccessExpectation::new())
    }
}
