use async_trait::async_trait;
use loadtest_core::{
    sim::{DynError, Expectation},
    stats::StatsReport,
};
use thiserror::Error;

use super::user::MINT_LABEL;

const MIN_MINT_SUCCESS_RATIO: f64 = 0.8;

/// Requires mint traffic to exist and mostly succeed.
#[derive(Clone, Copy, Debug)]
pub struct MintSuccessExpectation {
    min_success_ratio: f64,
}

#[derive(Debug, Error)]
enum MintExpectationError {
    #[error("no mint submissions were recorded")]
    NoTraffic,
    #[error(
        "mint success ratio {observed:.3} below required {required:.3} ({failures}/{requests} failed)"
    )]
    LowSuccessRatio {
        observed: f64,
        required: f64,
        failures: u64,
        requests: u64,
    },
}

impl MintSuccessExpectation {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_success_ratio: MIN_MINT_SUCCESS_RATIO,
        }
    }

    #[must_use]
    pub const fn with_min_success_ratio(mut self, ratio: f64) -> Self {
        self.min_success_ratio = ratio;
        self
    }
}

impl Default for MintSuccessExpectation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Expectation for MintSuccessExpectation {
    fn name(&self) -> &str {
        "mint_inscription_success"
    }

    async fn evaluate(&self, report: &StatsReport) -> Result<(), DynError> {
        let channel = report
            .channel(MINT_LABEL)
            .filter(|channel| channel.requests > 0)
            .ok_or(MintExpectationError::NoTraffic)
            .map_err(DynError::from)?;

        let observed = channel.success_ratio();
        if observed < self.min_success_ratio {
            tracing::warn!(
                observed,
                required = self.min_success_ratio,
                failures = channel.failures,
                requests = channel.requests,
                "mint expectation missed"
            );
            return Err(MintExpectationError::LowSuccessRatio {
                observed,
                required: self.min_success_ratio,
                failures: channel.failures,
                requests: channel.requests,
            }
            .into());
        }

        tracing::info!(
            requests = channel.requests,
            observed,
            "mint expectation satisfied"
        );
        Ok(())
    }
}
