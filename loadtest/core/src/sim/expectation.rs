use async_trait::async_trait;

use super::DynError;
use crate::stats::StatsReport;

#[async_trait]
/// Post-run check over the final stats report.
pub trait Expectation: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, report: &StatsReport) -> Result<(), DynError>;
}
