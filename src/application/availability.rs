//! Availability checker, run inside the orchestrator's transaction.

use crate::domain::LedgerTransaction;
use crate::shared::errors::DomainResult;
use crate::shared::time::TimeRange;

/// `false` iff an approved reservation on `bike_id` overlaps `period`.
///
/// The answer only stays true until commit if the transaction was opened
/// with an isolation level that makes this read part of its conflict set.
pub async fn is_available(
    tx: &mut dyn LedgerTransaction,
    bike_id: &str,
    period: &TimeRange,
) -> DomainResult<bool> {
    let taken = tx.has_overlap(bike_id, period).await?;
    Ok(!taken)
}
