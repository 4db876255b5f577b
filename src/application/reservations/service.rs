use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, field, info, info_span, warn, Instrument};

use super::request::{ReservationRequest, ValidReservation};
use crate::application::availability::is_available;
use crate::application::customers::resolve_customer;
use crate::application::discount::DiscountEngine;
use crate::domain::{
    DiscountRequest, IsolationLevel, Reservation, ReservationOutcome, ReservationStatus,
    SharedLedger,
};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::TimeRange;

pub const BIKE_NOT_AVAILABLE: &str = "bike not available in requested time range";

/// Transactions tried per booking while the store keeps aborting them
/// because of concurrent ones.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy)]
pub struct ReservationSettings {
    pub isolation: IsolationLevel,
    /// Overall deadline for one `make_reservation` call
    pub request_timeout: Duration,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::Serializable,
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ReservationService {
    ledger: SharedLedger,
    discounts: Arc<DiscountEngine>,
    settings: ReservationSettings,
}

impl ReservationService {
    pub fn new(
        ledger: SharedLedger,
        discounts: Arc<DiscountEngine>,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            ledger,
            discounts,
            settings,
        }
    }

    /// Book a bike.
    ///
    /// `Ok(Rejected)` means the request was fine but the bike cannot be had;
    /// `Err` means the request was invalid or something broke. Nothing is
    /// persisted unless the result is `Ok(Approved)`.
    pub async fn make_reservation(
        &self,
        request: ReservationRequest,
    ) -> DomainResult<ReservationOutcome> {
        let result = match request.validate() {
            Ok(valid) => {
                let span = info_span!(
                    "make_reservation",
                    bike_id = %valid.bike_id,
                    reservation_id = field::Empty,
                    outcome = field::Empty,
                );
                let deadline = self.settings.request_timeout;
                let result = tokio::time::timeout(deadline, self.reserve(valid))
                    .instrument(span.clone())
                    .await
                    .unwrap_or(Err(DomainError::Timeout("making reservation")));
                if let Ok(outcome) = &result {
                    record_outcome(&span, outcome);
                }
                result
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => {
                metrics::counter!("reservations_total", "outcome" => outcome.label()).increment(1)
            }
            Err(e) => {
                metrics::counter!("reservation_errors_total", "kind" => e.kind()).increment(1);
                if !matches!(e, DomainError::Validation(_) | DomainError::NotFound { .. }) {
                    warn!(error = %e, "reservation failed");
                }
            }
        }
        result
    }

    /// A `Conflict` from the store becomes a rejection only when an approved
    /// overlap is really committed; otherwise the booking is retried and,
    /// once attempts run out, the conflict is returned as a retryable error.
    async fn reserve(&self, request: ValidReservation) -> DomainResult<ReservationOutcome> {
        let mut attempt = 1;
        loop {
            match self.reserve_in_transaction(&request).await {
                Err(DomainError::Conflict(reason)) => {
                    if self.overlap_committed(&request).await? {
                        info!(%reason, "concurrent booking won the race");
                        return Ok(ReservationOutcome::rejected(BIKE_NOT_AVAILABLE));
                    }
                    if attempt >= MAX_ATTEMPTS {
                        return Err(DomainError::Conflict(reason));
                    }
                    debug!(%reason, attempt, "store aborted the booking, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn overlap_committed(&self, request: &ValidReservation) -> DomainResult<bool> {
        let existing = self
            .ledger
            .reservations()
            .list_overlapping(&request.bike_id, &request.period)
            .await?;
        Ok(existing.iter().any(Reservation::is_approved))
    }

    async fn reserve_in_transaction(
        &self,
        request: &ValidReservation,
    ) -> DomainResult<ReservationOutcome> {
        let bike = match self.ledger.bikes().find_by_id(&request.bike_id).await? {
            Some(bike) => bike,
            None => {
                return Ok(ReservationOutcome::rejected(format!(
                    "bike {} not found",
                    request.bike_id
                )))
            }
        };

        // Dropping `tx` on any early return rolls it back.
        let mut tx = self.ledger.begin(self.settings.isolation).await?;
        tx.lock_bike(&bike.id).await?;

        if !is_available(tx.as_mut(), &bike.id, &request.period).await? {
            tx.rollback().await?;
            return Ok(ReservationOutcome::rejected(BIKE_NOT_AVAILABLE));
        }

        let customer = resolve_customer(tx.as_mut(), &request.customer).await?;

        let value = reservation_value(bike.price_per_hour, &request.period);
        let discount = self
            .discounts
            .calculate_discount(&DiscountRequest {
                customer: customer.clone(),
                bike: bike.clone(),
                location: request.location,
                reservation_value: value,
            })
            .await?;

        let reservation = Reservation::approved(
            &bike.id,
            &customer.id,
            request.period,
            value - discount.amount,
            discount.amount,
        );
        tx.insert_reservation(&reservation).await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            customer_id = %customer.id,
            total_value = reservation.total_value,
            applied_discount = discount.amount,
            "reservation approved"
        );

        Ok(ReservationOutcome::Approved {
            reservation,
            applied_discount: discount.amount,
        })
    }

    /// Idempotent: canceling a canceled reservation succeeds.
    pub async fn cancel_reservation(&self, id: &str) -> DomainResult<()> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("empty reservation id"));
        }
        let reservation = self.get_reservation(id).await?;
        if reservation.status == ReservationStatus::Canceled {
            return Ok(());
        }
        self.ledger
            .reservations()
            .update_status(id, ReservationStatus::Canceled)
            .await?;
        info!(reservation_id = %id, bike_id = %reservation.bike_id, "reservation canceled");
        Ok(())
    }

    pub async fn get_reservation(&self, id: &str) -> DomainResult<Reservation> {
        self.ledger
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
    }

    /// Whether `bike_id` is free over the whole window. Plain read, no locks.
    pub async fn get_availability(
        &self,
        bike_id: &str,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> DomainResult<bool> {
        let reservations = self.list_reservations(bike_id, start, end).await?;
        Ok(!reservations.iter().any(Reservation::is_approved))
    }

    /// Reservations of every status overlapping the window, by start time.
    pub async fn list_reservations(
        &self,
        bike_id: &str,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        if bike_id.trim().is_empty() {
            return Err(DomainError::validation("empty bike id"));
        }
        let period = TimeRange::new(start, end)?;
        self.ledger
            .reservations()
            .list_overlapping(bike_id, &period)
            .await
    }
}

/// Price for the period in cents: hourly price times the real-valued
/// number of hours, rounded to the nearest cent.
pub(super) fn reservation_value(price_per_hour: i64, period: &TimeRange) -> i64 {
    (price_per_hour as f64 * period.duration_hours()).round() as i64
}

fn record_outcome(span: &tracing::Span, outcome: &ReservationOutcome) {
    span.record("outcome", outcome.label());
    if let ReservationOutcome::Approved { reservation, .. } = outcome {
        span.record("reservation_id", reservation.id.as_str());
    }
}
