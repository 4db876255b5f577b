use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as Span, TimeZone, Utc};
use futures_util::future::join_all;

use super::service::reservation_value;
use super::*;
use crate::application::discount::DiscountEngine;
use crate::domain::{
    Bike, BikeRepository, CustomerData, CustomerInput, CustomerRepository, IncidentProvider,
    IncidentsInfo, IncidentsRequest, IsolationLevel, Ledger, LedgerTransaction, Location,
    Reservation, ReservationOutcome, ReservationRepository, ReservationStatus, Weather,
    WeatherProvider,
};
use crate::infrastructure::memory::InMemoryLedger;
use crate::infrastructure::signals::{StaticIncidentProvider, StaticWeatherProvider};
use crate::shared::errors::{DomainError, DomainResult, ProviderError};
use crate::shared::time::TimeRange;

const WARSAW: Location = Location {
    lat: 52.23,
    long: 21.01,
};

struct FailingIncidents;

#[async_trait]
impl IncidentProvider for FailingIncidents {
    async fn get_incidents(
        &self,
        _: &IncidentsRequest,
    ) -> Result<Option<IncidentsInfo>, ProviderError> {
        Err(ProviderError::Unavailable {
            provider: "incidents",
            message: "connection reset".into(),
        })
    }
}

struct SlowWeather;

#[async_trait]
impl WeatherProvider for SlowWeather {
    async fn get_weather(&self, _: &Location) -> Result<Option<Weather>, ProviderError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(None)
    }
}

/// Aborts the first `aborts` transactions the way a busy store does.
struct ContendedLedger {
    inner: InMemoryLedger,
    aborts: AtomicU32,
}

#[async_trait]
impl Ledger for ContendedLedger {
    fn bikes(&self) -> &dyn BikeRepository {
        self.inner.bikes()
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self.inner.customers()
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self.inner.reservations()
    }

    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn LedgerTransaction>> {
        if self
            .aborts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DomainError::Conflict("database is locked".into()));
        }
        self.inner.begin(isolation).await
    }
}

fn contended(aborts: u32) -> (InMemoryLedger, ReservationService) {
    let inner = InMemoryLedger::new();
    let ledger = Arc::new(ContendedLedger {
        inner: inner.clone(),
        aborts: AtomicU32::new(aborts),
    });
    let engine = Arc::new(DiscountEngine::new(
        Arc::new(StaticWeatherProvider::default()),
        Arc::new(StaticIncidentProvider::default()),
    ));
    (inner, ReservationService::new(ledger, engine, ReservationSettings::default()))
}

struct Fixture {
    ledger: InMemoryLedger,
    service: Arc<ReservationService>,
}

fn fixture_with(
    weather: Arc<dyn WeatherProvider>,
    incidents: Arc<dyn IncidentProvider>,
    settings: ReservationSettings,
) -> Fixture {
    let ledger = InMemoryLedger::new();
    let engine = Arc::new(DiscountEngine::new(weather, incidents));
    let service = Arc::new(ReservationService::new(
        Arc::new(ledger.clone()),
        engine,
        settings,
    ));
    Fixture { ledger, service }
}

fn fixture() -> Fixture {
    fixture_with(
        Arc::new(StaticWeatherProvider::default()),
        Arc::new(StaticIncidentProvider::default()),
        ReservationSettings::default(),
    )
}

impl Fixture {
    async fn bike(&self, id: &str, weight_kg: f64, price_per_hour: i64) {
        self.ledger
            .bikes()
            .save(Bike {
                id: id.into(),
                model_name: format!("Model {id}"),
                weight_kg,
                price_per_hour,
            })
            .await
            .unwrap();
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 4, 12, hour, minute, 0).unwrap()
}

fn customer(customer_type: &str) -> CustomerInput {
    CustomerInput::new_customer(CustomerData {
        customer_type: customer_type.into(),
        first_name: "Marta".into(),
        surname: "Wisniewska".into(),
        email: "marta@example.com".into(),
    })
}

fn request(
    bike_id: &str,
    customer: CustomerInput,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ReservationRequest {
    ReservationRequest {
        bike_id: bike_id.into(),
        customer,
        location: Some(WARSAW),
        start_time: start,
        end_time: end,
    }
}

fn approved(outcome: ReservationOutcome) -> (crate::domain::Reservation, i64) {
    match outcome {
        ReservationOutcome::Approved {
            reservation,
            applied_discount,
        } => (reservation, applied_discount),
        ReservationOutcome::Rejected { reason } => panic!("expected approval, got rejection: {reason}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_requests_book_the_bike_once() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = Arc::clone(&f.service);
            // Every window contains 12:00-12:30, so all pairs overlap.
            let start = at(10, 0) + Span::minutes(i * 5);
            let end = at(12, 30) + Span::minutes(i * 5);
            tokio::spawn(async move {
                service
                    .make_reservation(request("b-1", customer("individual"), start, end))
                    .await
            })
        })
        .collect();

    let mut approvals = 0;
    let mut rejections = 0;
    for outcome in join_all(handles).await {
        match outcome.unwrap().unwrap() {
            ReservationOutcome::Approved { .. } => approvals += 1,
            ReservationOutcome::Rejected { reason } => {
                assert_eq!(reason, BIKE_NOT_AVAILABLE);
                rejections += 1;
            }
        }
    }

    assert_eq!(approvals, 1);
    assert_eq!(rejections, 15);
    assert_eq!(f.ledger.reservation_count(), 1);
    assert_eq!(f.ledger.open_transactions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_disjoint_requests_on_one_bike_all_succeed() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    let handles: Vec<_> = (0..12)
        .map(|hour| {
            let service = Arc::clone(&f.service);
            tokio::spawn(async move {
                service
                    .make_reservation(request(
                        "b-1",
                        customer("individual"),
                        at(hour, 0),
                        at(hour + 1, 0),
                    ))
                    .await
            })
        })
        .collect();

    for outcome in join_all(handles).await {
        assert!(outcome.unwrap().unwrap().is_approved());
    }
    assert_eq!(f.ledger.reservation_count(), 12);
}

#[tokio::test]
async fn store_contention_is_retried_not_rejected() {
    let (ledger, service) = contended(2);
    ledger
        .bikes()
        .save(Bike {
            id: "b-1".into(),
            model_name: "Gravel".into(),
            weight_kg: 12.0,
            price_per_hour: 1000,
        })
        .await
        .unwrap();

    let outcome = service
        .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap();
    assert!(outcome.is_approved());
    assert_eq!(ledger.reservation_count(), 1);
}

#[tokio::test]
async fn persistent_contention_is_a_retryable_error() {
    let (ledger, service) = contended(u32::MAX);
    ledger
        .bikes()
        .save(Bike {
            id: "b-1".into(),
            model_name: "Gravel".into(),
            weight_kg: 12.0,
            price_per_hour: 1000,
        })
        .await
        .unwrap();

    let err = service
        .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert!(err.is_transient());
    assert_eq!(ledger.reservation_count(), 0);
}

#[tokio::test]
async fn contention_over_a_taken_interval_is_a_rejection() {
    let (ledger, service) = contended(u32::MAX);
    ledger.seed_reservation(Reservation::approved(
        "b-1",
        "c-1",
        TimeRange::new(at(9, 0), at(11, 0)).unwrap(),
        2000,
        0,
    ));
    ledger
        .bikes()
        .save(Bike {
            id: "b-1".into(),
            model_name: "Gravel".into(),
            weight_kg: 12.0,
            price_per_hour: 1000,
        })
        .await
        .unwrap();

    let outcome = service
        .make_reservation(request("b-1", customer("individual"), at(10, 0), at(12, 0)))
        .await
        .unwrap();
    assert_eq!(outcome, ReservationOutcome::rejected(BIKE_NOT_AVAILABLE));
}

#[tokio::test]
async fn touching_reservations_both_succeed() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    let first = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(10, 0), at(11, 0)))
        .await
        .unwrap();
    let second = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(11, 0), at(12, 0)))
        .await
        .unwrap();
    let straddling = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(10, 30), at(11, 30)))
        .await
        .unwrap();

    assert!(first.is_approved());
    assert!(second.is_approved());
    assert_eq!(straddling, ReservationOutcome::rejected(BIKE_NOT_AVAILABLE));
    assert_eq!(f.ledger.reservation_count(), 2);
}

#[tokio::test]
async fn heavy_bike_discount_is_capped() {
    let f = fixture();
    f.bike("heavy", 50.0, 1000).await;

    let outcome = f
        .service
        .make_reservation(request("heavy", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let (reservation, discount) = approved(outcome);
    assert_eq!(discount, 200);
    assert_eq!(reservation.applied_discount, 200);
    assert_eq!(reservation.total_value, 800);
    assert_eq!(reservation.status, ReservationStatus::Approved);
}

#[tokio::test]
async fn business_discount_depends_on_value() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;
    f.bike("b-2", 12.0, 1000).await;

    let (large, large_discount) = approved(
        f.service
            .make_reservation(request("b-1", customer("business"), at(8, 0), at(18, 0)))
            .await
            .unwrap(),
    );
    let (small, small_discount) = approved(
        f.service
            .make_reservation(request("b-2", customer("business"), at(8, 0), at(11, 0)))
            .await
            .unwrap(),
    );

    assert_eq!(large_discount, 500);
    assert_eq!(large.total_value, 9_500);
    assert_eq!(small_discount, 0);
    assert_eq!(small.total_value, 3_000);
}

#[tokio::test]
async fn cold_weather_and_incidents_discount_individuals() {
    let f = fixture_with(
        Arc::new(StaticWeatherProvider::new(Some(4.0))),
        Arc::new(StaticIncidentProvider::new(Some(5))),
        ReservationSettings::default(),
    );
    f.bike("b-1", 16.0, 1000).await;

    let (reservation, discount) = approved(
        f.service
            .make_reservation(request("b-1", customer("individual"), at(9, 0), at(11, 0)))
            .await
            .unwrap(),
    );

    // weight 1% + cold 5% + incidents 10% of 2000
    assert_eq!(discount, 320);
    assert_eq!(reservation.total_value, 1_680);
}

#[tokio::test]
async fn cancellation_is_idempotent() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;
    let (reservation, _) = approved(
        f.service
            .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
            .await
            .unwrap(),
    );

    f.service.cancel_reservation(&reservation.id).await.unwrap();
    f.service.cancel_reservation(&reservation.id).await.unwrap();

    let stored = f.service.get_reservation(&reservation.id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Canceled);

    let err = f.service.cancel_reservation("does-not-exist").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Reservation", .. }));
}

#[tokio::test]
async fn canceled_interval_can_be_booked_again() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;
    let (reservation, _) = approved(
        f.service
            .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
            .await
            .unwrap(),
    );
    f.service.cancel_reservation(&reservation.id).await.unwrap();

    let again = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap();
    assert!(again.is_approved());

    let listed = f
        .service
        .list_reservations("b-1", at(8, 0), at(12, 0))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn invalid_interval_fails_without_touching_storage() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    for (start, end) in [(at(10, 0), at(10, 0)), (at(11, 0), at(10, 0))] {
        let err = f
            .service
            .make_reservation(request("b-1", customer("individual"), start, end))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    assert_eq!(f.ledger.customer_count(), 0);
    assert_eq!(f.ledger.reservation_count(), 0);
    assert_eq!(f.ledger.open_transactions(), 0);
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    let cases = [
        request("", customer("individual"), at(9, 0), at(10, 0)),
        request("b-1", customer("corporate"), at(9, 0), at(10, 0)),
        request("b-1", CustomerInput::default(), at(9, 0), at(10, 0)),
        ReservationRequest {
            location: None,
            ..request("b-1", customer("individual"), at(9, 0), at(10, 0))
        },
    ];
    for case in cases {
        let err = f.service.make_reservation(case).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");
    }
    assert_eq!(f.ledger.customer_count(), 0);
}

#[tokio::test]
async fn provider_failure_commits_nothing() {
    let f = fixture_with(
        Arc::new(StaticWeatherProvider::new(Some(20.0))),
        Arc::new(FailingIncidents),
        ReservationSettings::default(),
    );
    f.bike("b-1", 12.0, 1000).await;

    let err = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Infrastructure {
            context: "calculating discount",
            ..
        }
    ));
    assert_eq!(f.ledger.reservation_count(), 0);
    assert_eq!(f.ledger.customer_count(), 0);
    assert_eq!(f.ledger.open_transactions(), 0);
    assert!(f
        .service
        .get_availability("b-1", at(9, 0), at(10, 0))
        .await
        .unwrap());
}

#[tokio::test]
async fn deadline_aborts_and_rolls_back() {
    let f = fixture_with(
        Arc::new(SlowWeather),
        Arc::new(StaticIncidentProvider::default()),
        ReservationSettings {
            request_timeout: Duration::from_millis(50),
            ..ReservationSettings::default()
        },
    );
    f.bike("b-1", 12.0, 1000).await;

    let err = f
        .service
        .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Timeout(_)));
    assert_eq!(f.ledger.open_transactions(), 0);
    assert_eq!(f.ledger.customer_count(), 0);
}

#[tokio::test]
async fn unknown_bike_is_a_rejection() {
    let f = fixture();
    let outcome = f
        .service
        .make_reservation(request("ghost", customer("individual"), at(9, 0), at(10, 0)))
        .await
        .unwrap();

    assert!(matches!(outcome, ReservationOutcome::Rejected { ref reason } if reason.contains("ghost")));
    assert_eq!(f.ledger.open_transactions(), 0);
}

#[tokio::test]
async fn unknown_customer_id_is_not_found() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;

    let err = f
        .service
        .make_reservation(request(
            "b-1",
            CustomerInput::existing("nobody"),
            at(9, 0),
            at(10, 0),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound { entity: "Customer", .. }));
    assert_eq!(f.ledger.reservation_count(), 0);
}

#[tokio::test]
async fn existing_customer_is_reused() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;
    let (first, _) = approved(
        f.service
            .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
            .await
            .unwrap(),
    );

    let (second, _) = approved(
        f.service
            .make_reservation(request(
                "b-1",
                CustomerInput::existing(first.customer_id.clone()),
                at(13, 0),
                at(14, 0),
            ))
            .await
            .unwrap(),
    );

    assert_eq!(second.customer_id, first.customer_id);
    assert_eq!(f.ledger.customer_count(), 1);
}

#[tokio::test]
async fn availability_ignores_canceled_reservations() {
    let f = fixture();
    f.bike("b-1", 12.0, 1000).await;
    let (reservation, _) = approved(
        f.service
            .make_reservation(request("b-1", customer("individual"), at(9, 0), at(10, 0)))
            .await
            .unwrap(),
    );

    assert!(!f.service.get_availability("b-1", at(9, 30), at(11, 0)).await.unwrap());
    assert!(f.service.get_availability("b-1", at(10, 0), at(11, 0)).await.unwrap());

    f.service.cancel_reservation(&reservation.id).await.unwrap();
    assert!(f.service.get_availability("b-1", at(9, 30), at(11, 0)).await.unwrap());

    assert!(matches!(
        f.service.get_availability("b-1", at(11, 0), at(9, 0)).await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        f.service.list_reservations(" ", at(9, 0), at(11, 0)).await,
        Err(DomainError::Validation(_))
    ));
}

#[test]
fn value_uses_fractional_hours() {
    let ninety_minutes = TimeRange::new(at(9, 0), at(10, 30)).unwrap();
    assert_eq!(reservation_value(1000, &ninety_minutes), 1500);

    let twenty_minutes = TimeRange::new(at(9, 0), at(9, 20)).unwrap();
    assert_eq!(reservation_value(1000, &twenty_minutes), 333);
}

mod sea_orm_ledger {
    use std::path::PathBuf;

    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig, SeaOrmLedger};
    use sea_orm_migration::MigratorTrait;

    /// SQLite file removed (with its journal files) on drop.
    struct TempDb(PathBuf);

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm", "-journal"] {
                let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
            }
        }
    }

    /// Service over a file-backed SQLite database with a real pool, so
    /// transactions run on separate connections.
    async fn file_backed(bikes: usize) -> (TempDb, ReservationService) {
        let name = format!("bike-rental-{}.db", uuid::Uuid::new_v4());
        let file = TempDb(std::env::temp_dir().join(name));
        let config = DatabaseConfig {
            max_connections: 8,
            ..DatabaseConfig::sqlite(&file.0.to_string_lossy())
        };
        let db = init_database(&config).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let ledger = Arc::new(SeaOrmLedger::new(db));
        for i in 0..bikes {
            ledger
                .bikes()
                .save(Bike {
                    id: format!("b-{i}"),
                    model_name: "City".into(),
                    weight_kg: 14.0,
                    price_per_hour: 1000,
                })
                .await
                .unwrap();
        }
        let engine = Arc::new(DiscountEngine::new(
            Arc::new(StaticWeatherProvider::default()),
            Arc::new(StaticIncidentProvider::default()),
        ));
        let service = ReservationService::new(ledger, engine, ReservationSettings::default());
        (file, service)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_overlapping_requests_on_sqlite_book_once() {
        let (_file, service) = file_backed(1).await;
        let service = Arc::new(service);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                let start = at(10, 0) + Span::minutes(i * 5);
                let end = at(12, 30) + Span::minutes(i * 5);
                tokio::spawn(async move {
                    service
                        .make_reservation(request("b-0", customer("individual"), start, end))
                        .await
                })
            })
            .collect();

        let mut approvals = 0;
        for outcome in join_all(handles).await {
            match outcome.unwrap().unwrap() {
                ReservationOutcome::Approved { .. } => approvals += 1,
                ReservationOutcome::Rejected { reason } => assert_eq!(reason, BIKE_NOT_AVAILABLE),
            }
        }
        assert_eq!(approvals, 1);

        let stored = service.list_reservations("b-0", at(0, 0), at(23, 0)).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_requests_for_distinct_bikes_on_sqlite_all_succeed() {
        let (_file, service) = file_backed(30).await;
        let service = Arc::new(service);

        let handles: Vec<_> = (0..30)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .make_reservation(request(
                            &format!("b-{i}"),
                            customer("individual"),
                            at(10, 0),
                            at(11, 0),
                        ))
                        .await
                })
            })
            .collect();

        for outcome in join_all(handles).await {
            let outcome = outcome.unwrap().unwrap();
            assert!(outcome.is_approved(), "got {outcome:?}");
        }
        for i in 0..30 {
            assert!(!service
                .get_availability(&format!("b-{i}"), at(10, 0), at(11, 0))
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn books_and_cancels_against_sqlite() {
        let db = init_database(&DatabaseConfig::sqlite_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let ledger = Arc::new(SeaOrmLedger::new(db));
        ledger
            .bikes()
            .save(Bike {
                id: "b-1".into(),
                model_name: "Tandem".into(),
                weight_kg: 25.0,
                price_per_hour: 1000,
            })
            .await
            .unwrap();

        let engine = Arc::new(DiscountEngine::new(
            Arc::new(StaticWeatherProvider::default()),
            Arc::new(StaticIncidentProvider::default()),
        ));
        let service = ReservationService::new(ledger.clone(), engine, ReservationSettings::default());

        let (reservation, discount) = approved(
            service
                .make_reservation(request("b-1", customer("individual"), at(10, 0), at(11, 0)))
                .await
                .unwrap(),
        );
        assert_eq!(discount, 100);
        assert_eq!(reservation.total_value, 900);

        let clash = service
            .make_reservation(request("b-1", customer("individual"), at(10, 30), at(11, 30)))
            .await
            .unwrap();
        assert_eq!(clash, ReservationOutcome::rejected(BIKE_NOT_AVAILABLE));

        let next = service
            .make_reservation(request("b-1", customer("individual"), at(11, 0), at(12, 0)))
            .await
            .unwrap();
        assert!(next.is_approved());

        service.cancel_reservation(&reservation.id).await.unwrap();
        service.cancel_reservation(&reservation.id).await.unwrap();
        assert!(service.get_availability("b-1", at(10, 0), at(11, 0)).await.unwrap());
    }
}
