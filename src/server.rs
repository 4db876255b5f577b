//! Server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: storage, migrations, signal
//! providers, services, the REST API and graceful shutdown. The binaries
//! only parse arguments and call into it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{BikeService, DiscountEngine, ReservationService, ReservationSettings};
use crate::config::{AppConfig, SignalsConfig};
use crate::domain::{IncidentProvider, SharedLedger, WeatherProvider};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    init_database, HttpIncidentProvider, HttpWeatherProvider, InMemoryLedger, SeaOrmLedger,
    StaticIncidentProvider, StaticWeatherProvider,
};
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::{create_api_router, ApiServices};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running service.
pub struct ServerHandle {
    pub config: AppConfig,
    /// Address the REST API is bound to; differs from the configured one
    /// when port 0 was requested.
    pub local_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        config.validate()?;
        info!("Starting bike rental service...");

        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        let (ledger, db): (SharedLedger, Option<DatabaseConnection>) =
            match config.database.database_config() {
                Some(db_config) => {
                    let db = init_database(&db_config).await?;
                    if opts.auto_migrate {
                        info!("Running database migrations...");
                        Migrator::up(&db, None).await?;
                        info!("Migrations completed");
                    }
                    (Arc::new(SeaOrmLedger::new(db.clone())), Some(db))
                }
                None => {
                    warn!("Using the in-memory ledger; nothing survives a restart");
                    (Arc::new(InMemoryLedger::new()), None)
                }
            };

        // ── Services ───────────────────────────────────────────
        let (weather, incidents) = signal_providers(&config.signals)?;
        let discounts = Arc::new(
            DiscountEngine::new(weather, incidents).with_provider_timeout(config.signals.timeout()),
        );
        let settings = ReservationSettings {
            isolation: config.reservations.isolation_level()?,
            request_timeout: config.reservations.request_timeout(),
        };
        info!(
            isolation = ?settings.isolation,
            timeout_ms = config.reservations.request_timeout_ms,
            "Reservation settings"
        );

        let router = create_api_router(ApiServices {
            bikes: Arc::new(BikeService::new(ledger.clone())),
            reservations: Arc::new(ReservationService::new(ledger, discounts, settings)),
            health: HealthState::new(db.clone()),
            metrics: Some(prometheus),
        });

        // ── REST API ───────────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let listener = tokio::net::TcpListener::bind(config.api_address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown.signal();
        let api_task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    api_shutdown.wait().await;
                    info!("REST API server received shutdown signal");
                })
                .await;
            if let Err(e) = served {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            config,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT/SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Wait for the API to drain after shutdown was triggered, then close
    /// the database.
    pub async fn wait(self) {
        match tokio::time::timeout(self.shutdown.timeout(), self.api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => warn!(
                "REST API server did not stop within {}s",
                self.shutdown.timeout().as_secs()
            ),
        }

        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }
        info!("Bike rental service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down bike rental service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can be installed once per process; later starts
/// reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, BuildError> {
    static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);
    let mut slot = HANDLE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics recorder installed");
    *slot = Some(handle.clone());
    Ok(handle)
}

fn signal_providers(
    config: &SignalsConfig,
) -> Result<(Arc<dyn WeatherProvider>, Arc<dyn IncidentProvider>), reqwest::Error> {
    let weather: Arc<dyn WeatherProvider> = match &config.weather_url {
        Some(url) => {
            info!("Weather provider: {}", url);
            Arc::new(HttpWeatherProvider::new(url, config.timeout())?)
        }
        None => {
            info!("Weather provider: fixed ({:?} °C)", config.default_temperature);
            Arc::new(StaticWeatherProvider::new(config.default_temperature))
        }
    };
    let incidents: Arc<dyn IncidentProvider> = match &config.incidents_url {
        Some(url) => {
            info!("Incident provider: {}", url);
            Arc::new(HttpIncidentProvider::new(url, config.timeout())?)
        }
        None => {
            info!("Incident provider: fixed ({:?} incidents)", config.default_incidents);
            Arc::new(StaticIncidentProvider::new(config.default_incidents))
        }
    };
    Ok((weather, incidents))
}

/// Install the global subscriber. Call once, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}
