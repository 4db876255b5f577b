pub mod entities;
pub mod ledger;
pub mod migrator;
pub mod repositories;

pub use ledger::{SeaOrmLedger, SeaOrmTransaction};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, RuntimeErr};
use tracing::info;

use crate::shared::errors::DomainError;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./bike-rental.db?mode=rwc")
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./bike-rental.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            ..Self::default()
        }
    }

    /// Private in-memory SQLite database. One connection, so every query
    /// sees the same database.
    pub fn sqlite_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database: {}", redact(&config.url));
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Hide the password part of a connection URL.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            let credentials = &url[scheme + 3..at];
            match credentials.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme + 3],
                    &credentials[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

/// SQLSTATE / SQLite result codes meaning "a concurrent transaction got
/// there first": serialization failure, deadlock, exclusion violation,
/// and SQLite busy/locked.
const CONFLICT_CODES: &[&str] = &["40001", "40P01", "23P01", "5", "6", "261", "262", "517"];

pub(crate) fn is_conflict(err: &DbErr) -> bool {
    let runtime: &sea_orm::sqlx::Error = match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => e,
        _ => return false,
    };
    match runtime {
        sea_orm::sqlx::Error::Database(db) => db
            .code()
            .map(|code| CONFLICT_CODES.iter().any(|c| code == *c))
            .unwrap_or(false),
        _ => false,
    }
}

/// Map a database error to a domain error, tagging it with the step it
/// happened in. Concurrency failures become `Conflict`, which does not say
/// whether the bike is taken; the booking pipeline re-reads to find out.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(DbErr) -> DomainError {
    move |err| {
        if is_conflict(&err) {
            DomainError::Conflict(format!("{context}: {err}"))
        } else {
            DomainError::infra(context)(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_password_only() {
        assert_eq!(
            redact("postgres://rental:secret@db:5432/rental"),
            "postgres://rental:***@db:5432/rental"
        );
        assert_eq!(redact("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            redact("sqlite://./bike-rental.db?mode=rwc"),
            "sqlite://./bike-rental.db?mode=rwc"
        );
    }

    #[test]
    fn plain_errors_are_not_conflicts() {
        let err = db_err("fetching bike")(DbErr::RecordNotFound("b-1".into()));
        assert!(matches!(
            err,
            DomainError::Infrastructure {
                context: "fetching bike",
                ..
            }
        ));
    }
}
