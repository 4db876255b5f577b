use thiserror::Error;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    /// The store refused a write because a concurrent transaction got there first.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{context}: {source}")]
    Infrastructure {
        context: &'static str,
        #[source]
        source: InfraError,
    },

    #[error("Deadline exceeded while {0}")]
    Timeout(&'static str),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap an infrastructure failure with the step it happened in.
    ///
    /// ```ignore
    /// repo.find_by_id(id).await.map_err(DomainError::infra("fetching bike"))?;
    /// ```
    pub fn infra<E>(context: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<InfraError>,
    {
        move |err| Self::Infrastructure {
            context,
            source: err.into(),
        }
    }

    /// Whether this error is likely transient and the operation may succeed
    /// if retried with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Infrastructure { .. } | Self::Timeout(_) | Self::Conflict(_)
        )
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Infrastructure { .. } => "infrastructure",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Failure of an external signal provider (weather, incident history).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} responded with status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} did not answer within {timeout_ms} ms")]
    Timeout { provider: &'static str, timeout_ms: u64 },

    #[error("{provider} unavailable: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
    },
}
