//! Customer domain entity and the raw customer input of a reservation request

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Individual,
    Business,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
        }
    }
}

impl FromStr for CustomerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "business" => Ok(Self::Business),
            other => Err(DomainError::validation(format!(
                "unknown customer type '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub customer_type: CustomerType,
    pub first_name: String,
    pub surname: String,
    pub email: String,
}

/// Validated customer data without identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_type: CustomerType,
    pub first_name: String,
    pub surname: String,
    pub email: String,
}

impl CustomerProfile {
    pub fn into_customer(self, id: impl Into<String>) -> Customer {
        Customer {
            id: id.into(),
            customer_type: self.customer_type,
            first_name: self.first_name,
            surname: self.surname,
            email: self.email,
        }
    }
}

/// Who the reservation is for, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    Existing(String),
    New(CustomerProfile),
}

/// Raw customer data as it arrives with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerData {
    pub customer_type: String,
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    pub email: String,
}

/// Either a reference to an existing customer or inline profile data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub id: Option<String>,
    pub data: Option<CustomerData>,
}

impl CustomerInput {
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            data: None,
        }
    }

    pub fn new_customer(data: CustomerData) -> Self {
        Self {
            id: None,
            data: Some(data),
        }
    }

    /// An id wins over inline data; without an id the profile must be complete.
    pub fn validate(&self) -> DomainResult<CustomerRef> {
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(CustomerRef::Existing(id.to_string()));
        }

        let data = self
            .data
            .as_ref()
            .ok_or_else(|| DomainError::validation("customer id or customer data must be set"))?;

        let customer_type = data.customer_type.parse::<CustomerType>()?;
        if data.first_name.trim().is_empty() {
            return Err(DomainError::validation("empty customer first name"));
        }
        let email = data.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("empty customer email"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(format!("invalid customer email '{email}'")));
        }

        Ok(CustomerRef::New(CustomerProfile {
            customer_type,
            first_name: data.first_name.trim().to_string(),
            surname: data.surname.trim().to_string(),
            email: email.to_string(),
        }))
    }
}
