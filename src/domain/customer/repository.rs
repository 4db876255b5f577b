//! Customer repository interface
//!
//! Transaction-scoped customer access goes through
//! [`LedgerTransaction`](crate::domain::LedgerTransaction) instead.

use async_trait::async_trait;

use super::model::Customer;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Customer>>;

    async fn save(&self, customer: Customer) -> DomainResult<()>;
}
