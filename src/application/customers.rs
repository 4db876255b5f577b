//! Customer resolver, run inside the orchestrator's transaction.

use crate::domain::{Customer, CustomerRef, LedgerTransaction};
use crate::shared::errors::{DomainError, DomainResult};

/// Look up an existing customer or create one from inline profile data.
/// Never deduplicates by email.
pub async fn resolve_customer(
    tx: &mut dyn LedgerTransaction,
    customer: &CustomerRef,
) -> DomainResult<Customer> {
    match customer {
        CustomerRef::Existing(id) => tx
            .find_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", "id", id.as_str())),
        CustomerRef::New(profile) => {
            let id = tx.create_customer(profile).await?;
            Ok(profile.clone().into_customer(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerProfile, CustomerType, IsolationLevel, Ledger};
    use crate::infrastructure::memory::InMemoryLedger;

    fn profile(email: &str) -> CustomerProfile {
        CustomerProfile {
            customer_type: CustomerType::Individual,
            first_name: "Anna".into(),
            surname: "Zielinska".into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn inline_profile_creates_customer_on_commit() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();

        let customer = resolve_customer(tx.as_mut(), &CustomerRef::New(profile("anna@example.com")))
            .await
            .unwrap();
        assert!(!customer.id.is_empty());
        assert_eq!(ledger.customer_count(), 0);

        tx.commit().await.unwrap();
        let stored = ledger.customers().find_by_id(&customer.id).await.unwrap();
        assert_eq!(stored, Some(customer));
    }

    #[tokio::test]
    async fn same_email_creates_two_customers() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        let new = CustomerRef::New(profile("dup@example.com"));

        let first = resolve_customer(tx.as_mut(), &new).await.unwrap();
        let second = resolve_customer(tx.as_mut(), &new).await.unwrap();
        tx.commit().await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(ledger.customer_count(), 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();

        let err = resolve_customer(tx.as_mut(), &CustomerRef::Existing("missing".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Customer", .. }));
    }

    #[tokio::test]
    async fn existing_id_resolves_stored_customer() {
        let ledger = InMemoryLedger::new();
        let stored = profile("known@example.com").into_customer("c-7");
        ledger.customers().save(stored.clone()).await.unwrap();
        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();

        let resolved = resolve_customer(tx.as_mut(), &CustomerRef::Existing("c-7".into()))
            .await
            .unwrap();
        assert_eq!(resolved, stored);
    }
}
