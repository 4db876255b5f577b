//! SeaORM implementation of CustomerRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Set};

use crate::domain::customer::{Customer, CustomerProfile, CustomerRepository, CustomerType};
use crate::domain::DomainResult;
use crate::infrastructure::database::db_err;
use crate::infrastructure::database::entities::customer;

pub struct SeaOrmCustomerRepository {
    db: DatabaseConnection,
}

impl SeaOrmCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn model_to_domain(m: customer::Model) -> DomainResult<Customer> {
    Ok(Customer {
        id: m.id,
        customer_type: m.customer_type.parse::<CustomerType>()?,
        first_name: m.first_name,
        surname: m.surname,
        email: m.email,
    })
}

pub(crate) async fn find<C: ConnectionTrait>(conn: &C, id: &str) -> DomainResult<Option<Customer>> {
    customer::Entity::find_by_id(id.to_string())
        .one(conn)
        .await
        .map_err(db_err("resolving customer"))?
        .map(model_to_domain)
        .transpose()
}

/// Insert a customer; used both directly and inside a ledger transaction.
pub(crate) async fn insert<C: ConnectionTrait>(
    conn: &C,
    id: String,
    profile: &CustomerProfile,
) -> DomainResult<()> {
    let model = customer::ActiveModel {
        id: Set(id),
        customer_type: Set(profile.customer_type.as_str().to_string()),
        first_name: Set(profile.first_name.clone()),
        surname: Set(profile.surname.clone()),
        email: Set(profile.email.clone()),
        created_at: Set(Utc::now()),
    };
    customer::Entity::insert(model)
        .exec_without_returning(conn)
        .await
        .map_err(db_err("creating customer"))?;
    Ok(())
}

#[async_trait]
impl CustomerRepository for SeaOrmCustomerRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Customer>> {
        find(&self.db, id).await
    }

    async fn save(&self, c: Customer) -> DomainResult<()> {
        let profile = CustomerProfile {
            customer_type: c.customer_type,
            first_name: c.first_name,
            surname: c.surname,
            email: c.email,
        };
        insert(&self.db, c.id, &profile).await
    }
}
