//! In-memory ledger for development and testing

mod ledger;

pub use ledger::{InMemoryLedger, InMemoryTransaction};
