//! Persistence for the ledger chain. Backends implement
//! [`ledger_core::ChainStore`] so the core stays free of storage engines.

pub mod sled_store;

pub use sled_store::SledStore;
