//! SeaORM-backed queries used by the repository implementations.

pub mod contact_store;
