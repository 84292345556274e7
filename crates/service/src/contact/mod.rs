//! Contact module: three-layer architecture (domain, repository, service).
//!
//! Request parsing and the photo pipeline live in the service; persistence
//! sits behind `ContactRepository`.

pub mod domain;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::ContactService;
