//! Service layer for the contact book, on top of `models`.
//! - Separates business logic from data access.
//! - Owns the photo pipeline (resize, re-encode, upload) and CSV export.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod contact;
pub mod db;
pub mod export;
pub mod imaging;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
