//! Shared request helpers.

pub mod validate;

pub use validate::ValidatedJson;
