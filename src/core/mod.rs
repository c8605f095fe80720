//! Core library: the template engine and its error type.

pub mod error;
pub mod templates;

pub use error::Error;
