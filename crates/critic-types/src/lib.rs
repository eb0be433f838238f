//! Typed form payloads for every POST endpoint and the rules that turn them
//! into validated inputs for the stores.

pub mod error;
pub mod forms;

pub use error::ValidationError;
