//! Client for a remote document classification service speaking the
//! JSON 1.1 protocol (`X-Amz-Target` dispatch).

pub mod client;
pub mod error;
pub mod types;

pub use client::ComprehendClient;
pub use error::{ApiError, ComprehendError};
