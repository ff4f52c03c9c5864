//! Axum integration for the academic gate services.
//!
//! Handlers stay thin: they extract the caller's credential and a correlation
//! id, build an action, hand it to a [`Store`](academic_gate_runtime::Store)
//! and map the terminal action to a response. Everything in this crate is
//! domain-agnostic.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the bearer credential and correlation id
//! 3. **Build Action** from the request body
//! 4. **Dispatch** through the store and wait for the terminal action
//! 5. **Map** the outcome to a JSON body or an [`AppError`]

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
