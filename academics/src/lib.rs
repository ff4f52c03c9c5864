//! Academic eligibility orchestrator.
//!
//! Exam registration, graduation registration and course-load (KRS)
//! submission are only valid when several independently-owned services agree
//! that the student qualifies. This crate sequences those checks, applies a
//! fail-closed policy, and commits the local record only when every gate
//! passes.
//!
//! # Architecture
//!
//! ```text
//!  HTTP request
//!      │  BearerToken → access::CredentialVerifier → AccessContext
//!      ▼
//!  orchestrator::Orchestrator ──send + reply slot──▶ Store<TransactionReducer>
//!                                                        │
//!              ┌─────────────────────────────────────────┤ Effect::Future per step
//!              ▼                     ▼                   ▼
//!     remote::TuitionLookup  remote::StandingLookup  remote::ClearanceLookup
//!              │                     │                   │
//!              └──────── rules (pure gates) ◀────────────┘
//!                                    │ all gates passed
//!                                    ▼
//!                         records::RecordStore (commit)
//! ```
//!
//! Every gate is evaluated in a fixed order and the first denial wins.
//! Missing or unreachable remote data is a denial, never a pass.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod api;
pub mod app;
pub mod config;
pub mod metrics;
pub mod mocks;
pub mod orchestrator;
pub mod queries;
pub mod records;
pub mod remote;
pub mod rules;
pub mod server;
pub mod types;

pub use app::AcademicsApp;
pub use config::Config;
pub use orchestrator::{Orchestrator, Outcome};
pub use types::*;
