#![deny(clippy::all, clippy::pedantic)]
// Module naming: common pattern in domain-driven code
#![allow(clippy::module_name_repetitions)]
// Function complexity: some handlers are inherently long
#![allow(clippy::too_many_lines)]
// Documentation style: many terms don't need backticks
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// API ergonomics: prefer simplicity over must_use annotations
#![allow(clippy::must_use_candidate)]
// Format strings: allow non-inlined for readability
#![allow(clippy::uninlined_format_args)]
// Passing style
#![allow(clippy::needless_pass_by_value)]
// Struct field patterns
#![allow(clippy::struct_excessive_bools)]
// Numeric casts: intentional at config boundaries
#![allow(clippy::cast_possible_truncation)]

//! Fanout - topic fan-out gateway bridging a pub/sub message bus to
//! Server-Sent Events clients.
//!
//! # Module Organization
//!
//! ## Core
//! - `core::config` - Configuration parsing and validation
//! - `core::runtime` - Runtime orchestration and shutdown fan-out
//!
//! ## Subscription management
//! - `submgr::token` - URI-safe random subscription identifiers
//! - `submgr::subscription` - Per-subscriber record and delivery queue
//! - `submgr::manager` - Registry, prefix matching, coalescence, idle sweeper
//!
//! ## Event pipeline
//! - `pipeline::event` - Event envelope validation
//! - `pipeline::publish` - Payload classification and queue fan-out
//! - `pipeline::source` - MQTT bus source feeding the pipeline
//!
//! ## HTTP surface
//! - `web::api` - Subscription management endpoints
//! - `web::events` - SSE streaming endpoint (dedicated listener)
//!
//! ## Operations
//! - `telemetry` - Structured logging setup
//! - `cli` - Command-line interface

// Core infrastructure
pub mod core;

// Subscription manager
pub mod submgr;

// Event pipeline
pub mod pipeline;

// HTTP surface
pub mod web;

// Operations
pub mod telemetry;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, runtime};
pub use pipeline::{event, publish, source};
pub use submgr::{manager, subscription, token};
pub use web::{api, events};
