//! Event ingestion pipeline.
//!
//! - `event` - Event envelope DTOs and validation
//! - `publish` - Payload classification and queue fan-out
//! - `source` - MQTT bus source feeding the pipeline

pub mod event;
pub mod publish;
pub mod source;

pub use event::*;
pub use publish::*;
pub use source::*;
