//! Subscription management.
//!
//! A subscription is identified by a randomly-generated string. It carries
//! an include list, an exclude list, and a bounded delivery queue. Topic
//! strings that begin with something in the include list, and don't begin
//! with something in the exclude list, match the subscription.
//!
//! - `token` - URI-safe random identifiers
//! - `subscription` - Per-subscriber record and queue endpoints
//! - `manager` - Registry, prefix matching, coalescence, idle sweeper

pub mod manager;
pub mod subscription;
pub mod token;

pub use manager::*;
pub use subscription::*;
pub use token::*;
