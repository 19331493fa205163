/// multipush - best-effort notification fan-out
///
/// This library delivers one title and body over email and a fixed set of
/// push, webhook and bot services, attempting every channel once and
/// reporting a per-channel outcome without letting one failure block another.
pub mod notification;

pub mod cli;
pub mod config;
pub mod core;
pub mod formatting;

// Re-export core types for convenience
pub use crate::core::*;

pub use notification::{Channel, ChannelRegistry, Dispatcher, NotifyError};
