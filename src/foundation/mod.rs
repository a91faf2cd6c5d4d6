//! Shared value types, the error taxonomy and the event channel.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod events;
