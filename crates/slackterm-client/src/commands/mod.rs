//! Background operations started by the presentation layer.
//!
//! Each `spawn_*` function runs one service call on its own tokio task and
//! reports the outcome as a [`ClientEvent`](crate::events::ClientEvent), so
//! the caller never waits on the network.

pub mod channels;
pub mod messaging;
