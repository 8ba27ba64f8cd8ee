//! Host-facing update delivery: sinks, fan-out, and subscriber streams.
//!
//! The runtime produces a single ordered sequence of [`Update`]s
//! (per-node actions, error reports, board lifecycle notices). This module
//! carries that sequence out of the process: an [`UpdateBus`] fans every
//! update out to configured [`UpdateSink`]s (newline-delimited JSON on
//! stdout by default) and to any number of in-process [`UpdateStream`]
//! subscribers.
//!
//! [`Update`]: crate::protocol::Update

pub mod bus;
pub mod sink;
pub mod stream;

pub use bus::UpdateBus;
pub use sink::{ChannelSink, MemorySink, StdOutSink, UpdateSink};
pub use stream::UpdateStream;
