//! Accurate walking routes: client, cache and sequential fetch worker.
//!
//! The routing API is the slowest and most rate-limited collaborator, so
//! everything around it is built to call it as little as possible: routes
//! are cached by rounded endpoint pair, requests are queued and processed
//! one at a time with a delay between calls, and a rate-limit signal
//! fails the rest of the batch rather than retrying into the limit.

mod cache;
mod client;
mod error;
mod sequencer;

pub use cache::RouteCache;
pub use client::{RoutingClient, RoutingConfig, RoutingProvider};
pub use error::RoutingError;
pub use sequencer::{
    FailureKind, RouteRequest, RouteSequencer, RouteStatus, SequencerConfig,
};
