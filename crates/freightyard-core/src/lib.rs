//! Freightyard Core -- the job economy of a freight rail network.
//!
//! Stations produce, transform and consume cargo. Moving that cargo is
//! exposed as discrete jobs that users reserve, take and finish. This crate
//! holds the whole model: the cargo catalog, the static track registry, the
//! track allocator, station processors, the job lifecycle and the change
//! notifier.
//!
//! # Job lifecycle
//!
//! A job is created queued. Re-validation spawns it once a free origin and a
//! free destination track exist; a user then reserves it, takes it (claiming
//! the destination track) and finishes it. Finishing removes the job and runs
//! production at its destination, which usually creates follow-on jobs:
//!
//! ```text
//! ShuntingLoad --finish--> Freight --finish--> ShuntingUnload --finish--> processor
//!      ^                                                                      |
//!      +---------------------------- produced output -------------------------+
//! ```
//!
//! Every take and finish re-validates the whole network and reports the
//! stations whose listings may have changed.
//!
//! # Key Types
//!
//! - [`network::Network`] -- Owned world: stations, jobs, RNG, configuration.
//! - [`engine::JobBoard`] -- Mutex-guarded network with snapshot listings
//!   and change notification.
//! - [`allocator::TrackAllocator`] -- Occupancy queries over the live jobs.
//! - [`station::Station`] -- Job queue, processors, overflow buffer.
//! - [`processor::StationProcessor`] -- Blueprint-based batch production.
//! - [`event::ChangeNotifier`] -- Worker thread fanning out station changes.
//! - [`validation`] -- Invariant and production-graph checks.

pub mod allocator;
pub mod cargo;
pub mod config;
pub mod engine;
pub mod event;
pub mod id;
pub mod job;
pub mod network;
pub mod processor;
pub mod rng;
pub mod station;
pub mod topology;
pub mod track;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
