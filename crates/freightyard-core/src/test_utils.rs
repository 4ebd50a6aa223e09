//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::cargo::CargoType;
use crate::config::EngineConfig;
use crate::engine::{Transition, TransitionError};
use crate::event::{ChangeSink, StationChanged};
use crate::id::{JobId, StationId, Username};
use crate::job::JobType;
use crate::network::Network;
use crate::processor::{StationProcessor, blueprint};
use parking_lot::Mutex;

// ===========================================================================
// Sinks
// ===========================================================================

/// Records every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StationChanged>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StationChanged> {
        self.events.lock().clone()
    }

    pub fn stations(&self) -> Vec<StationId> {
        self.events.lock().iter().map(|e| e.station_id).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ChangeSink for RecordingSink {
    fn station_changed(&self, event: StationChanged) {
        self.events.lock().push(event);
    }
}

// ===========================================================================
// Identities
// ===========================================================================

pub fn username(name: &str) -> Username {
    Username::new(name).unwrap()
}

// ===========================================================================
// Network builders
// ===========================================================================

/// SW alone: Storage B-01 and C-04, Output C-01, with its Boards and Plywood
/// processors fed by Logs.
pub fn sawmill_network(seed: u64) -> Network {
    let mut net = Network::empty(EngineConfig::with_seed(seed));
    net.add_station(StationId::Sw, 2, 6);
    for output in [CargoType::Boards, CargoType::Plywood] {
        net.add_processor(
            StationId::Sw,
            StationProcessor::new(blueprint(&[(CargoType::Logs, 1)]), output, &[StationId::Gf]),
        );
    }
    net
}

/// Queue an unspawned ShuntingLoad at `station` bound for itself.
pub fn queue_load(net: &mut Network, station: StationId, cargo: CargoType, cars: u32) -> JobId {
    net.create_job(
        station,
        JobType::ShuntingLoad,
        station,
        cars,
        cargo,
        cargo.base_wage() * cars,
    )
}

// ===========================================================================
// Lifecycle helpers
// ===========================================================================

/// The first spawned, unclaimed job of `job_type` queued at `station`.
pub fn first_spawned(net: &Network, station: StationId, job_type: JobType) -> Option<JobId> {
    net.station(station)?
        .jobs()
        .iter()
        .find(|j| j.job_type() == job_type && j.is_spawned() && !j.is_reserved())
        .map(|j| j.id().clone())
}

/// Reserve, take and finish `id` as `user`; returns the finish transition.
pub fn run_job(net: &mut Network, user: &Username, id: &JobId) -> Result<Transition, TransitionError> {
    net.reserve(user, id)?;
    net.take(user, id)?;
    net.finish(user, id)
}
