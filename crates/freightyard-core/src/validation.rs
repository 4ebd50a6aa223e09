//! Consistency checks over a [`Network`].
//!
//! [`check_invariants`] inspects live job state; [`supply_gaps`] inspects the
//! static production graph. Both return findings rather than failing, so
//! callers decide what is fatal.

use crate::cargo::CargoType;
use crate::id::{JobId, StationId};
use crate::network::Network;
use crate::track::Track;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Job invariants
// ---------------------------------------------------------------------------

/// A broken job-state invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// More than one job holds the same track.
    DoubleOccupancy { track: Track, jobs: Vec<JobId> },
    /// A job holds or proposes a track of the wrong station or class.
    MisplacedTrack { job: JobId, track: Track },
    /// A job is queued at a station other than its origin.
    WrongQueue { job: JobId, queued_at: StationId },
    /// A job carries more cars than the configured ceiling.
    OverCeiling { job: JobId, car_count: u32, ceiling: u32 },
    /// An active job without an origin track.
    ActiveWithoutOrigin { job: JobId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DoubleOccupancy { track, jobs } => {
                let ids: Vec<&str> = jobs.iter().map(JobId::as_str).collect();
                write!(f, "track {track} held by {}", ids.join(", "))
            }
            Violation::MisplacedTrack { job, track } => {
                write!(f, "job {job} assigned unsuitable track {track}")
            }
            Violation::WrongQueue { job, queued_at } => {
                write!(f, "job {job} queued at {queued_at}, not its origin")
            }
            Violation::OverCeiling {
                job,
                car_count,
                ceiling,
            } => write!(f, "job {job} has {car_count} cars (ceiling {ceiling})"),
            Violation::ActiveWithoutOrigin { job } => {
                write!(f, "job {job} is active without an origin track")
            }
        }
    }
}

pub fn check_invariants(network: &Network) -> Vec<Violation> {
    let ceiling = network.config().max_cars_per_job;
    let mut violations = Vec::new();
    let mut holders: BTreeMap<Track, Vec<JobId>> = BTreeMap::new();

    for station in network.stations() {
        for job in station.jobs() {
            let id = job.id();
            let job_type = job.job_type();

            if job.origin() != station.id() {
                violations.push(Violation::WrongQueue {
                    job: id.clone(),
                    queued_at: station.id(),
                });
            }
            if job.car_count() > ceiling {
                violations.push(Violation::OverCeiling {
                    job: id.clone(),
                    car_count: job.car_count(),
                    ceiling,
                });
            }
            if job.is_active() && !job.is_spawned() {
                violations.push(Violation::ActiveWithoutOrigin { job: id.clone() });
            }

            if let Some(track) = job
                .origin_track()
                .filter(|t| t.station != job.origin() || t.class != job_type.origin_class())
            {
                violations.push(Violation::MisplacedTrack {
                    job: id.clone(),
                    track,
                });
            }
            if let Some(track) = job.target_track().filter(|t| {
                t.station != job.destination() || t.class != job_type.destination_class()
            }) {
                violations.push(Violation::MisplacedTrack {
                    job: id.clone(),
                    track,
                });
            }

            for track in job.occupied_tracks() {
                holders.entry(track).or_default().push(id.clone());
            }
        }
    }

    for (track, jobs) in holders {
        if jobs.len() > 1 {
            violations.push(Violation::DoubleOccupancy { track, jobs });
        }
    }
    violations
}

// ---------------------------------------------------------------------------
// Production graph
// ---------------------------------------------------------------------------

/// An input some processor needs that no station ever ships to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyGap {
    pub station: StationId,
    pub cargo: CargoType,
}

impl fmt::Display for SupplyGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} needs {} but nothing ships it there", self.station, self.cargo)
    }
}

/// Every processor input must be the output of some processor that routes
/// to that station.
pub fn supply_gaps(network: &Network) -> Vec<SupplyGap> {
    let supplied = |station: StationId, cargo: CargoType| {
        network.stations().any(|s| {
            s.processors()
                .iter()
                .any(|p| p.output() == cargo && p.destinations().contains(&station))
        })
    };

    let mut gaps = Vec::new();
    for station in network.stations() {
        for processor in station.processors() {
            for cargo in processor.inputs() {
                let gap = SupplyGap {
                    station: station.id(),
                    cargo,
                };
                if !supplied(station.id(), cargo) && !gaps.contains(&gap) {
                    gaps.push(gap);
                }
            }
        }
    }
    gaps
}
