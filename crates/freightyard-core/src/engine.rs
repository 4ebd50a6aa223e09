//! Job lifecycle operations and the shared job board.
//!
//! [`Network`] gains `reserve`, `take` and `finish`; each checks its
//! preconditions, mutates one job and, for take and finish, re-validates the
//! whole network. [`JobBoard`] serializes those calls behind one mutex,
//! publishes per-station listing snapshots for lock-free reads and forwards
//! affected stations to a [`ChangeSink`].

use crate::allocator::TrackAllocator;
use crate::config::EngineConfig;
use crate::event::{ChangeSink, StationChanged};
use crate::id::{JobId, StationId, Username};
use crate::job::Job;
use crate::network::{Network, Revalidation};
use crate::station::StationSummary;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// A lifecycle operation whose preconditions were not met. Always
/// recoverable; the caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("job {job} not found")]
    JobNotFound { job: JobId },
    #[error("job {job} is already reserved by {by}")]
    AlreadyReserved { job: JobId, by: Username },
    #[error("job {job} is already active")]
    AlreadyActive { job: JobId },
    #[error("job {job} is not reserved by {user}")]
    NotReservedBy { job: JobId, user: Username },
    #[error("job {job} is not active")]
    NotActive { job: JobId },
    #[error("job {job} is not assigned to {user}")]
    NotAssignedTo { job: JobId, user: Username },
    #[error("job {job} has no tracks yet")]
    NotSpawned { job: JobId },
    #[error("no free destination track for job {job}")]
    NoDestinationTrack { job: JobId },
}

/// Jobs and stations affected by a take or finish.
///
/// Job lists hold snapshots taken right after the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub despawned: Vec<Job>,
    pub spawned: Vec<Job>,
    /// Jobs whose track assignment or car count changed.
    pub changed: Vec<Job>,
    /// Follow-on jobs created by production.
    pub created: Vec<Job>,
    /// Stations whose listings may have changed, sorted.
    pub notified: Vec<StationId>,
}

impl Transition {
    fn ids(jobs: &[Job]) -> Vec<&JobId> {
        jobs.iter().map(Job::id).collect()
    }

    pub fn despawned_ids(&self) -> Vec<&JobId> {
        Self::ids(&self.despawned)
    }

    pub fn spawned_ids(&self) -> Vec<&JobId> {
        Self::ids(&self.spawned)
    }

    pub fn changed_ids(&self) -> Vec<&JobId> {
        Self::ids(&self.changed)
    }

    pub fn created_ids(&self) -> Vec<&JobId> {
        Self::ids(&self.created)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

impl Network {
    /// Claim an open job for `user`. Does not re-validate.
    pub fn reserve(&mut self, user: &Username, id: &JobId) -> Result<Job, TransitionError> {
        let job = self
            .job_mut(id)
            .ok_or_else(|| TransitionError::JobNotFound { job: id.clone() })?;
        if job.is_active() {
            return Err(TransitionError::AlreadyActive { job: id.clone() });
        }
        if let Some(by) = job.assigned_user() {
            return Err(TransitionError::AlreadyReserved {
                job: id.clone(),
                by: by.clone(),
            });
        }
        job.reserve(user.clone());
        tracing::info!(job_id = %id, user = %user, "job reserved");
        Ok(job.clone())
    }

    /// Start a reserved job: claim its destination track and re-validate.
    ///
    /// The proposed track is claimed if still free, otherwise the first free
    /// destination track.
    pub fn take(&mut self, user: &Username, id: &JobId) -> Result<Transition, TransitionError> {
        let job = self
            .job(id)
            .ok_or_else(|| TransitionError::JobNotFound { job: id.clone() })?;
        if job.is_active() {
            return Err(TransitionError::AlreadyActive { job: id.clone() });
        }
        if !job.is_assigned_to(user) {
            return Err(TransitionError::NotReservedBy {
                job: id.clone(),
                user: user.clone(),
            });
        }
        if !job.is_spawned() {
            return Err(TransitionError::NotSpawned { job: id.clone() });
        }

        let alloc = TrackAllocator::new(self);
        let destination = job
            .proposed_track()
            .filter(|t| alloc.is_free(t))
            .or_else(|| {
                alloc.find_free_track(job.destination(), job.job_type().destination_class())
            })
            .ok_or_else(|| TransitionError::NoDestinationTrack { job: id.clone() })?;
        let (origin_station, destination_station) = (job.origin(), job.destination());

        if let Some(job) = self.job_mut(id) {
            job.activate(destination);
        }
        tracing::info!(job_id = %id, user = %user, track = %destination, "job taken");

        let rv = self.revalidate();
        let notified = self.affected_stations(origin_station, destination_station, &rv);
        let mut transition = self.transition(&rv, notified);
        if !transition.changed.iter().any(|j| j.id() == id) {
            if let Some(job) = self.job(id) {
                transition.changed.insert(0, job.clone());
            }
        }
        Ok(transition)
    }

    /// Complete an active job: remove it, run production at its destination
    /// and re-validate.
    pub fn finish(&mut self, user: &Username, id: &JobId) -> Result<Transition, TransitionError> {
        let job = self
            .job(id)
            .ok_or_else(|| TransitionError::JobNotFound { job: id.clone() })?;
        if !job.is_active() {
            return Err(TransitionError::NotActive { job: id.clone() });
        }
        if !job.is_assigned_to(user) {
            return Err(TransitionError::NotAssignedTo {
                job: id.clone(),
                user: user.clone(),
            });
        }
        let finished = self
            .remove_job(id)
            .ok_or_else(|| TransitionError::JobNotFound { job: id.clone() })?;
        tracing::info!(
            job_id = %id,
            user = %user,
            cargo_type = %finished.cargo(),
            car_count = finished.car_count(),
            wage = finished.wage(),
            "job finished"
        );

        let dispatch = self.dispatch(&finished);
        let rv = self.revalidate();
        let notified = self.affected_stations(finished.origin(), finished.destination(), &rv);
        let mut transition = self.transition(&rv, notified);

        transition.despawned.insert(0, finished);
        for merged in &dispatch.merged {
            let reported = [&transition.spawned, &transition.despawned, &transition.changed]
                .into_iter()
                .flatten()
                .any(|j| j.id() == merged);
            if reported {
                continue;
            }
            if let Some(job) = self.job(merged) {
                transition.changed.push(job.clone());
            }
        }
        transition.created = dispatch
            .created
            .iter()
            .filter_map(|id| self.job(id).cloned())
            .collect();
        Ok(transition)
    }

    fn transition(&self, rv: &Revalidation, notified: Vec<StationId>) -> Transition {
        let snapshot = |ids: &[JobId]| -> Vec<Job> {
            ids.iter().filter_map(|id| self.job(id).cloned()).collect()
        };
        Transition {
            despawned: snapshot(&rv.despawned),
            spawned: snapshot(&rv.spawned),
            changed: snapshot(&rv.retargeted),
            created: Vec::new(),
            notified,
        }
    }
}

// ---------------------------------------------------------------------------
// JobBoard
// ---------------------------------------------------------------------------

/// Thread-safe front of one [`Network`].
///
/// Mutations take a single mutex for their whole critical section, including
/// re-validation. Listings are served from snapshots republished after every
/// mutation, so readers never wait on the mutex and may see slightly stale
/// data.
pub struct JobBoard {
    network: Mutex<Network>,
    listings: RwLock<BTreeMap<StationId, Arc<[Job]>>>,
    sink: Arc<dyn ChangeSink>,
}

impl JobBoard {
    pub fn new(network: Network, sink: Arc<dyn ChangeSink>) -> Self {
        let listings: BTreeMap<StationId, Arc<[Job]>> = network
            .stations()
            .map(|s| (s.id(), Arc::from(s.jobs())))
            .collect();
        Self {
            network: Mutex::new(network),
            listings: RwLock::new(listings),
            sink,
        }
    }

    /// A board over the standard network, initial jobs already spawned.
    pub fn standard(config: EngineConfig, sink: Arc<dyn ChangeSink>) -> Self {
        Self::new(Network::standard(config), sink)
    }

    /// Spawned jobs at `station`. With a user, only jobs still open or active
    /// and assigned to that user.
    pub fn list_jobs(&self, station: StationId, user: Option<&Username>) -> Vec<Job> {
        let Some(queue) = self.listings.read().get(&station).cloned() else {
            return Vec::new();
        };
        queue
            .iter()
            .filter(|j| j.is_spawned())
            .filter(|j| user.is_none_or(|u| !j.is_active() || j.is_assigned_to(u)))
            .cloned()
            .collect()
    }

    pub fn reserve(&self, user: &Username, id: &JobId) -> Result<Job, TransitionError> {
        let mut network = self.network.lock();
        let job = network.reserve(user, id)?;
        self.publish_listings(&network, &[job.origin()]);
        Ok(job)
    }

    pub fn take(&self, user: &Username, id: &JobId) -> Result<Transition, TransitionError> {
        let mut network = self.network.lock();
        let transition = network.take(user, id)?;
        self.commit(&network, &transition);
        Ok(transition)
    }

    pub fn finish(&self, user: &Username, id: &JobId) -> Result<Transition, TransitionError> {
        let mut network = self.network.lock();
        let transition = network.finish(user, id)?;
        self.commit(&network, &transition);
        Ok(transition)
    }

    /// Emit a change event for one station without mutating anything.
    pub fn notify_station(&self, station: StationId) {
        tracing::debug!(station_id = %station, "manual station notification");
        self.sink.station_changed(StationChanged::new(station));
    }

    pub fn station_summaries(&self) -> Vec<StationSummary> {
        self.network.lock().station_summaries()
    }

    /// Run `f` with the network locked.
    pub fn with_network<R>(&self, f: impl FnOnce(&Network) -> R) -> R {
        f(&self.network.lock())
    }

    fn commit(&self, network: &Network, transition: &Transition) {
        // Job changes can reach stations outside the notify set.
        let stations: Vec<StationId> = network.stations().map(|s| s.id()).collect();
        self.publish_listings(network, &stations);
        for &station in &transition.notified {
            self.sink.station_changed(StationChanged::new(station));
        }
        tracing::debug!(notified = ?transition.notified, "stations notified");
    }

    fn publish_listings(&self, network: &Network, stations: &[StationId]) {
        let mut listings = self.listings.write();
        for &id in stations {
            if let Some(station) = network.station(id) {
                listings.insert(id, Arc::from(station.jobs()));
            }
        }
    }
}
