//! The network: every station, its jobs and processors, plus the seeded RNG.
//!
//! A [`Network`] is an ordinary owned value. Several can exist side by side
//! (tests build small ones); the [`JobBoard`](crate::engine::JobBoard) wraps
//! one in a mutex for concurrent use.
//!
//! # Re-validation
//!
//! [`Network::revalidate`] recomputes every job's track assignment in four
//! passes by job type (ShuntingUnload, Freight, ShuntingLoad, LogisticHaul),
//! visiting stations in id order and each queue in order. Rounds repeat until
//! nothing changes, so a second call without an intervening mutation is a
//! no-op.

use crate::allocator::TrackAllocator;
use crate::cargo::CargoType;
use crate::config::EngineConfig;
use crate::id::{JobId, StationId, Username};
use crate::job::{Job, JobType};
use crate::processor::StationProcessor;
use crate::rng::SimRng;
use crate::station::{Folded, Station, StationSummary};
use crate::topology;
use crate::track::Track;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Wage per car of the ShuntingUnload created when a Freight job arrives.
pub const UNLOAD_WAGE_PER_CAR: u32 = 500;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Net effect of one [`Network::revalidate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revalidation {
    /// Jobs that went from queued to spawned.
    pub spawned: Vec<JobId>,
    /// Jobs that went from spawned back to queued.
    pub despawned: Vec<JobId>,
    /// Spawned jobs whose proposed destination moved.
    pub retargeted: Vec<JobId>,
    /// Origin stations of every job above.
    pub changed_stations: BTreeSet<StationId>,
    /// Rounds run before reaching a fixed point.
    pub rounds: usize,
}

impl Revalidation {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.despawned.is_empty() && self.retargeted.is_empty()
    }
}

/// Jobs touched while dispatching a finished job's production effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub created: Vec<JobId>,
    /// Existing ShuntingLoads that received folded output.
    pub merged: Vec<JobId>,
}

impl Dispatch {
    fn record(&mut self, folded: Folded) {
        match folded {
            Folded::Created { job, .. } => self.created.push(job),
            Folded::Merged { job, .. } => {
                if !self.merged.contains(&job) {
                    self.merged.push(job);
                }
            }
        }
    }
}

/// How a job's tracks moved across one re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssignmentChange {
    Spawned,
    Despawned,
    /// Still spawned, but on a different origin or proposal.
    Retargeted,
}

/// Compare a job against its `(origin, proposal)` before re-validation.
fn classify(was: (Option<Track>, Option<Track>), job: &Job) -> Option<AssignmentChange> {
    let (was_origin, was_proposed) = was;
    match (was_origin.is_some(), job.is_spawned()) {
        (false, true) => Some(AssignmentChange::Spawned),
        (true, false) => Some(AssignmentChange::Despawned),
        (true, true)
            if was_origin != job.origin_track() || was_proposed != job.proposed_track() =>
        {
            Some(AssignmentChange::Retargeted)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnDecision {
    Unchanged,
    Spawn { origin: Track, proposed: Track },
    Retarget { proposed: Track },
    Despawn,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Network {
    stations: BTreeMap<StationId, Station>,
    rng: SimRng,
    config: EngineConfig,
}

impl Network {
    /// A network with no stations.
    pub fn empty(config: EngineConfig) -> Self {
        Self {
            stations: BTreeMap::new(),
            rng: SimRng::new(config.seed),
            config,
        }
    }

    /// The standard production topology, with initially spawnable jobs
    /// already spawned.
    pub fn standard(config: EngineConfig) -> Self {
        let mut network = topology::standard_network(config);
        let rv = network.revalidate();
        tracing::info!(
            stations = network.stations.len(),
            jobs = network.job_count(),
            spawned = rv.spawned.len(),
            "network ready"
        );
        network
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    // -- stations --

    /// Add a station, replacing any existing one with the same id.
    pub fn add_station(&mut self, id: StationId, min_cars: u32, max_cars: u32) -> &mut Station {
        let station = Station::new(id, min_cars, max_cars);
        match self.stations.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(station);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(station),
        }
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    /// Stations in id order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn station_summaries(&self) -> Vec<StationSummary> {
        self.stations.values().map(Station::summary).collect()
    }

    /// Attach a processor to a station. A generative processor immediately
    /// seeds one ShuntingLoad of its output.
    ///
    /// Returns the seeded job, if any. Unknown stations are ignored.
    pub fn add_processor(
        &mut self,
        station_id: StationId,
        processor: StationProcessor,
    ) -> Option<JobId> {
        let Some(station) = self.stations.get_mut(&station_id) else {
            tracing::warn!(station_id = %station_id, "processor for unknown station ignored");
            return None;
        };
        let seed = processor.is_generative().then(|| processor.output());
        station.push_processor(processor);
        seed.map(|cargo| self.seed_load(station_id, cargo))
    }

    /// Queue a generative ShuntingLoad: car count drawn from the station's
    /// range, paid at the cargo's base wage.
    fn seed_load(&mut self, station_id: StationId, cargo: CargoType) -> JobId {
        let ceiling = self.config.max_cars_per_job;
        let (min, max) = self
            .stations
            .get(&station_id)
            .map(Station::car_range)
            .unwrap_or((1, 1));
        let cars = self.rng.range(min, max).min(ceiling);
        self.create_job(
            station_id,
            JobType::ShuntingLoad,
            station_id,
            cars,
            cargo,
            cargo.base_wage() * cars,
        )
    }

    /// Queue an unspawned job at `origin`.
    ///
    /// Cars beyond the configured ceiling go to the origin's overflow buffer.
    ///
    /// # Panics
    ///
    /// Panics if `origin` is not part of the network.
    pub fn create_job(
        &mut self,
        origin: StationId,
        job_type: JobType,
        destination: StationId,
        car_count: u32,
        cargo: CargoType,
        wage: u32,
    ) -> JobId {
        let ceiling = self.config.max_cars_per_job;
        let Some(station) = self.stations.get_mut(&origin) else {
            panic!("cannot create a job at {origin}: station not in network");
        };
        if car_count > ceiling {
            station.add_overflow(cargo, car_count - ceiling);
        }
        station.add_job(job_type, destination, car_count.min(ceiling), cargo, wage)
    }

    // -- jobs --

    /// Every job in the network: stations in id order, queues in order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.stations.values().flat_map(|s| s.jobs().iter())
    }

    pub fn job_count(&self) -> usize {
        self.stations.values().map(|s| s.jobs().len()).sum()
    }

    /// The station whose queue holds `id`.
    ///
    /// # Panics
    ///
    /// Panics if the job is found in more than one queue.
    pub fn locate(&self, id: &JobId) -> Option<StationId> {
        let mut holders = self
            .stations
            .values()
            .filter(|s| s.job(id).is_some())
            .map(Station::id);
        let first = holders.next()?;
        if let Some(second) = holders.next() {
            panic!("job {id} is queued at both {first} and {second}");
        }
        Some(first)
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        let station = self.locate(id)?;
        self.stations.get(&station)?.job(id)
    }

    pub(crate) fn job_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        let station = self.locate(id)?;
        self.stations.get_mut(&station)?.job_mut(id)
    }

    pub(crate) fn remove_job(&mut self, id: &JobId) -> Option<Job> {
        let station = self.locate(id)?;
        self.stations.get_mut(&station)?.remove_job(id)
    }

    /// Spawned jobs at a station; with a user, only those still open or
    /// active and assigned to that user.
    pub fn visible_jobs(&self, station: StationId, user: Option<&Username>) -> Vec<Job> {
        let Some(station) = self.stations.get(&station) else {
            return Vec::new();
        };
        station
            .jobs()
            .iter()
            .filter(|j| j.is_spawned())
            .filter(|j| match user {
                Some(user) => !j.is_active() || j.is_assigned_to(user),
                None => true,
            })
            .cloned()
            .collect()
    }

    // -- re-validation --

    /// Bring every job's track assignment up to date.
    pub fn revalidate(&mut self) -> Revalidation {
        let before = self.assignments();
        let limit = self.job_count() + 2;

        let mut rounds = 0;
        loop {
            rounds += 1;
            if !self.revalidation_round() {
                break;
            }
            if rounds >= limit {
                tracing::warn!(rounds, "re-validation did not settle");
                break;
            }
        }

        let mut result = Revalidation {
            rounds,
            ..Revalidation::default()
        };
        for job in self.jobs() {
            let Some(&was) = before.get(job.id()) else {
                continue;
            };
            let bucket = match classify(was, job) {
                Some(AssignmentChange::Spawned) => &mut result.spawned,
                Some(AssignmentChange::Despawned) => &mut result.despawned,
                Some(AssignmentChange::Retargeted) => &mut result.retargeted,
                None => continue,
            };
            bucket.push(job.id().clone());
            result.changed_stations.insert(job.origin());
        }

        if !result.is_empty() {
            tracing::debug!(
                spawned = result.spawned.len(),
                despawned = result.despawned.len(),
                retargeted = result.retargeted.len(),
                rounds,
                "re-validated"
            );
        }
        result
    }

    /// Origin track and proposal of every job.
    fn assignments(&self) -> BTreeMap<JobId, (Option<Track>, Option<Track>)> {
        self.jobs()
            .map(|j| (j.id().clone(), (j.origin_track(), j.proposed_track())))
            .collect()
    }

    /// One pass per job type. Returns whether any job changed.
    fn revalidation_round(&mut self) -> bool {
        let station_ids: Vec<StationId> = self.stations.keys().copied().collect();
        let mut changed = false;

        for job_type in JobType::REVALIDATION_ORDER {
            for &station_id in &station_ids {
                let len = self.stations.get(&station_id).map_or(0, |s| s.jobs().len());
                for idx in 0..len {
                    let decision = match self.stations.get(&station_id).and_then(|s| s.jobs().get(idx)) {
                        Some(job) if job.job_type() == job_type => self.decide(job),
                        _ => continue,
                    };
                    changed |= self.apply(station_id, idx, decision);
                }
            }
        }
        changed
    }

    fn decide(&self, job: &Job) -> SpawnDecision {
        if job.is_active() {
            return SpawnDecision::Unchanged;
        }
        let alloc = TrackAllocator::new(self);
        let job_type = job.job_type();

        if !job.is_spawned() {
            let Some(origin) = alloc.find_free_track(job.origin(), job_type.origin_class()) else {
                return SpawnDecision::Unchanged;
            };
            return match alloc.find_free_track_excluding(
                job.destination(),
                job_type.destination_class(),
                Some(origin),
            ) {
                Some(proposed) => SpawnDecision::Spawn { origin, proposed },
                None => SpawnDecision::Unchanged,
            };
        }

        if job.proposed_track().is_some_and(|t| alloc.is_free(&t)) {
            return SpawnDecision::Unchanged;
        }
        match alloc.find_free_track(job.destination(), job_type.destination_class()) {
            Some(proposed) => SpawnDecision::Retarget { proposed },
            // Reserved jobs keep their origin until taken.
            None if job.is_reserved() => SpawnDecision::Unchanged,
            None => SpawnDecision::Despawn,
        }
    }

    fn apply(&mut self, station_id: StationId, idx: usize, decision: SpawnDecision) -> bool {
        let Some(job) = self
            .stations
            .get_mut(&station_id)
            .and_then(|s| s.jobs_mut().get_mut(idx))
        else {
            return false;
        };
        match decision {
            SpawnDecision::Unchanged => return false,
            SpawnDecision::Spawn { origin, proposed } => {
                tracing::debug!(job_id = %job.id(), station_id = %station_id, origin = %origin, proposed = %proposed, "job spawned");
                job.spawn(origin, proposed);
            }
            SpawnDecision::Retarget { proposed } => {
                tracing::debug!(job_id = %job.id(), proposed = %proposed, "job retargeted");
                job.retarget(proposed);
            }
            SpawnDecision::Despawn => {
                tracing::debug!(job_id = %job.id(), station_id = %station_id, "job despawned");
                job.despawn();
            }
        }
        true
    }

    /// Stations to notify after a mutation triggered by a job running from
    /// `origin` to `destination`.
    ///
    /// Always both ends of the trigger, plus every changed station that has a
    /// job bound for the same destination. Sorted, without duplicates.
    pub fn affected_stations(
        &self,
        origin: StationId,
        destination: StationId,
        revalidation: &Revalidation,
    ) -> Vec<StationId> {
        let mut out = BTreeSet::from([origin, destination]);
        for id in &revalidation.changed_stations {
            let feeds_destination = self
                .stations
                .get(id)
                .is_some_and(|s| s.jobs().iter().any(|j| j.destination() == destination));
            if feeds_destination {
                out.insert(*id);
            }
        }
        out.into_iter().collect()
    }

    // -- production --

    /// Apply the production effects of a finished job at its destination.
    pub(crate) fn dispatch(&mut self, finished: &Job) -> Dispatch {
        let at = finished.destination();
        let cargo = finished.cargo();
        let cars = finished.car_count();
        let ceiling = self.config.max_cars_per_job;
        let mut out = Dispatch::default();

        let Some(station) = self.stations.get_mut(&at) else {
            tracing::warn!(job_id = %finished.id(), station_id = %at, "destination not in network");
            return out;
        };

        match finished.job_type() {
            JobType::ShuntingUnload => {
                if let Some((output, units)) = station.intake(cargo, cars) {
                    out.record(station.fold_output(output, units, ceiling));
                }
            }
            JobType::Freight => {
                out.created.push(station.add_job(
                    JobType::ShuntingUnload,
                    at,
                    cars,
                    cargo,
                    cars * UNLOAD_WAGE_PER_CAR,
                ));
            }
            JobType::ShuntingLoad => {
                let producer = station
                    .producer_of(cargo)
                    .map(|p| (p.destinations().to_vec(), p.is_generative()));

                match producer {
                    Some((candidates, generative)) => {
                        match self.rng.pick(&candidates).copied() {
                            Some(target) => out.created.push(self.create_job(
                                at,
                                JobType::Freight,
                                target,
                                cars,
                                cargo,
                                finished.wage(),
                            )),
                            None => {
                                tracing::warn!(station_id = %at, cargo_type = %cargo, "processor has no destinations; load not forwarded")
                            }
                        }
                        if generative {
                            out.created.push(self.seed_load(at, cargo));
                        }
                    }
                    None => {
                        tracing::warn!(station_id = %at, cargo_type = %cargo, "no processor produces shipped cargo")
                    }
                }

                // Output held back by the car ceiling ships next.
                if let Some(station) = self.stations.get_mut(&at) {
                    let held = station.take_overflow(cargo);
                    if held > 0 {
                        out.record(station.fold_output(cargo, held, ceiling));
                    }
                }
            }
            JobType::LogisticHaul => {}
        }
        out
    }
}
