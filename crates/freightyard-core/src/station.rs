use crate::cargo::CargoType;
use crate::id::{JobId, StationId};
use crate::job::{Job, JobType};
use crate::processor::StationProcessor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wage per car of a ShuntingLoad created from folded output.
pub const FOLDED_LOAD_WAGE_PER_CAR: u32 = 1000;

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A rail station: its job queue, production processors and overflow cargo.
///
/// Jobs stay in the queue of their origin station from creation until they
/// are finished.
#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    queue: Vec<Job>,
    next_job_number: u32,
    cursor: usize,
    processors: Vec<StationProcessor>,
    overflow: BTreeMap<CargoType, u32>,
    min_cars: u32,
    max_cars: u32,
}

/// What happened to produced output handed to [`Station::fold_output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Folded {
    /// Added to an existing unclaimed ShuntingLoad.
    Merged { job: JobId, overflow: u32 },
    /// A new ShuntingLoad was queued.
    Created { job: JobId, overflow: u32 },
}

impl Folded {
    pub fn job(&self) -> &JobId {
        match self {
            Folded::Merged { job, .. } | Folded::Created { job, .. } => job,
        }
    }

    /// Cars that went to the overflow buffer.
    pub fn overflow(&self) -> u32 {
        match self {
            Folded::Merged { overflow, .. } | Folded::Created { overflow, .. } => *overflow,
        }
    }
}

impl Station {
    /// A station with no processors. Generative jobs draw their car count
    /// from `[min_cars, max_cars)`.
    pub fn new(id: StationId, min_cars: u32, max_cars: u32) -> Self {
        Self {
            id,
            queue: Vec::new(),
            next_job_number: 1,
            cursor: 0,
            processors: Vec::new(),
            overflow: BTreeMap::new(),
            min_cars,
            max_cars,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    /// Jobs originating here, in queue order.
    pub fn jobs(&self) -> &[Job] {
        &self.queue
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut [Job] {
        &mut self.queue
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.queue.iter().find(|j| j.id() == id)
    }

    pub(crate) fn job_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.queue.iter_mut().find(|j| j.id() == id)
    }

    pub fn processors(&self) -> &[StationProcessor] {
        &self.processors
    }

    pub(crate) fn push_processor(&mut self, processor: StationProcessor) {
        self.processors.push(processor);
    }

    /// Half-open car-count range for generative jobs.
    pub fn car_range(&self) -> (u32, u32) {
        (self.min_cars, self.max_cars)
    }

    pub fn overflow(&self) -> &BTreeMap<CargoType, u32> {
        &self.overflow
    }

    pub fn overflow_of(&self, cargo: CargoType) -> u32 {
        self.overflow.get(&cargo).copied().unwrap_or(0)
    }

    pub(crate) fn take_overflow(&mut self, cargo: CargoType) -> u32 {
        self.overflow.remove(&cargo).unwrap_or(0)
    }

    pub(crate) fn add_overflow(&mut self, cargo: CargoType, count: u32) {
        if count > 0 {
            *self.overflow.entry(cargo).or_insert(0) += count;
        }
    }

    // -- jobs --

    /// Queue a new, unspawned job originating at this station.
    pub(crate) fn add_job(
        &mut self,
        job_type: JobType,
        destination: StationId,
        car_count: u32,
        cargo: CargoType,
        wage: u32,
    ) -> JobId {
        let id = JobId::new(self.id, job_type, self.next_job_number);
        self.next_job_number += 1;
        tracing::debug!(
            job_id = %id,
            station_id = %self.id,
            destination = %destination,
            cargo_type = %cargo,
            car_count,
            wage,
            "job created"
        );
        self.queue.push(Job::new(
            id.clone(),
            job_type,
            self.id,
            destination,
            car_count,
            cargo,
            wage,
        ));
        id
    }

    pub(crate) fn remove_job(&mut self, id: &JobId) -> Option<Job> {
        let idx = self.queue.iter().position(|j| j.id() == id)?;
        Some(self.queue.remove(idx))
    }

    // -- production --

    /// Deliver `count` cars of `cargo` to the processors, round-robin.
    ///
    /// Scans processors from the cursor; the first one that accepts the cargo
    /// receives it and the cursor moves past it. If no processor accepts, the
    /// cursor still advances by one and the cargo is dropped.
    ///
    /// Returns the produced output cargo and unit count, if any.
    pub fn intake(&mut self, cargo: CargoType, count: u32) -> Option<(CargoType, u32)> {
        let n = self.processors.len();
        if n == 0 {
            tracing::warn!(station_id = %self.id, cargo_type = %cargo, count, "no processors; cargo dropped");
            return None;
        }

        for step in 0..n {
            let idx = (self.cursor + step) % n;
            let processor = &mut self.processors[idx];
            if !processor.accepts(cargo) {
                continue;
            }
            processor.accumulate(cargo, count);
            self.cursor = (idx + 1) % n;

            let units = processor.try_produce();
            let output = processor.output();
            if units == 0 || output == CargoType::None {
                return None;
            }
            tracing::debug!(station_id = %self.id, cargo_type = %output, units, "produced");
            return Some((output, units));
        }

        self.cursor = (self.cursor + 1) % n;
        tracing::warn!(
            station_id = %self.id,
            cargo_type = %cargo,
            count,
            "no processor accepts cargo; dropped"
        );
        None
    }

    /// Fold produced output into the queue.
    ///
    /// Merges into the first unclaimed ShuntingLoad of the same cargo, up to
    /// `ceiling` cars. Without one, queues a new ShuntingLoad to this station
    /// with at most `ceiling` cars. Cars over the ceiling go to overflow.
    pub fn fold_output(&mut self, cargo: CargoType, count: u32, ceiling: u32) -> Folded {
        if let Some(job) = self.queue.iter_mut().find(|j| j.is_mergeable_load(cargo)) {
            let overflow = job.add_cars(count, ceiling);
            let id = job.id().clone();
            tracing::debug!(job_id = %id, cargo_type = %cargo, count, overflow, "output merged");
            self.add_overflow(cargo, overflow);
            return Folded::Merged { job: id, overflow };
        }

        let cars = count.min(ceiling);
        let overflow = count - cars;
        let id = self.add_job(
            JobType::ShuntingLoad,
            self.id,
            cars,
            cargo,
            cars * FOLDED_LOAD_WAGE_PER_CAR,
        );
        self.add_overflow(cargo, overflow);
        Folded::Created { job: id, overflow }
    }

    /// The first processor producing `cargo`.
    pub fn producer_of(&self, cargo: CargoType) -> Option<&StationProcessor> {
        self.processors.iter().find(|p| p.output() == cargo)
    }

    // -- reporting --

    pub fn summary(&self) -> StationSummary {
        let mut inputs: Vec<CargoType> = self
            .processors
            .iter()
            .flat_map(StationProcessor::inputs)
            .collect();
        inputs.sort();
        inputs.dedup();

        let mut outputs: Vec<CargoType> = self
            .processors
            .iter()
            .map(StationProcessor::output)
            .filter(|c| *c != CargoType::None)
            .collect();
        outputs.sort();
        outputs.dedup();

        StationSummary {
            station_id: self.id,
            inputs,
            outputs,
            queued: self.queue.iter().filter(|j| !j.is_spawned()).count(),
            spawned: self.queue.iter().filter(|j| j.is_spawned()).count(),
            active: self.queue.iter().filter(|j| j.is_active()).count(),
            overflow: self.overflow.clone(),
        }
    }
}

/// Read-only overview of a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSummary {
    pub station_id: StationId,
    pub inputs: Vec<CargoType>,
    pub outputs: Vec<CargoType>,
    pub queued: usize,
    pub spawned: usize,
    pub active: usize,
    pub overflow: BTreeMap<CargoType, u32>,
}
