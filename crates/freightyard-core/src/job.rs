//! Jobs: claimable units of work moving cars of one cargo type between two
//! tracks.
//!
//! # Lifecycle
//!
//! ```text
//! Queued --spawn--> Spawned --reserve--> Reserved --take--> Active --finish--> (removed)
//!    ^                 |
//!    +----despawn------+   (only while not reserved)
//! ```
//!
//! The track fields encode the lifecycle flags: a job is spawned exactly when
//! it holds an origin track, and active exactly when it holds a destination
//! track. While spawned but not active it only carries a *proposed*
//! destination, which is shown to users but does not occupy the track.

use crate::cargo::CargoType;
use crate::id::{JobId, StationId, Username};
use crate::track::{Track, TrackClass};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a job represents. Determines its track classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "logistics")]
    LogisticHaul,
    #[serde(rename = "shunting_load")]
    ShuntingLoad,
    #[serde(rename = "shunting_unload")]
    ShuntingUnload,
    #[serde(rename = "freight")]
    Freight,
}

impl JobType {
    /// Re-validation order: end of the production chain first.
    pub const REVALIDATION_ORDER: [JobType; 4] = [
        JobType::ShuntingUnload,
        JobType::Freight,
        JobType::ShuntingLoad,
        JobType::LogisticHaul,
    ];

    /// Three-letter code used in job ids.
    pub fn code(self) -> &'static str {
        match self {
            JobType::LogisticHaul => "SLH",
            JobType::ShuntingLoad => "SSL",
            JobType::ShuntingUnload => "SSU",
            JobType::Freight => "SFH",
        }
    }

    pub fn origin_class(self) -> TrackClass {
        match self {
            JobType::LogisticHaul => TrackClass::Storage,
            JobType::ShuntingLoad => TrackClass::Storage,
            JobType::ShuntingUnload => TrackClass::Input,
            JobType::Freight => TrackClass::Output,
        }
    }

    pub fn destination_class(self) -> TrackClass {
        match self {
            JobType::LogisticHaul => TrackClass::Storage,
            JobType::ShuntingLoad => TrackClass::Output,
            JobType::ShuntingUnload => TrackClass::Storage,
            JobType::Freight => TrackClass::Input,
        }
    }

    /// Wire name, as used in [`JobView::job_type`].
    pub fn name(self) -> &'static str {
        match self {
            JobType::LogisticHaul => "logistics",
            JobType::ShuntingLoad => "shunting_load",
            JobType::ShuntingUnload => "shunting_unload",
            JobType::Freight => "freight",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A job and its lifecycle state. Owned by its origin station's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    job_type: JobType,
    origin: StationId,
    destination: StationId,
    car_count: u32,
    cargo: CargoType,
    wage: u32,
    origin_track: Option<Track>,
    proposed_track: Option<Track>,
    destination_track: Option<Track>,
    reserved_by: Option<Username>,
}

impl Job {
    pub(crate) fn new(
        id: JobId,
        job_type: JobType,
        origin: StationId,
        destination: StationId,
        car_count: u32,
        cargo: CargoType,
        wage: u32,
    ) -> Self {
        Self {
            id,
            job_type,
            origin,
            destination,
            car_count,
            cargo,
            wage,
            origin_track: None,
            proposed_track: None,
            destination_track: None,
            reserved_by: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn origin(&self) -> StationId {
        self.origin
    }

    pub fn destination(&self) -> StationId {
        self.destination
    }

    pub fn car_count(&self) -> u32 {
        self.car_count
    }

    pub fn cargo(&self) -> CargoType {
        self.cargo
    }

    pub fn wage(&self) -> u32 {
        self.wage
    }

    pub fn is_spawned(&self) -> bool {
        self.origin_track.is_some()
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.destination_track.is_some()
    }

    pub fn assigned_user(&self) -> Option<&Username> {
        self.reserved_by.as_ref()
    }

    pub fn is_assigned_to(&self, user: &Username) -> bool {
        self.reserved_by.as_ref() == Some(user)
    }

    /// Track the cars are picked up from. Some iff spawned.
    pub fn origin_track(&self) -> Option<Track> {
        self.origin_track
    }

    /// Destination offered while the job waits to be taken. Not occupied.
    pub fn proposed_track(&self) -> Option<Track> {
        self.proposed_track
    }

    /// Claimed destination track. Some iff active.
    pub fn destination_track(&self) -> Option<Track> {
        self.destination_track
    }

    /// The destination track to show users: the claimed one once active,
    /// otherwise the current proposal.
    pub fn target_track(&self) -> Option<Track> {
        self.destination_track.or(self.proposed_track)
    }

    /// Tracks this job currently occupies.
    pub fn occupied_tracks(&self) -> impl Iterator<Item = Track> {
        self.origin_track.into_iter().chain(self.destination_track)
    }

    pub fn occupies(&self, track: &Track) -> bool {
        self.origin_track.as_ref() == Some(track) || self.destination_track.as_ref() == Some(track)
    }

    /// A ShuntingLoad for `cargo` nobody has claimed yet. Produced output can be
    /// folded into it.
    pub fn is_mergeable_load(&self, cargo: CargoType) -> bool {
        self.job_type == JobType::ShuntingLoad
            && self.cargo == cargo
            && !self.is_reserved()
            && !self.is_active()
    }

    pub fn view(&self) -> JobView {
        JobView {
            id: self.id.clone(),
            job_type: self.job_type,
            starting_track: self.origin_track.map(|t| t.name()).unwrap_or_default(),
            target_station: self.destination,
            target_track: self.target_track().map(|t| t.name()).unwrap_or_default(),
            car_count: self.car_count,
            cargo_type: self.cargo,
            wage: self.wage,
        }
    }

    // -- lifecycle mutations (crate-internal, driven by Network) --

    pub(crate) fn spawn(&mut self, origin: Track, proposed: Track) {
        self.origin_track = Some(origin);
        self.proposed_track = Some(proposed);
    }

    pub(crate) fn retarget(&mut self, proposed: Track) {
        self.proposed_track = Some(proposed);
    }

    pub(crate) fn despawn(&mut self) {
        debug_assert!(!self.is_reserved() && !self.is_active());
        self.origin_track = None;
        self.proposed_track = None;
    }

    pub(crate) fn reserve(&mut self, user: Username) {
        self.reserved_by = Some(user);
    }

    pub(crate) fn activate(&mut self, destination: Track) {
        self.proposed_track = None;
        self.destination_track = Some(destination);
    }

    /// Add cars up to `ceiling`; returns the cars that did not fit.
    #[must_use = "cars over the ceiling must go to the overflow buffer"]
    pub(crate) fn add_cars(&mut self, count: u32, ceiling: u32) -> u32 {
        let total = self.car_count + count;
        self.car_count = total.min(ceiling.max(self.car_count));
        total - self.car_count
    }
}

/// Serializable snapshot of a job as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub starting_track: String,
    pub target_station: StationId,
    pub target_track: String,
    pub car_count: u32,
    pub cargo_type: CargoType,
    pub wage: u32,
}
