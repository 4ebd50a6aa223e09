//! Track allocation against the live job set.
//!
//! Occupancy is never stored. A track is occupied when it is the origin of a
//! spawned job or the destination of an active job; every query scans the
//! network's jobs. Ties between free tracks are broken by registry order.

use crate::id::StationId;
use crate::job::Job;
use crate::network::Network;
use crate::track::{self, Track, TrackClass};

/// Read-only occupancy view over one [`Network`].
#[derive(Clone, Copy)]
pub struct TrackAllocator<'a> {
    network: &'a Network,
}

impl<'a> TrackAllocator<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    /// The job occupying `track`, if any.
    pub fn occupant(&self, track: &Track) -> Option<&'a Job> {
        self.network.jobs().find(|job| job.occupies(track))
    }

    pub fn is_free(&self, track: &Track) -> bool {
        self.occupant(track).is_none()
    }

    /// First free track of `class` at `station`.
    pub fn find_free_track(&self, station: StationId, class: TrackClass) -> Option<Track> {
        self.find_free_track_excluding(station, class, None)
    }

    /// First free track of `class` at `station` other than `exclude`.
    ///
    /// Used when spawning: the origin just chosen is not yet recorded on the
    /// job, so a Storage-to-Storage haul must not pick it again.
    pub fn find_free_track_excluding(
        &self,
        station: StationId,
        class: TrackClass,
        exclude: Option<Track>,
    ) -> Option<Track> {
        track::tracks(station, class)
            .into_iter()
            .filter(|t| Some(*t) != exclude)
            .find(|t| self.is_free(t))
    }

    /// Every free track of `class` at `station`, in registry order.
    pub fn free_tracks(&self, station: StationId, class: TrackClass) -> Vec<Track> {
        track::tracks(station, class)
            .into_iter()
            .filter(|t| self.is_free(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cargo::CargoType;
    use crate::config::EngineConfig;
    use crate::job::JobType;

    fn sawmill_network() -> Network {
        let mut net = Network::empty(EngineConfig::default());
        net.add_station(StationId::Sw, 2, 6);
        net
    }

    #[test]
    fn empty_network_everything_free() {
        let net = sawmill_network();
        let alloc = TrackAllocator::new(&net);
        let first = alloc.find_free_track(StationId::Sw, TrackClass::Storage).unwrap();
        assert_eq!(first.name(), "SW-B-01-S");
        assert_eq!(alloc.free_tracks(StationId::Sw, TrackClass::Storage).len(), 2);
    }

    #[test]
    fn exclusion_skips_chosen_origin() {
        let net = sawmill_network();
        let alloc = TrackAllocator::new(&net);
        let origin = alloc.find_free_track(StationId::Sw, TrackClass::Storage);
        let dest = alloc
            .find_free_track_excluding(StationId::Sw, TrackClass::Storage, origin)
            .unwrap();
        assert_eq!(dest.name(), "SW-C-04-S");
    }

    #[test]
    fn spawned_origin_is_occupied() {
        let mut net = sawmill_network();
        let id = net.create_job(
            StationId::Sw,
            JobType::ShuntingLoad,
            StationId::Sw,
            4,
            CargoType::Boards,
            2_400,
        );
        net.revalidate();

        let job = net.job(&id).unwrap();
        let origin = job.origin_track().unwrap();
        let proposed = job.proposed_track().unwrap();

        let alloc = TrackAllocator::new(&net);
        assert_eq!(alloc.occupant(&origin).map(Job::id), Some(&id));
        // A proposal is only shown, not held.
        assert!(alloc.is_free(&proposed));
    }

    #[test]
    fn station_without_tracks_has_nothing_free() {
        let net = Network::empty(EngineConfig::default());
        let alloc = TrackAllocator::new(&net);
        assert!(alloc.find_free_track(StationId::Mb, TrackClass::Input).is_none());
    }
}
