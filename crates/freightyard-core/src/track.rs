//! Static track registry: which physical tracks each station has, by class.
//!
//! A track never stores whether it is free. Occupancy is derived from the
//! live job set by [`crate::allocator::TrackAllocator`].

use crate::id::StationId;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The functional role of a track.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TrackClass {
    #[serde(rename = "I")]
    Input,
    #[serde(rename = "O")]
    Output,
    #[serde(rename = "S")]
    Storage,
    #[serde(rename = "L")]
    Loading,
}

impl TrackClass {
    pub const ALL: [TrackClass; 4] = [
        TrackClass::Input,
        TrackClass::Output,
        TrackClass::Storage,
        TrackClass::Loading,
    ];

    pub fn code(self) -> char {
        match self {
            TrackClass::Input => 'I',
            TrackClass::Output => 'O',
            TrackClass::Storage => 'S',
            TrackClass::Loading => 'L',
        }
    }
}

/// A physical track: `<station>-<yard>-<NN>-<class>`.
///
/// Field order gives the registry enumeration order (yard letter, then
/// number) for tracks of one station and class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Track {
    pub station: StationId,
    pub class: TrackClass,
    pub yard: char,
    pub number: u8,
}

impl Track {
    pub fn new(station: StationId, yard: char, number: u8, class: TrackClass) -> Self {
        Self {
            station,
            class,
            yard,
            number,
        }
    }

    /// Full track name as shown to users.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:02}-{}",
            self.station,
            self.yard,
            self.number,
            self.class.code()
        )
    }
}

/// One yard's tracks of a given class.
struct YardSpec {
    class: TrackClass,
    yard: char,
    numbers: &'static [u8],
}

const fn yard(class: TrackClass, yard: char, numbers: &'static [u8]) -> YardSpec {
    YardSpec {
        class,
        yard,
        numbers,
    }
}

use TrackClass::{Input as I, Loading as L, Output as O, Storage as S};

const CSW: &[YardSpec] = &[
    yard(I, 'C', &[2, 3]),
    yard(S, 'C', &[4]),
    yard(O, 'C', &[5]),
    yard(L, 'C', &[6]),
];

const CM: &[YardSpec] = &[
    yard(I, 'B', &[1]),
    yard(S, 'B', &[5]),
    yard(S, 'C', &[1, 3]),
    yard(O, 'B', &[2, 3]),
    yard(L, 'A', &[3]),
];

const FF: &[YardSpec] = &[
    yard(I, 'C', &[4, 6]),
    yard(I, 'D', &[2]),
    yard(S, 'A', &[1]),
    yard(S, 'C', &[1]),
    yard(S, 'D', &[3, 4]),
    yard(O, 'C', &[2, 3, 5, 7, 8]),
    yard(L, 'D', &[1]),
];

const FM: &[YardSpec] = &[
    yard(I, 'B', &[2]),
    yard(S, 'B', &[1, 3]),
    yard(O, 'B', &[5, 6]),
    yard(L, 'A', &[1, 2, 3]),
];

const FRC: &[YardSpec] = &[
    yard(S, 'B', &[4]),
    yard(S, 'C', &[1, 2]),
    yard(O, 'B', &[2]),
    yard(O, 'C', &[4]),
    yard(L, 'B', &[1]),
];

const GF: &[YardSpec] = &[
    yard(I, 'D', &[5, 6]),
    yard(S, 'A', &[2, 3]),
    yard(S, 'B', &[2, 3]),
    yard(S, 'D', &[1]),
    yard(O, 'D', &[2, 3, 4]),
    yard(L, 'B', &[1]),
];

const HB: &[YardSpec] = &[
    yard(I, 'C', &[2]),
    yard(I, 'D', &[4]),
    yard(I, 'E', &[8, 9]),
    yard(I, 'G', &[5]),
    yard(S, 'C', &[1]),
    yard(S, 'D', &[1, 2, 5]),
    yard(S, 'G', &[1, 2, 6, 7]),
    yard(O, 'D', &[3, 6]),
    yard(O, 'E', &[1, 2, 3, 4, 5, 7, 10, 11]),
    yard(O, 'G', &[3]),
    yard(L, 'C', &[3]),
    yard(L, 'D', &[7]),
];

const IME: &[YardSpec] = &[
    yard(I, 'C', &[4]),
    yard(S, 'B', &[1]),
    yard(S, 'C', &[1]),
    yard(O, 'B', &[2, 4]),
    yard(O, 'C', &[3]),
    yard(L, 'A', &[1]),
];

const IMW: &[YardSpec] = &[
    yard(I, 'B', &[2]),
    yard(S, 'B', &[1, 7]),
    yard(O, 'B', &[3, 4, 6]),
    yard(L, 'B', &[8]),
];

const MF: &[YardSpec] = &[
    yard(I, 'C', &[3, 4]),
    yard(S, 'B', &[1, 6]),
    yard(S, 'C', &[2]),
    yard(O, 'B', &[2, 4, 5]),
    yard(L, 'C', &[1]),
];

const OWC: &[YardSpec] = &[
    yard(S, 'A', &[2, 3]),
    yard(S, 'B', &[6]),
    yard(O, 'B', &[1, 3, 4, 5]),
    yard(L, 'A', &[1]),
];

const OWN: &[YardSpec] = &[
    yard(S, 'B', &[2]),
    yard(S, 'C', &[1]),
    yard(O, 'B', &[3, 4, 5]),
    yard(O, 'C', &[3]),
    yard(L, 'B', &[6]),
];

const SW: &[YardSpec] = &[
    yard(S, 'B', &[1]),
    yard(S, 'C', &[4]),
    yard(O, 'C', &[1]),
    yard(I, 'C', &[3]),
    yard(I, 'B', &[3]),
    yard(L, 'B', &[4]),
];

const SM: &[YardSpec] = &[
    yard(L, 'A', &[7]),
    yard(S, 'B', &[7, 8]),
    yard(I, 'A', &[6]),
    yard(I, 'B', &[3]),
    yard(O, 'B', &[1, 2, 4, 6]),
];

fn layout(station: StationId) -> &'static [YardSpec] {
    match station {
        StationId::Csw => CSW,
        StationId::Cm => CM,
        StationId::Ff => FF,
        StationId::Fm => FM,
        StationId::Frc => FRC,
        StationId::Gf => GF,
        StationId::Hb => HB,
        StationId::Ime => IME,
        StationId::Imw => IMW,
        StationId::Mf => MF,
        StationId::Owc => OWC,
        StationId::Own => OWN,
        StationId::Sw => SW,
        StationId::Sm => SM,
        // No surveyed track layout.
        StationId::Frs | StationId::Hmb | StationId::Mb => &[],
    }
}

/// All tracks of `class` at `station`, in enumeration order.
pub fn tracks(station: StationId, class: TrackClass) -> Vec<Track> {
    let mut out: Vec<Track> = layout(station)
        .iter()
        .filter(|spec| spec.class == class)
        .flat_map(|spec| {
            spec.numbers
                .iter()
                .map(move |&n| Track::new(station, spec.yard, n, class))
        })
        .collect();
    out.sort();
    out
}

/// Every track at a station, grouped by class.
pub fn all_tracks(station: StationId) -> Vec<Track> {
    TrackClass::ALL
        .into_iter()
        .flat_map(|class| tracks(station, class))
        .collect()
}

/// A uniformly chosen track of the class, or `None` if the station has none.
pub fn random_track(station: StationId, class: TrackClass, rng: &mut SimRng) -> Option<Track> {
    let candidates = tracks(station, class);
    rng.pick(&candidates).copied()
}
