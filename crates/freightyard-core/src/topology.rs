//! The standard production graph: every station, its generative car-count
//! range, and its processors.
//!
//! Fixed at build time. [`standard_network`] does not spawn anything; use
//! [`Network::standard`] for a ready-to-serve network.

use crate::cargo::CargoType::{self, *};
use crate::config::EngineConfig;
use crate::id::StationId::{self, *};
use crate::network::Network;
use crate::processor::{StationProcessor, blueprint};

/// `(station, min cars, max cars)` for generative jobs, half-open.
const CAR_RANGES: [(StationId, u32, u32); 17] = [
    (Csw, 5, 8),
    (Cm, 6, 12),
    (Ff, 6, 12),
    (Fm, 6, 12),
    (Frc, 4, 7),
    (Frs, 4, 7),
    (Gf, 4, 8),
    (Hb, 6, 12),
    (Hmb, 4, 9),
    (Ime, 5, 10),
    (Imw, 5, 10),
    (Mf, 4, 8),
    (Mb, 3, 6),
    (Owc, 6, 12),
    (Own, 6, 12),
    (Sw, 2, 6),
    (Sm, 2, 6),
];

/// Cargo produced from nothing, with its candidate destinations.
const GENERATIVE: &[(StationId, CargoType, &[StationId])] = &[
    (Csw, ScrapMetal, &[Sm]),
    (Cm, Coal, &[Sm]),
    (Fm, Pigs, &[Ff]),
    (Fm, Sheep, &[Ff]),
    (Fm, Chickens, &[Ff]),
    (Fm, Cows, &[Ff]),
    (Fm, Wheat, &[Ff]),
    (Frc, Logs, &[Sw]),
    (Frs, Logs, &[Sw]),
    (Hb, Ammonia, &[Ff]),
    (Hb, ImportedNewCars, &[Csw]),
    (Hb, ClothingNeoGamma, &[Csw]),
    (Hb, Medicine, &[Csw]),
    (Hb, ClothingNovae, &[Csw]),
    (Hb, Acetylene, &[Gf]),
    (Hb, CryoHydrogen, &[Gf]),
    (Hb, CryoOxygen, &[Gf]),
    (Hb, Methane, &[Gf]),
    (Ime, IronOre, &[Sm]),
    (Imw, IronOre, &[Sm]),
    (Owc, CrudeOil, &[Hb]),
    (Own, CrudeOil, &[Hb]),
];

/// Processors turning delivered cargo into output.
const TRANSFORMS: &[(StationId, &[(CargoType, u32)], CargoType, &[StationId])] = &[
    (Hb, &[(CrudeOil, 1)], Diesel, &[Csw]),
    (Ff, &[(Wheat, 1)], Alcohol, &[Hb]),
    (Ff, &[(Pigs, 1)], CannedFood, &[Hb, Csw]),
    (Ff, &[(Chickens, 1)], CatFood, &[Hb, Csw]),
    (Ff, &[(Cows, 2)], MeatProducts, &[Csw]),
    (Ff, &[(Sheep, 2)], MeatProducts, &[Csw]),
    (Gf, &[(SteelBillets, 1)], ToolsIskar, &[Mf, Csw]),
    (Gf, &[(SteelBillets, 1)], ToolsBrohm, &[Mf, Csw]),
    (Gf, &[(SteelBillets, 1)], ToolsAag, &[Mf, Csw]),
    (Gf, &[(SteelBillets, 1)], ToolsNovae, &[Mf, Csw]),
    (Gf, &[(SteelBillets, 1)], ToolsTraeg, &[Mf, Csw]),
    (Mf, &[(SteelBillets, 1), (SteelSlabs, 1)], Excavators, &[Ime, Imw, Cm]),
    (Mf, &[(SteelBillets, 1), (SteelSlabs, 1)], NewCars, &[Csw, Hb]),
    (Sw, &[(Logs, 1)], Boards, &[Gf]),
    (Sw, &[(Logs, 1)], Plywood, &[Gf]),
    (Sm, &[(Coal, 1), (IronOre, 2)], SteelSlabs, &[Gf, Mf]),
    (Sm, &[(Coal, 1), (IronOre, 2)], SteelBillets, &[Gf, Mf]),
];

/// Build the standard network: all 17 stations with their processors.
/// Generative processors seed one queued ShuntingLoad each.
pub fn standard_network(config: EngineConfig) -> Network {
    let mut network = Network::empty(config);

    for (id, min, max) in CAR_RANGES {
        network.add_station(id, min, max);
    }
    for &(id, output, destinations) in GENERATIVE {
        network.add_processor(id, StationProcessor::generative(output, destinations));
    }
    for &(id, inputs, output, destinations) in TRANSFORMS {
        network.add_processor(
            id,
            StationProcessor::new(blueprint(inputs), output, destinations),
        );
    }
    network
}
