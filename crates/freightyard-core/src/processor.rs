use crate::cargo::CargoType;
use crate::id::StationId;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Input requirement for one unit of output: cargo type to car count.
pub type Blueprint = BTreeMap<CargoType, u32>;

/// Build a blueprint from `(cargo, units)` pairs.
pub fn blueprint(entries: &[(CargoType, u32)]) -> Blueprint {
    entries.iter().copied().collect()
}

// ---------------------------------------------------------------------------
// StationProcessor
// ---------------------------------------------------------------------------

/// A station-owned production rule.
///
/// Converts a weighted combination of input cargo into units of one output
/// cargo. The accumulation buffer is only ever touched through
/// [`accumulate`](StationProcessor::accumulate) and
/// [`try_produce`](StationProcessor::try_produce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationProcessor {
    blueprint: Blueprint,
    buffer: BTreeMap<CargoType, u32>,
    output: CargoType,
    destinations: Vec<StationId>,
}

impl StationProcessor {
    pub fn new(blueprint: Blueprint, output: CargoType, destinations: &[StationId]) -> Self {
        Self {
            blueprint,
            buffer: BTreeMap::new(),
            output,
            destinations: destinations.to_vec(),
        }
    }

    /// A processor that needs no input. Its output is seeded as jobs instead of
    /// being produced from deliveries.
    pub fn generative(output: CargoType, destinations: &[StationId]) -> Self {
        Self::new(blueprint(&[(CargoType::None, 1)]), output, destinations)
    }

    pub fn is_generative(&self) -> bool {
        self.blueprint.is_empty()
            || (self.blueprint.len() == 1 && self.blueprint.contains_key(&CargoType::None))
    }

    /// A processor with output `None` consumes deliveries and produces nothing.
    pub fn is_sink(&self) -> bool {
        self.output == CargoType::None
    }

    pub fn output(&self) -> CargoType {
        self.output
    }

    pub fn destinations(&self) -> &[StationId] {
        &self.destinations
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Cargo types this processor takes as input, excluding the sentinel.
    pub fn inputs(&self) -> impl Iterator<Item = CargoType> + '_ {
        self.blueprint
            .keys()
            .copied()
            .filter(|c| *c != CargoType::None)
    }

    /// Whether deliveries of `cargo` are consumed by this processor.
    pub fn accepts(&self, cargo: CargoType) -> bool {
        self.blueprint.contains_key(&cargo)
    }

    /// Current buffered amount of `cargo`.
    pub fn buffered(&self, cargo: CargoType) -> u32 {
        self.buffer.get(&cargo).copied().unwrap_or(0)
    }

    pub fn accumulate(&mut self, cargo: CargoType, count: u32) {
        *self.buffer.entry(cargo).or_insert(0) += count;
    }

    /// Consume as many full blueprints as the buffer allows, in one step.
    ///
    /// Returns the number of output units produced. Generative processors
    /// never produce from their buffer.
    pub fn try_produce(&mut self) -> u32 {
        if self.is_generative() {
            return 0;
        }

        let units = self
            .blueprint
            .iter()
            .map(|(cargo, &need)| self.buffered(*cargo) / need.max(1))
            .min()
            .unwrap_or(0);

        if units == 0 {
            return 0;
        }

        for (cargo, &need) in &self.blueprint {
            if let Some(held) = self.buffer.get_mut(cargo) {
                *held -= units * need.max(1);
            }
        }

        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel_mill() -> StationProcessor {
        StationProcessor::new(
            blueprint(&[(CargoType::Coal, 1), (CargoType::IronOre, 2)]),
            CargoType::SteelSlabs,
            &[StationId::Gf, StationId::Mf],
        )
    }

    #[test]
    fn conservation_batch_production() {
        let mut proc = steel_mill();
        proc.accumulate(CargoType::Coal, 3);
        proc.accumulate(CargoType::IronOre, 5);

        assert_eq!(proc.try_produce(), 2);
        assert_eq!(proc.buffered(CargoType::Coal), 1);
        assert_eq!(proc.buffered(CargoType::IronOre), 1);

        // Nothing left for a second unit.
        assert_eq!(proc.try_produce(), 0);
        assert_eq!(proc.buffered(CargoType::Coal), 1);
    }

    #[test]
    fn missing_input_produces_nothing() {
        let mut proc = steel_mill();
        proc.accumulate(CargoType::IronOre, 10);
        assert_eq!(proc.try_produce(), 0);
        assert_eq!(proc.buffered(CargoType::IronOre), 10);
    }

    #[test]
    fn generative_detection() {
        let seeded = StationProcessor::generative(CargoType::Coal, &[StationId::Sm]);
        assert!(seeded.is_generative());

        let empty = StationProcessor::new(Blueprint::new(), CargoType::Coal, &[StationId::Sm]);
        assert!(empty.is_generative());

        assert!(!steel_mill().is_generative());
    }

    #[test]
    fn generative_never_produces_from_buffer() {
        let mut proc = StationProcessor::generative(CargoType::Coal, &[StationId::Sm]);
        proc.accumulate(CargoType::None, 50);
        assert_eq!(proc.try_produce(), 0);

        let mut empty = StationProcessor::new(Blueprint::new(), CargoType::Logs, &[]);
        assert_eq!(empty.try_produce(), 0);
    }

    #[test]
    fn inputs_skip_sentinel() {
        let seeded = StationProcessor::generative(CargoType::Coal, &[StationId::Sm]);
        assert_eq!(seeded.inputs().count(), 0);

        let inputs: Vec<CargoType> = steel_mill().inputs().collect();
        assert_eq!(inputs, vec![CargoType::Coal, CargoType::IronOre]);
    }

    #[test]
    fn accepts_only_blueprint_cargo() {
        let proc = steel_mill();
        assert!(proc.accepts(CargoType::Coal));
        assert!(!proc.accepts(CargoType::Logs));
    }

    #[test]
    fn sink_has_no_output() {
        let sink = StationProcessor::new(blueprint(&[(CargoType::Diesel, 1)]), CargoType::None, &[]);
        assert!(sink.is_sink());
        assert!(!steel_mill().is_sink());
    }
}
