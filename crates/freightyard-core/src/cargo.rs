//! Static cargo catalog.
//!
//! Every cargo type belongs to exactly one wage category. The mapping is a
//! closed, exhaustive match: adding a cargo type without deciding its
//! category does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wage tier of a cargo type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CargoCategory {
    Raw,
    Danger,
    Easy,
    Complex,
}

impl CargoCategory {
    /// Base wage per car.
    pub fn base_wage(self) -> u32 {
        match self {
            CargoCategory::Raw => 400,
            CargoCategory::Danger => 1000,
            CargoCategory::Easy => 600,
            CargoCategory::Complex => 800,
        }
    }
}

/// A cargo type. `None` is the "no input" sentinel used by generative
/// blueprints and sink processors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CargoType {
    None,
    Coal,
    IronOre,
    CrudeOil,
    Diesel,
    Gasoline,
    Methane,
    Logs,
    Boards,
    Plywood,
    Wheat,
    Corn,
    Pigs,
    Cows,
    Chickens,
    Sheep,
    Goats,
    Bread,
    DairyProducts,
    MeatProducts,
    CannedFood,
    CatFood,
    SteelRolls,
    SteelBillets,
    SteelSlabs,
    SteelBentPlates,
    SteelRails,
    ScrapMetal,
    ElectronicsIskar,
    ElectronicsKrugmann,
    #[serde(rename = "ElectronicsAAG")]
    ElectronicsAag,
    ElectronicsNovae,
    ElectronicsTraeg,
    ToolsIskar,
    ToolsBrohm,
    #[serde(rename = "ToolsAAG")]
    ToolsAag,
    ToolsNovae,
    ToolsTraeg,
    Furniture,
    Pipes,
    ClothingObco,
    ClothingNeoGamma,
    ClothingNovae,
    ClothingTraeg,
    Medicine,
    ChemicalsIskar,
    ChemicalsSperex,
    NewCars,
    ImportedNewCars,
    Tractors,
    Excavators,
    Alcohol,
    Acetylene,
    CryoOxygen,
    CryoHydrogen,
    Argon,
    Nitrogen,
    Ammonia,
    SodiumHydroxide,
    SpentNuclearFuel,
    Ammunition,
    Biohazard,
    Tanks,
    MilitaryTrucks,
    MilitarySupplies,
    EmptySunOmni,
    EmptyIskar,
    EmptyObco,
    EmptyGoorsk,
    EmptyKrugmann,
    EmptyBrohm,
    #[serde(rename = "EmptyAAG")]
    EmptyAag,
    EmptySperex,
    EmptyNovae,
    EmptyTraeg,
    EmptyChemlek,
    EmptyNeoGamma,
}

impl CargoType {
    pub const ALL: [CargoType; 77] = [
        CargoType::None,
        CargoType::Coal,
        CargoType::IronOre,
        CargoType::CrudeOil,
        CargoType::Diesel,
        CargoType::Gasoline,
        CargoType::Methane,
        CargoType::Logs,
        CargoType::Boards,
        CargoType::Plywood,
        CargoType::Wheat,
        CargoType::Corn,
        CargoType::Pigs,
        CargoType::Cows,
        CargoType::Chickens,
        CargoType::Sheep,
        CargoType::Goats,
        CargoType::Bread,
        CargoType::DairyProducts,
        CargoType::MeatProducts,
        CargoType::CannedFood,
        CargoType::CatFood,
        CargoType::SteelRolls,
        CargoType::SteelBillets,
        CargoType::SteelSlabs,
        CargoType::SteelBentPlates,
        CargoType::SteelRails,
        CargoType::ScrapMetal,
        CargoType::ElectronicsIskar,
        CargoType::ElectronicsKrugmann,
        CargoType::ElectronicsAag,
        CargoType::ElectronicsNovae,
        CargoType::ElectronicsTraeg,
        CargoType::ToolsIskar,
        CargoType::ToolsBrohm,
        CargoType::ToolsAag,
        CargoType::ToolsNovae,
        CargoType::ToolsTraeg,
        CargoType::Furniture,
        CargoType::Pipes,
        CargoType::ClothingObco,
        CargoType::ClothingNeoGamma,
        CargoType::ClothingNovae,
        CargoType::ClothingTraeg,
        CargoType::Medicine,
        CargoType::ChemicalsIskar,
        CargoType::ChemicalsSperex,
        CargoType::NewCars,
        CargoType::ImportedNewCars,
        CargoType::Tractors,
        CargoType::Excavators,
        CargoType::Alcohol,
        CargoType::Acetylene,
        CargoType::CryoOxygen,
        CargoType::CryoHydrogen,
        CargoType::Argon,
        CargoType::Nitrogen,
        CargoType::Ammonia,
        CargoType::SodiumHydroxide,
        CargoType::SpentNuclearFuel,
        CargoType::Ammunition,
        CargoType::Biohazard,
        CargoType::Tanks,
        CargoType::MilitaryTrucks,
        CargoType::MilitarySupplies,
        CargoType::EmptySunOmni,
        CargoType::EmptyIskar,
        CargoType::EmptyObco,
        CargoType::EmptyGoorsk,
        CargoType::EmptyKrugmann,
        CargoType::EmptyBrohm,
        CargoType::EmptyAag,
        CargoType::EmptySperex,
        CargoType::EmptyNovae,
        CargoType::EmptyTraeg,
        CargoType::EmptyChemlek,
        CargoType::EmptyNeoGamma,
    ];

    pub fn category(self) -> CargoCategory {
        use CargoType::*;
        match self {
            None | Coal | IronOre | Logs | Wheat | Corn | Pigs | Cows | Chickens | Sheep
            | Goats | ScrapMetal | EmptySunOmni | EmptyIskar | EmptyObco | EmptyGoorsk
            | EmptyKrugmann | EmptyBrohm | EmptyAag | EmptySperex | EmptyNovae | EmptyTraeg
            | EmptyChemlek | EmptyNeoGamma => CargoCategory::Raw,

            CrudeOil | Diesel | Gasoline | Methane | Acetylene | CryoOxygen | CryoHydrogen
            | Argon | Nitrogen | Ammonia | SodiumHydroxide | SpentNuclearFuel | Ammunition
            | Biohazard | Tanks => CargoCategory::Danger,

            Boards | Plywood | Bread | DairyProducts | MeatProducts | CannedFood | CatFood
            | SteelRolls | SteelBillets | SteelSlabs | SteelBentPlates | SteelRails | Pipes
            | Alcohol => CargoCategory::Easy,

            ElectronicsIskar | ElectronicsKrugmann | ElectronicsAag | ElectronicsNovae
            | ElectronicsTraeg | ToolsIskar | ToolsBrohm | ToolsAag | ToolsNovae | ToolsTraeg
            | Furniture | ClothingObco | ClothingNeoGamma | ClothingNovae | ClothingTraeg
            | Medicine | ChemicalsIskar | ChemicalsSperex | NewCars | ImportedNewCars
            | Tractors | Excavators | MilitaryTrucks | MilitarySupplies => CargoCategory::Complex,
        }
    }

    /// Base wage per car, derived from the category.
    pub fn base_wage(self) -> u32 {
        self.category().base_wage()
    }

    /// Name as it appears on the wire.
    pub fn name(self) -> String {
        match self {
            CargoType::ElectronicsAag => "ElectronicsAAG".to_string(),
            CargoType::ToolsAag => "ToolsAAG".to_string(),
            CargoType::EmptyAag => "EmptyAAG".to_string(),
            other => format!("{other:?}"),
        }
    }
}

impl fmt::Display for CargoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
