pub mod loader;
pub mod schema;

pub use loader::{ConfigError, load_config, load_config_or_default, load_scenario};
pub use schema::{ScenarioScript, ScenarioStep};
