pub mod asset;
pub mod fuel;
pub mod grid;
pub mod ignition;
pub mod inputs;
pub mod options;
pub mod outputs;
pub mod reference;
pub mod scenario;
pub mod weather;

pub use asset::{AssetFile, TargetFile};
pub use fuel::FuelDefinition;
pub use grid::{FuelBreak, FuelPatch, GridFile, WeatherGrid, WeatherPatch};
pub use ignition::Ignition;
pub use inputs::{InputFiles, WiseInputs};
pub use options::{
    BurningCondition, FbpOptions, FgmOptions, FmcOptions, FwiOptions, GustingOptions,
    StopModellingOptions,
};
pub use outputs::WiseOutputs;
pub use reference::{AssetReference, IgnitionReference, LayerInfo, StationStream, TargetReference};
pub use scenario::Scenario;
pub use weather::{WeatherStation, WeatherStream};
