//! Object model, validation and wire serialization for WISE jobs.

pub mod calc;
pub mod duration;
pub mod error;
pub mod geo;
pub mod id;
pub mod job;
pub mod model;
pub mod validation;
pub mod wire;

pub use duration::Duration;
pub use error::{Result, WiseError};
pub use job::{JobOptions, Wise};
pub use validation::{Validate, ValidationError};
