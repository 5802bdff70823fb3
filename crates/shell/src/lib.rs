//! Shell-textured fur: the instance lifecycle and parameter publishing core.
//!
//! A fur is a stack of shells, each a copy of one base mesh drawn with one
//! shared material and tagged with its layer index. [`ShellInstanceSet`] builds
//! and destroys the stack, [`ParameterBank`] pushes the shaping parameters to
//! the shader surfaces, and [`DisplacementIntegrator`] turns per-frame input
//! into the bounded lean vector. [`ShellFur`] exposes all of it to a host
//! through lifecycle hooks.

mod bank;
mod config;
mod displacement;
mod error;
mod fur;
mod instances;
mod locomotion;
mod params;
mod stage;

pub use bank::ParameterBank;
pub use config::{FurConfig, MaterialSourceConfig};
pub use displacement::{DEFAULT_DECAY_RATE, DisplacementIntegrator};
pub use error::{ConfigError, ShellError};
pub use fur::{MaterialSource, ShellFur};
pub use instances::{ShellInstance, ShellInstanceSet};
pub use locomotion::LocomotionDriver;
pub use params::{ParameterField, ParameterSet};
pub use stage::Stage;
