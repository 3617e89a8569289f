//! Contract of the wrapped simulation engine.
//!
//! The binding never owns engine entities: it borrows them through the
//! traits below for the duration of one call. [`crate::backend::memory`]
//! provides an in‑memory implementation; a native engine plugs in by
//! implementing the same traits.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::names::{DistrType, OverallProperty, Phase};
use crate::options::SimulationOptions;
use crate::parameters::UnitParameter;

// ── Plain engine data ───────────────────────────────────────────────

/// A compound registered in the materials database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compound {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    pub state: Phase,
    pub name: String,
}

/// Classes of one grid dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridClasses {
    /// Class limits; a dimension with `n` limits has `n - 1` classes.
    Numeric(Vec<f64>),
    /// Class names.
    Symbolic(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDimension {
    pub kind: DistrType,
    pub classes: GridClasses,
}

impl GridDimension {
    pub fn classes_count(&self) -> usize {
        match &self.classes {
            GridClasses::Numeric(limits) => limits.len().saturating_sub(1),
            GridClasses::Symbolic(names) => names.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    Undefined,
}

impl PortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
            PortDirection::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    /// Name of the connected flowsheet stream.
    pub stream: Option<String>,
}

/// Identity of a unit model as published by its plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique model ID.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
}

/// The three stream‑like collections a unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Feed,
    Holdup,
    Stream,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Feed => "Feed",
            StreamKind::Holdup => "Holdup",
            StreamKind::Stream => "Stream",
        }
    }

    /// Holdups store mass; everything else stores mass flow.
    pub fn is_flowing(self) -> bool {
        !matches!(self, StreamKind::Holdup)
    }
}

// ── Stream‑like capability ──────────────────────────────────────────

/// Read/write surface shared by feeds, holdups, unit streams and
/// flowsheet streams.
///
/// Reads at a time between two stored points are interpolated by the
/// engine; writes create the time point if it does not exist yet.
pub trait StreamLike {
    /// Sorted time points written so far.
    fn time_points(&self) -> Vec<f64>;

    fn overall(&self, time: f64, property: OverallProperty) -> f64;
    fn compound_mass(&self, time: f64, compound: &str, phase: Phase) -> f64;
    fn phase_mass(&self, time: f64, phase: Phase) -> f64;
    /// Distribution over one grid dimension, empty if the dimension is
    /// not defined.
    fn distribution(&self, time: f64, kind: DistrType) -> Vec<f64>;

    fn set_overall(&mut self, time: f64, property: OverallProperty, value: f64);
    fn set_compound_mass(&mut self, time: f64, compound: &str, phase: Phase, value: f64);
    fn set_phase_mass(&mut self, time: f64, phase: Phase, value: f64);
    fn set_distribution(&mut self, time: f64, kind: DistrType, values: &[f64]);

    /// Drops the time point at `time`; no effect if it does not exist.
    fn remove_time_point(&mut self, time: f64);
}

// ── Units ───────────────────────────────────────────────────────────

pub trait Unit {
    fn name(&self) -> &str;
    fn key(&self) -> &str;

    /// Model assigned to this unit, if any.
    fn model(&self) -> Option<&ModelDescriptor>;
    fn ports(&self) -> &[Port];

    /// All parameters in declaration order.
    fn parameters(&self) -> &[UnitParameter];
    fn parameter_mut(&mut self, name: &str) -> Option<&mut UnitParameter>;
    /// Names of the parameters in effect given the current selector
    /// values, in declaration order.
    fn active_parameters(&self) -> Vec<String>;

    fn parameter(&self, name: &str) -> Option<&UnitParameter> {
        self.parameters().iter().find(|p| p.name == name)
    }

    /// Names of feeds, holdups or internal streams, in registration order.
    fn stream_names(&self, kind: StreamKind) -> Vec<String>;
    fn stream_like(&self, kind: StreamKind, name: &str) -> Option<&dyn StreamLike>;
    fn stream_like_mut(&mut self, kind: StreamKind, name: &str) -> Option<&mut dyn StreamLike>;
    /// Initial‑state copy of a feed or holdup, restored on every
    /// initialization. Internal streams have none.
    fn initial_mut(&mut self, kind: StreamKind, name: &str) -> Option<&mut dyn StreamLike>;
}

// ── Flowsheet ───────────────────────────────────────────────────────

pub trait Flowsheet {
    fn units(&self) -> Vec<&dyn Unit>;
    fn unit(&self, name: &str) -> Option<&dyn Unit>;
    fn unit_mut(&mut self, name: &str) -> Option<&mut dyn Unit>;

    fn stream_names(&self) -> Vec<String>;
    fn stream(&self, name: &str) -> Option<&dyn StreamLike>;
    fn stream_mut(&mut self, name: &str) -> Option<&mut dyn StreamLike>;

    /// Compound keys, in flowsheet order.
    fn compounds(&self) -> &[String];
    fn set_compounds(&mut self, keys: Vec<String>);
    fn add_compound(&mut self, key: &str);

    fn phases(&self) -> &[PhaseDescriptor];
    fn set_phases(&mut self, phases: Vec<PhaseDescriptor>);
    fn add_phase(&mut self, state: Phase, name: &str);

    /// All grid dimensions, including the compound dimension.
    fn grid(&self) -> &[GridDimension];
    /// Replaces every dimension except [`DistrType::Compounds`].
    fn set_grid(&mut self, dimensions: Vec<GridDimension>);

    fn options(&self) -> &SimulationOptions;
    fn options_mut(&mut self) -> &mut SimulationOptions;

    /// Prepares the flowsheet for simulation. Returns an empty string on
    /// success, the engine's error message otherwise.
    fn initialize(&mut self) -> String;
    /// Runs the solver over the configured time window.
    fn simulate(&mut self) -> Result<()>;

    fn load_from_file(&mut self, path: &Path) -> Result<()>;
    /// Fallback loader that bypasses the engine's file handler.
    fn load_direct(&mut self, path: &Path) -> Result<()>;
    fn save_to_file(&self, path: &Path) -> Result<()>;
    fn clear(&mut self);
}

// ── Shared resources ────────────────────────────────────────────────

pub trait MaterialsDatabase {
    fn load_from_file(&mut self, path: &Path) -> Result<()>;
    fn compounds(&self) -> &[Compound];

    fn compound(&self, key: &str) -> Option<&Compound> {
        self.compounds().iter().find(|c| c.key == key)
    }

    fn compound_by_name(&self, name: &str) -> Option<&Compound> {
        self.compounds().iter().find(|c| c.name == name)
    }
}

pub trait ModelsRegistry {
    fn add_dir(&mut self, path: &Path) -> Result<()>;
    fn available_models(&self) -> &[ModelDescriptor];

    fn model(&self, key: &str) -> Option<&ModelDescriptor> {
        self.available_models().iter().find(|m| m.key == key)
    }
}

/// Bundle of the engine components the binding drives.
pub trait Engine {
    type Flowsheet: Flowsheet;
    type Materials: MaterialsDatabase;
    type Models: ModelsRegistry;

    fn into_parts(self) -> (Self::Flowsheet, Self::Materials, Self::Models);
}
