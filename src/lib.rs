//! # dyssol
//!
//! Safe, name‑based Rust bindings for the
//! [Dyssol](https://github.com/FlowsheetSimulation/Dyssol-open) dynamic
//! flowsheet simulator: unit parameters, feeds, holdups and streams,
//! compounds, phases, distribution grids and solver options.
//!
//! ## Highlights
//!
//! * **Name‑based access**: units, feeds, holdups, streams and compounds
//!   are looked up by name; omitted feed/holdup/stream names default to
//!   the unit's first one
//! * **Typed parameters**: all seventeen parameter kinds read into a
//!   [`Value`] and are written back with strict, checked conversions
//! * **Uniform stream records**: `{overall, composition, distributions}`
//!   at one time point ([`StreamRecord`]) or over all of them
//!   ([`StreamSeries`])
//! * **Validated writes**: composition labels, distribution names and
//!   solver options are checked before anything is changed
//! * **Engine‑agnostic**: the simulator core sits behind the [`Engine`]
//!   traits; [`MemoryEngine`] ships as a self‑contained implementation
//!
//! ## Quick example
//!
//! ```no_run
//! use dyssol::{Config, Dyssol, MemoryEngine, StreamData};
//!
//! let config = Config::new("materials.json", "models/");
//! let mut sim = Dyssol::new(MemoryEngine::default(), config)?;
//! sim.open_flowsheet("granulation.json")?;
//!
//! sim.set_unit_feed(
//!     "Granulator",
//!     None,
//!     &StreamData::new()
//!         .overall("temperature", 320.0)
//!         .composition("Sand [solid]", 2.0),
//!     None,
//! )?;
//! sim.simulate(Some(600.0))?;
//!
//! let holdup = sim.get_unit_holdup("Granulator", None, 600.0)?;
//! println!("{holdup}");
//! # Ok::<(), dyssol::DyssolError>(())
//! ```
//!
//! ## Parameters
//!
//! ```no_run
//! use dyssol::{Dyssol, MemoryEngine};
//!
//! let mut sim = Dyssol::from_env(MemoryEngine::default())?;
//! sim.open_flowsheet("granulation.json")?;
//!
//! sim.set_unit_parameter("Granulator", "Model", "Kernel B")?;
//! sim.set_unit_parameter("Granulator", "Classes", "1, 2, 4")?;
//! sim.set_unit_parameter("Granulator", "Rate", vec![(0.0, 1.0), (60.0, 2.5)])?;
//!
//! for (name, entry) in sim.get_unit_parameters("Granulator")? {
//!     println!("{name:<20} {entry}");
//! }
//! # Ok::<(), dyssol::DyssolError>(())
//! ```
//!
//! ## Configuration
//!
//! [`Config::from_env`] reads `DYSSOL_MATERIALS_PATH` and
//! `DYSSOL_MODELS_PATH` (a `.env` file is honoured) and otherwise probes
//! the platform's standard install locations.

// ── Internal modules ─────────────────────────────────────────────────
pub mod backend;
pub mod compounds;
pub mod config;
pub mod engine;
pub mod error;
pub mod grids;
pub mod mutation;
pub mod names;
pub mod options;
pub mod parameters;
pub mod projection;
pub mod records;
pub mod simulator;
pub mod value;

// ── Public re-exports ────────────────────────────────────────────────
pub use backend::memory::{MemoryEngine, MemoryFlowsheet, MemoryMaterials, MemoryModels, MemoryUnit};
pub use config::Config;
pub use engine::{Engine, Flowsheet, MaterialsDatabase, ModelsRegistry, StreamKind, StreamLike, Unit};
pub use error::{DyssolError, Result};
pub use grids::GridSpec;
pub use mutation::StreamData;
pub use names::{DistrType, OverallProperty, Phase, PhaseSpec};
pub use options::{ConvergenceMethod, ExtrapolationMethod, SimulationOptions};
pub use parameters::{ParameterEntry, ParameterKind, ParameterValue, UnitParameter};
pub use records::{FlowsheetSummary, ModelInfo, StreamRecord, StreamSeries, TimeSeries, UnitTopology};
pub use simulator::Dyssol;
pub use value::{ReactionRecord, SubstanceRecord, Value};
