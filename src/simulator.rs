//! The [`Dyssol`] façade: name‑based access to a flowsheet, its units,
//! stream‑likes, compounds, phases, grids and solver options.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::compounds::{compound_display_name, resolve_compound};
use crate::config::Config;
use crate::engine::*;
use crate::error::*;
use crate::grids::{read_grids, validate_grids, with_grid, GridSpec};
use crate::mutation::{series_slices, StreamData, StreamUpdate, DEFAULT_TIME};
use crate::names::{DistrType, OverallProperty, Phase, PhaseSpec};
use crate::options::{option_methods, read_options, write_options};
use crate::parameters::{
    combo_options, dependent_parameters, dependent_values, list_parameters, read_reactions,
    read_value, remap_reactions, write_value, ChemicalReaction, ParameterEntry, ParameterValue,
    UnitParameter, WriteContext,
};
use crate::projection::{
    project, project_composition, project_composition_series, project_distribution_series,
    project_distributions, project_overall, project_overall_series, project_series, Catalog, TIME_EPS,
};
use crate::records::{FlowsheetSummary, ModelInfo, StreamRecord, StreamSeries, TimeSeries, UnitTopology};
use crate::value::{ReactionRecord, Value};

/// Model name reported for units whose model is not in the registry.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// A flowsheet simulation session bound to one engine.
///
/// Every lookup goes by name; every failure is a [`DyssolError`].
///
/// ```no_run
/// use dyssol::{Dyssol, MemoryEngine};
///
/// let mut sim = Dyssol::from_env(MemoryEngine::default())?;
/// sim.open_flowsheet("plant.json")?;
/// sim.simulate(Some(600.0))?;
/// let outlet = sim.get_stream("Outlet", 600.0)?;
/// println!("{outlet}");
/// # Ok::<(), dyssol::DyssolError>(())
/// ```
pub struct Dyssol<E: Engine> {
    flowsheet: E::Flowsheet,
    materials: E::Materials,
    models: E::Models,
    config: Option<Config>,
    initialized: bool,
    last_simulation_time: Option<Duration>,
}

impl<E: Engine> fmt::Debug for Dyssol<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dyssol")
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("units", &self.flowsheet.units().len())
            .field("compounds", &self.flowsheet.compounds().len())
            .finish()
    }
}

impl<E: Engine> Dyssol<E> {
    // ── Construction ────────────────────────────────────────────────

    /// Wrap `engine`, loading the materials database and registering the
    /// models directory named by `config`.
    pub fn new(engine: E, config: Config) -> Result<Self> {
        let mut sim = Self::with_engine(engine);
        sim.materials
            .load_from_file(&config.materials_path)
            .map_err(|e| {
                DyssolError::LoadFailed(format!(
                    "Failed to load default materials database {}: {e}",
                    config.materials_path.display()
                ))
            })?;
        sim.add_models_dir(&config.models_path).map_err(|e| {
            DyssolError::LoadFailed(format!(
                "Failed to add default model path {}: {e}",
                config.models_path.display()
            ))
        })?;
        sim.config = Some(config);
        Ok(sim)
    }

    /// Like [`Dyssol::new`], with paths from [`Config::from_env`].
    pub fn from_env(engine: E) -> Result<Self> {
        Self::new(engine, Config::from_env()?)
    }

    /// Wrap an engine whose materials and models are already in place.
    pub fn with_engine(engine: E) -> Self {
        let (flowsheet, materials, models) = engine.into_parts();
        Self {
            flowsheet,
            materials,
            models,
            config: None,
            initialized: false,
            last_simulation_time: None,
        }
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn flowsheet(&self) -> &E::Flowsheet {
        &self.flowsheet
    }

    pub fn materials(&self) -> &E::Materials {
        &self.materials
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Wall‑clock duration of the last completed [`Dyssol::simulate`].
    pub fn last_simulation_time(&self) -> Option<Duration> {
        self.last_simulation_time
    }

    // ── Materials and models ────────────────────────────────────────

    /// Replace the materials database. Returns `false` (and logs) on
    /// failure.
    pub fn load_materials_database(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.materials.load_from_file(path) {
            Ok(()) => {
                debug!(
                    "Materials database {} loaded: {} compounds",
                    path.display(),
                    self.materials.compounds().len()
                );
                true
            }
            Err(e) => {
                warn!("Failed to load materials database {}: {e}", path.display());
                false
            }
        }
    }

    /// Register a directory of unit models. Returns `false` (and logs) if
    /// the directory cannot be read or no models are available afterwards.
    pub fn add_model_path(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.add_models_dir(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    fn add_models_dir(&mut self, path: &Path) -> Result<()> {
        self.models.add_dir(path)?;
        let models = self.models.available_models();
        if models.is_empty() {
            return Err(DyssolError::LoadFailed(format!(
                "No models found in path: {}",
                path.display()
            )));
        }
        for m in models {
            debug!("Found model: {} ({})", m.name, m.key);
        }
        Ok(())
    }

    /// `(key, name, author)` of every registered model.
    pub fn get_available_models(&self) -> Vec<ModelDescriptor> {
        self.models.available_models().to_vec()
    }

    /// `(name, key)` of every compound in the materials database.
    pub fn get_database_compounds(&self) -> Vec<(String, String)> {
        self.materials
            .compounds()
            .iter()
            .map(|c| (c.name.clone(), c.key.clone()))
            .collect()
    }

    // ── Flowsheet lifecycle ─────────────────────────────────────────

    /// Load a flowsheet file and initialize it.
    ///
    /// The engine's regular loader is tried first, then its direct loader.
    /// An initialization failure is logged; the flowsheet stays open.
    pub fn open_flowsheet(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Opening flowsheet: {}", path.display());
        if !path.exists() {
            return Err(DyssolError::LoadFailed(format!(
                "Flowsheet file does not exist: {}",
                path.display()
            )));
        }

        self.initialized = false;
        if let Err(first) = self.flowsheet.load_from_file(path) {
            debug!("Regular loader failed ({first}); trying direct loader");
            self.flowsheet.load_direct(path).map_err(|second| {
                DyssolError::LoadFailed(format!(
                    "Failed to load {} with both loaders: {first}; {second}",
                    path.display()
                ))
            })?;
        }
        debug!(
            "Flowsheet loaded: {} units, {} streams",
            self.flowsheet.units().len(),
            self.flowsheet.stream_names().len()
        );

        let error = self.initialize();
        if !error.is_empty() {
            warn!("Flowsheet opened but not initialized: {error}");
        }
        Ok(())
    }

    /// Write the flowsheet, creating missing parent directories.
    pub fn save_flowsheet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Saving flowsheet to: {}", path.display());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    DyssolError::SaveFailed(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        self.flowsheet
            .save_to_file(path)
            .map_err(|e| DyssolError::SaveFailed(format!("{}: {e}", path.display())))?;
        if !path.exists() {
            return Err(DyssolError::SaveFailed(format!(
                "File was not created on disk: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Drop every unit, stream, compound and phase.
    pub fn close_flowsheet(&mut self) {
        info!("Closing current flowsheet");
        self.flowsheet.clear();
        self.initialized = false;
    }

    /// Initialize the flowsheet; returns the engine's error message, empty
    /// on success.
    pub fn initialize(&mut self) -> String {
        let error = self.flowsheet.initialize();
        self.initialized = error.is_empty();
        if self.initialized {
            debug!("Flowsheet initialized");
        } else {
            warn!("Initialization failed: {error}");
        }
        error
    }

    /// Run the solver. A positive `end_time` replaces the configured end
    /// time; the start time is kept.
    pub fn simulate(&mut self, end_time: Option<f64>) -> Result<()> {
        if let Some(end) = end_time.filter(|t| *t > 0.0) {
            info!("Overriding simulation end time to: {end} s");
            self.flowsheet.options_mut().end_simulation_time = end;
        }
        if !self.initialized {
            let error = self.initialize();
            if !error.is_empty() {
                return Err(DyssolError::Engine(format!(
                    "Flowsheet initialization failed: {error}"
                )));
            }
        }

        let (start, end) = {
            let o = self.flowsheet.options();
            (o.start_simulation_time, o.end_simulation_time)
        };
        for (unit, model) in self.get_units() {
            info!("Simulation of {unit} ({model}): [{start}, {end}]");
        }

        let clock = Instant::now();
        self.flowsheet.simulate()?;
        let elapsed = clock.elapsed();
        self.last_simulation_time = Some(elapsed);
        info!("Simulation finished in {:.3} [s]", elapsed.as_secs_f64());
        Ok(())
    }

    // ── Introspection ───────────────────────────────────────────────

    fn model_name(&self, unit: &dyn Unit) -> String {
        unit.model()
            .and_then(|m| self.models.model(&m.key))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string())
    }

    /// `(unit, model name)` in flowsheet order.
    pub fn get_units(&self) -> Vec<(String, String)> {
        self.flowsheet
            .units()
            .into_iter()
            .map(|u| (u.name().to_string(), self.model_name(u)))
            .collect()
    }

    pub fn get_units_dict(&self) -> BTreeMap<String, String> {
        self.get_units().into_iter().collect()
    }

    pub fn get_model_info(&self, unit_name: &str) -> Result<ModelInfo> {
        let unit = self.unit(unit_name)?;
        let model = unit
            .model()
            .ok_or_else(|| DyssolError::NotFound(format!("Model of unit '{unit_name}'")))?;
        Ok(ModelInfo {
            unit: unit.name().to_string(),
            key: model.key.clone(),
            model: self.model_name(unit),
            author: model.author.clone(),
            ports: unit
                .ports()
                .iter()
                .map(|p| (p.name.clone(), p.direction.as_str().to_string()))
                .collect(),
            parameters: list_parameters(unit, &self.materials, false),
            holdups: unit.stream_names(StreamKind::Holdup),
            feeds: unit.stream_names(StreamKind::Feed),
            streams: unit.stream_names(StreamKind::Stream),
        })
    }

    /// Port connections of every unit.
    pub fn get_topology(&self) -> Vec<UnitTopology> {
        self.flowsheet
            .units()
            .into_iter()
            .map(|u| UnitTopology {
                unit: u.name().to_string(),
                model: u
                    .model()
                    .map(|m| if m.name.is_empty() { m.key.clone() } else { m.name.clone() })
                    .unwrap_or_default(),
                ports: u
                    .ports()
                    .iter()
                    .map(|p| (p.name.clone(), p.stream.clone().unwrap_or_default()))
                    .collect(),
            })
            .collect()
    }

    /// Static sanity check of the flowsheet; returns an empty string when
    /// nothing is wrong, otherwise the first problem found.
    pub fn validate_calculation_sequence(&self) -> String {
        let units = self.flowsheet.units();
        if units.is_empty() {
            return "No units defined in flowsheet".to_string();
        }
        if self.flowsheet.compounds().is_empty() {
            return "No compounds defined in flowsheet".to_string();
        }
        if self.flowsheet.phases().is_empty() {
            return "No phases defined in flowsheet".to_string();
        }

        let mut details = String::new();
        let has_feed = units.iter().any(|u| {
            let feeds = u.stream_names(StreamKind::Feed);
            if feeds.is_empty() {
                details.push_str(&format!("Unit '{}' has no feeds defined.\n", u.name()));
                return false;
            }
            feeds.iter().any(|f| {
                let flow = u
                    .stream_like(StreamKind::Feed, f)
                    .map(|s| s.overall(0.0, OverallProperty::Mass))
                    .unwrap_or(0.0);
                if flow <= 0.0 {
                    details.push_str(&format!(
                        "Feed '{f}' for unit '{}' has no valid mass flow at time 0.0.\n",
                        u.name()
                    ));
                }
                flow > 0.0
            })
        });
        if !has_feed {
            return format!("No valid feed data defined for any unit:\n{details}");
        }

        for u in &units {
            if u.model().is_none() {
                return format!("Unit '{}' has no model assigned", u.name());
            }
            if u.ports().iter().all(|p| p.stream.is_none()) {
                return format!("Unit '{}' has no stream connections", u.name());
            }
        }
        String::new()
    }

    pub fn debug_flowsheet(&self) -> FlowsheetSummary {
        FlowsheetSummary {
            units: self.get_units(),
            streams: self.flowsheet.stream_names(),
            compounds: self
                .flowsheet
                .compounds()
                .iter()
                .map(|k| {
                    self.materials
                        .compound(k)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| format!("[Not Found in Database] {k}"))
                })
                .collect(),
            phases: self
                .flowsheet
                .phases()
                .iter()
                .map(|p| (p.name.clone(), p.state.as_str().to_string()))
                .collect(),
        }
    }

    // ── Compounds and phases ────────────────────────────────────────

    /// `(name, key)` of every flowsheet compound; unknown keys report the
    /// key as name and `[unknown]` as key.
    pub fn get_compounds(&self) -> Vec<(String, String)> {
        self.flowsheet
            .compounds()
            .iter()
            .map(|k| match self.materials.compound(k) {
                Some(c) => (c.name.clone(), c.key.clone()),
                None => (k.clone(), "[unknown]".to_string()),
            })
            .collect()
    }

    /// Replace the compound list. Every entry (key or name) must resolve;
    /// otherwise nothing changes and the unresolved entries are reported.
    /// Reaction base substances follow their key into the new order; a
    /// reaction whose base substance is dropped fails the whole call.
    pub fn set_compounds<S: AsRef<str>>(&mut self, compounds: &[S]) -> Result<()> {
        let mut keys = Vec::with_capacity(compounds.len());
        let mut missing = Vec::new();
        for c in compounds {
            match resolve_compound(&self.materials, c.as_ref()) {
                Ok(found) => keys.push(found.key.clone()),
                Err(_) => missing.push(c.as_ref().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(DyssolError::NotFound(format!(
                "Compounds: {}",
                missing.join(", ")
            )));
        }

        let reactions = self.remapped_reactions(&keys)?;
        for (unit, name, remapped) in reactions {
            if let Some(param) = self
                .flowsheet
                .unit_mut(&unit)
                .and_then(|u| u.parameter_mut(&name))
            {
                debug!("Reactions of '{name}' in unit '{unit}' follow the new compound order");
                param.value = ParameterValue::Reaction(remapped);
            }
        }
        self.flowsheet.set_compounds(keys);
        self.initialized = false;
        Ok(())
    }

    /// Every reaction parameter rewritten for the compound list `keys`.
    fn remapped_reactions(&self, keys: &[String]) -> Result<Vec<(String, String, Vec<ChemicalReaction>)>> {
        let old = self.flowsheet.compounds();
        let mut out = Vec::new();
        for unit in self.flowsheet.units() {
            for param in unit.parameters() {
                if let ParameterValue::Reaction(reactions) = &param.value {
                    let remapped = remap_reactions(reactions, old, keys).map_err(|e| match e {
                        DyssolError::NotFound(msg) => DyssolError::NotFound(format!(
                            "{msg} (parameter '{}' of unit '{}')",
                            param.name,
                            unit.name()
                        )),
                        other => other,
                    })?;
                    out.push((unit.name().to_string(), param.name.clone(), remapped));
                }
            }
        }
        Ok(out)
    }

    pub fn add_compound(&mut self, key_or_name: &str) -> Result<()> {
        let key = resolve_compound(&self.materials, key_or_name)?.key.clone();
        self.flowsheet.add_compound(&key);
        self.initialized = false;
        Ok(())
    }

    /// `(display name, state)` of every flowsheet phase.
    pub fn get_phases(&self) -> Vec<(String, Phase)> {
        self.flowsheet
            .phases()
            .iter()
            .map(|p| (p.name.clone(), p.state))
            .collect()
    }

    pub fn set_phases<P: Into<PhaseSpec> + Clone>(&mut self, phases: &[P]) -> Result<()> {
        let descriptors = phases
            .iter()
            .map(|p| {
                let state = p.clone().into().resolve()?;
                Ok(PhaseDescriptor {
                    state,
                    name: state.as_str().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.flowsheet.set_phases(descriptors);
        self.initialized = false;
        Ok(())
    }

    pub fn add_phase(&mut self, phase: impl Into<PhaseSpec>) -> Result<()> {
        let state = phase.into().resolve()?;
        self.flowsheet.add_phase(state, state.as_str());
        self.initialized = false;
        Ok(())
    }

    // ── Grids ───────────────────────────────────────────────────────

    /// Every distribution grid except the compound one.
    pub fn get_grids(&self) -> Vec<GridSpec> {
        read_grids(self.flowsheet.grid())
    }

    /// Replace every non‑compound grid. All specs are validated first.
    pub fn set_grids(&mut self, grids: &[GridSpec]) -> Result<()> {
        let dimensions = validate_grids(grids)?;
        self.flowsheet.set_grid(dimensions);
        self.initialized = false;
        Ok(())
    }

    /// Add one grid, replacing an existing grid of the same type.
    pub fn add_grid(&mut self, grid: &GridSpec) -> Result<()> {
        let dimensions = with_grid(self.flowsheet.grid(), grid)?;
        self.flowsheet.set_grid(dimensions);
        self.initialized = false;
        Ok(())
    }

    // ── Unit parameters ─────────────────────────────────────────────

    fn unit(&self, name: &str) -> Result<&dyn Unit> {
        self.flowsheet
            .unit(name)
            .ok_or_else(|| DyssolError::NotFound(format!("Unit '{name}'")))
    }

    fn parameter<'a>(unit: &'a dyn Unit, name: &str) -> Result<&'a UnitParameter> {
        unit.parameter(name).ok_or_else(|| {
            DyssolError::NotFound(format!("Parameter '{name}' in unit '{}'", unit.name()))
        })
    }

    pub fn get_unit_parameter(&self, unit: &str, name: &str) -> Result<Value> {
        let unit = self.unit(unit)?;
        Ok(read_value(Self::parameter(unit, name)?, &self.materials))
    }

    /// Active parameters with value, kind and units.
    pub fn get_unit_parameters(&self, unit: &str) -> Result<IndexMap<String, ParameterEntry>> {
        Ok(list_parameters(self.unit(unit)?, &self.materials, true))
    }

    pub fn get_unit_parameters_all(&self, unit: &str) -> Result<IndexMap<String, ParameterEntry>> {
        Ok(list_parameters(self.unit(unit)?, &self.materials, false))
    }

    pub fn set_unit_parameter(&mut self, unit: &str, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let compounds = self.flowsheet.compounds().to_vec();
        let ctx = WriteContext {
            db: &self.materials,
            compounds: &compounds,
        };
        let unit = self
            .flowsheet
            .unit_mut(unit)
            .ok_or_else(|| DyssolError::NotFound(format!("Unit '{unit}'")))?;
        let unit_name = unit.name().to_string();
        let param = unit.parameter_mut(name).ok_or_else(|| {
            DyssolError::NotFound(format!("Parameter '{name}' in unit '{unit_name}'"))
        })?;
        write_value(param, &value, &ctx)
    }

    pub fn get_combo_options(&self, unit: &str, name: &str) -> Result<Vec<String>> {
        combo_options(Self::parameter(self.unit(unit)?, name)?)
    }

    pub fn get_dependent_parameter_values(&self, unit: &str, name: &str) -> Result<Vec<(f64, f64)>> {
        let unit = self.unit(unit)?;
        dependent_values(Self::parameter(unit, name)?, unit.parameters())
    }

    /// Every dependent parameter of a unit with its `(x, y)` pairs.
    pub fn get_dependent_parameters(&self, unit: &str) -> Result<IndexMap<String, Vec<(f64, f64)>>> {
        Ok(dependent_parameters(self.unit(unit)?.parameters()))
    }

    /// Reactions of a reaction parameter, in the format
    /// [`Dyssol::set_unit_parameter`] accepts.
    pub fn get_unit_reactions(&self, unit: &str, name: &str) -> Result<Vec<ReactionRecord>> {
        read_reactions(Self::parameter(self.unit(unit)?, name)?, self.flowsheet.compounds())
    }

    // ── Stream‑like lookup ──────────────────────────────────────────

    fn catalog(&self) -> Catalog {
        Catalog::new(&self.flowsheet, &self.materials)
    }

    /// The given name if the unit has it, or the unit's first entity of
    /// that kind.
    fn pick_name(unit: &dyn Unit, kind: StreamKind, name: Option<&str>) -> Result<String> {
        let names = unit.stream_names(kind);
        match name {
            Some(n) if names.iter().any(|x| x == n) => Ok(n.to_string()),
            Some(n) => Err(DyssolError::NotFound(format!(
                "{} '{n}' in unit '{}'",
                kind.as_str(),
                unit.name()
            ))),
            None => names.into_iter().next().ok_or_else(|| {
                DyssolError::NotFound(format!(
                    "No {} defined for unit '{}'",
                    kind.as_str().to_lowercase(),
                    unit.name()
                ))
            }),
        }
    }

    fn unit_stream_like(&self, unit: &str, kind: StreamKind, name: Option<&str>) -> Result<&dyn StreamLike> {
        let unit = self.unit(unit)?;
        let name = Self::pick_name(unit, kind, name)?;
        unit.stream_like(kind, &name).ok_or_else(|| {
            DyssolError::NotFound(format!("{} '{name}' in unit '{}'", kind.as_str(), unit.name()))
        })
    }

    fn flowsheet_stream(&self, name: &str) -> Result<&dyn StreamLike> {
        self.flowsheet
            .stream(name)
            .ok_or_else(|| DyssolError::NotFound(format!("Stream '{name}'")))
    }

    fn unit_names(&self, unit: &str, kind: StreamKind) -> Result<Vec<String>> {
        Ok(self.unit(unit)?.stream_names(kind))
    }

    // ── Feeds ───────────────────────────────────────────────────────

    pub fn get_unit_feeds(&self, unit: &str) -> Result<Vec<String>> {
        self.unit_names(unit, StreamKind::Feed)
    }

    pub fn get_unit_feed(&self, unit: &str, feed: Option<&str>, time: f64) -> Result<StreamRecord> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project(s, &self.catalog(), StreamKind::Feed, time))
    }

    pub fn get_unit_feed_overall(&self, unit: &str, feed: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_overall(s, StreamKind::Feed, time))
    }

    pub fn get_unit_feed_composition(&self, unit: &str, feed: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_composition(s, &self.catalog(), time))
    }

    pub fn get_unit_feed_distribution(&self, unit: &str, feed: Option<&str>, time: f64) -> Result<IndexMap<String, Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_distributions(s, &self.catalog(), StreamKind::Feed, time))
    }

    pub fn get_unit_feed_series(&self, unit: &str, feed: Option<&str>) -> Result<StreamSeries> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_series(s, &self.catalog(), StreamKind::Feed))
    }

    pub fn get_unit_feed_overall_series(&self, unit: &str, feed: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_overall_series(s, &self.catalog(), StreamKind::Feed))
    }

    pub fn get_unit_feed_composition_series(&self, unit: &str, feed: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_composition_series(s, &self.catalog()))
    }

    pub fn get_unit_feed_distribution_series(&self, unit: &str, feed: Option<&str>) -> Result<TimeSeries<Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Feed, feed)?;
        Ok(project_distribution_series(s, &self.catalog(), StreamKind::Feed))
    }

    /// Write a feed at `time` (default 0).
    pub fn set_unit_feed(&mut self, unit: &str, feed: Option<&str>, data: &StreamData, time: Option<f64>) -> Result<()> {
        self.write_unit(unit, StreamKind::Feed, feed, data, time)
    }

    /// Replace the whole history of a feed with `series`, the shape
    /// returned by [`Self::get_unit_feed_series`]. Each time point is
    /// written like [`Self::set_unit_feed`]; points the series does not
    /// list are removed. Every slice is validated before the feed changes.
    pub fn set_unit_feed_series(&mut self, unit: &str, feed: Option<&str>, series: &StreamSeries) -> Result<()> {
        let catalog = self.catalog();
        let slices = series_slices(series)?
            .into_iter()
            .map(|(time, data)| Ok((time, StreamUpdate::plan(&data, &self.materials, &catalog)?)))
            .collect::<Result<Vec<_>>>()?;
        let name = self.write_slices(unit, StreamKind::Feed, feed, &slices, true)?;
        debug!("Feed '{name}' of unit '{unit}' rewritten at {} time points", slices.len());
        Ok(())
    }

    // ── Holdups ─────────────────────────────────────────────────────

    pub fn get_unit_holdups(&self, unit: &str) -> Result<Vec<String>> {
        self.unit_names(unit, StreamKind::Holdup)
    }

    pub fn get_unit_holdup(&self, unit: &str, holdup: Option<&str>, time: f64) -> Result<StreamRecord> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project(s, &self.catalog(), StreamKind::Holdup, time))
    }

    pub fn get_unit_holdup_overall(&self, unit: &str, holdup: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_overall(s, StreamKind::Holdup, time))
    }

    pub fn get_unit_holdup_composition(&self, unit: &str, holdup: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_composition(s, &self.catalog(), time))
    }

    pub fn get_unit_holdup_distribution(&self, unit: &str, holdup: Option<&str>, time: f64) -> Result<IndexMap<String, Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_distributions(s, &self.catalog(), StreamKind::Holdup, time))
    }

    pub fn get_unit_holdup_series(&self, unit: &str, holdup: Option<&str>) -> Result<StreamSeries> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_series(s, &self.catalog(), StreamKind::Holdup))
    }

    pub fn get_unit_holdup_overall_series(&self, unit: &str, holdup: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_overall_series(s, &self.catalog(), StreamKind::Holdup))
    }

    pub fn get_unit_holdup_composition_series(&self, unit: &str, holdup: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_composition_series(s, &self.catalog()))
    }

    pub fn get_unit_holdup_distribution_series(&self, unit: &str, holdup: Option<&str>) -> Result<TimeSeries<Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Holdup, holdup)?;
        Ok(project_distribution_series(s, &self.catalog(), StreamKind::Holdup))
    }

    /// Write a holdup at `time` (default 0). Both the working holdup and
    /// its initial state receive the data.
    pub fn set_unit_holdup(&mut self, unit: &str, holdup: Option<&str>, data: &StreamData, time: Option<f64>) -> Result<()> {
        self.write_unit(unit, StreamKind::Holdup, holdup, data, time)
    }

    // ── Unit streams ────────────────────────────────────────────────

    pub fn get_unit_streams(&self, unit: &str) -> Result<Vec<String>> {
        self.unit_names(unit, StreamKind::Stream)
    }

    pub fn get_unit_stream(&self, unit: &str, stream: Option<&str>, time: f64) -> Result<StreamRecord> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project(s, &self.catalog(), StreamKind::Stream, time))
    }

    pub fn get_unit_stream_overall(&self, unit: &str, stream: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_overall(s, StreamKind::Stream, time))
    }

    pub fn get_unit_stream_composition(&self, unit: &str, stream: Option<&str>, time: f64) -> Result<IndexMap<String, f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_composition(s, &self.catalog(), time))
    }

    pub fn get_unit_stream_distribution(&self, unit: &str, stream: Option<&str>, time: f64) -> Result<IndexMap<String, Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_distributions(s, &self.catalog(), StreamKind::Stream, time))
    }

    pub fn get_unit_stream_series(&self, unit: &str, stream: Option<&str>) -> Result<StreamSeries> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_series(s, &self.catalog(), StreamKind::Stream))
    }

    pub fn get_unit_stream_overall_series(&self, unit: &str, stream: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_overall_series(s, &self.catalog(), StreamKind::Stream))
    }

    pub fn get_unit_stream_composition_series(&self, unit: &str, stream: Option<&str>) -> Result<TimeSeries<f64>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_composition_series(s, &self.catalog()))
    }

    pub fn get_unit_stream_distribution_series(&self, unit: &str, stream: Option<&str>) -> Result<TimeSeries<Vec<f64>>> {
        let s = self.unit_stream_like(unit, StreamKind::Stream, stream)?;
        Ok(project_distribution_series(s, &self.catalog(), StreamKind::Stream))
    }

    pub fn set_unit_stream(&mut self, unit: &str, stream: Option<&str>, data: &StreamData, time: Option<f64>) -> Result<()> {
        self.write_unit(unit, StreamKind::Stream, stream, data, time)
    }

    // ── Flowsheet streams ───────────────────────────────────────────

    pub fn get_streams(&self) -> Vec<String> {
        self.flowsheet.stream_names()
    }

    pub fn get_stream(&self, stream: &str, time: f64) -> Result<StreamRecord> {
        Ok(project(self.flowsheet_stream(stream)?, &self.catalog(), StreamKind::Stream, time))
    }

    pub fn get_stream_overall(&self, stream: &str, time: f64) -> Result<IndexMap<String, f64>> {
        Ok(project_overall(self.flowsheet_stream(stream)?, StreamKind::Stream, time))
    }

    pub fn get_stream_composition(&self, stream: &str, time: f64) -> Result<IndexMap<String, f64>> {
        Ok(project_composition(self.flowsheet_stream(stream)?, &self.catalog(), time))
    }

    pub fn get_stream_distribution(&self, stream: &str, time: f64) -> Result<IndexMap<String, Vec<f64>>> {
        Ok(project_distributions(self.flowsheet_stream(stream)?, &self.catalog(), StreamKind::Stream, time))
    }

    pub fn get_stream_series(&self, stream: &str) -> Result<StreamSeries> {
        Ok(project_series(self.flowsheet_stream(stream)?, &self.catalog(), StreamKind::Stream))
    }

    pub fn get_stream_overall_series(&self, stream: &str) -> Result<TimeSeries<f64>> {
        Ok(project_overall_series(self.flowsheet_stream(stream)?, &self.catalog(), StreamKind::Stream))
    }

    pub fn get_stream_composition_series(&self, stream: &str) -> Result<TimeSeries<f64>> {
        Ok(project_composition_series(self.flowsheet_stream(stream)?, &self.catalog()))
    }

    pub fn get_stream_distribution_series(&self, stream: &str) -> Result<TimeSeries<Vec<f64>>> {
        Ok(project_distribution_series(self.flowsheet_stream(stream)?, &self.catalog(), StreamKind::Stream))
    }

    pub fn set_stream(&mut self, stream: &str, data: &StreamData, time: Option<f64>) -> Result<()> {
        let update = StreamUpdate::plan(data, &self.materials, &self.catalog())?;
        let target = self
            .flowsheet
            .stream_mut(stream)
            .ok_or_else(|| DyssolError::NotFound(format!("Stream '{stream}'")))?;
        update.apply(target, time.unwrap_or(DEFAULT_TIME))
    }

    fn write_unit(
        &mut self,
        unit: &str,
        kind: StreamKind,
        name: Option<&str>,
        data: &StreamData,
        time: Option<f64>,
    ) -> Result<()> {
        let update = StreamUpdate::plan(data, &self.materials, &self.catalog())?;
        let time = time.unwrap_or(DEFAULT_TIME);
        let name = self.write_slices(unit, kind, name, &[(time, update)], false)?;
        debug!("{} '{name}' of unit '{unit}' written at t = {time}", kind.as_str());
        Ok(())
    }

    /// Applies every slice to the working stream‑like and, for feeds and
    /// holdups, to its initial copy. With `exclusive`, time points not
    /// among the slices are removed afterwards. Lengths and the initial
    /// copy are checked before anything is written.
    fn write_slices(
        &mut self,
        unit: &str,
        kind: StreamKind,
        name: Option<&str>,
        slices: &[(f64, StreamUpdate)],
        exclusive: bool,
    ) -> Result<String> {
        let name = Self::pick_name(self.unit(unit)?, kind, name)?;
        let target = self
            .flowsheet
            .unit_mut(unit)
            .ok_or_else(|| DyssolError::NotFound(format!("Unit '{unit}'")))?;
        let has_initial = kind != StreamKind::Stream;
        if has_initial && target.initial_mut(kind, &name).is_none() {
            return Err(DyssolError::NotFound(format!(
                "Initial {} '{name}' in unit '{unit}'",
                kind.as_str().to_lowercase()
            )));
        }

        let working = target.stream_like_mut(kind, &name).ok_or_else(|| {
            DyssolError::NotFound(format!("{} '{name}' in unit '{unit}'", kind.as_str()))
        })?;
        for (time, update) in slices {
            update.check(working, *time)?;
        }
        write_all(working, slices, exclusive)?;
        if let Some(initial) = target.initial_mut(kind, &name) {
            write_all(initial, slices, exclusive)?;
        }
        Ok(name)
    }

    // ── Options ─────────────────────────────────────────────────────

    pub fn get_options(&self) -> IndexMap<String, Value> {
        read_options(self.flowsheet.options())
    }

    /// Apply every recognised key; a rejected value leaves all options
    /// unchanged.
    pub fn set_options(&mut self, options: &IndexMap<String, Value>) -> Result<()> {
        write_options(self.flowsheet.options_mut(), options)
    }

    pub fn get_options_methods(&self) -> IndexMap<String, Vec<String>> {
        option_methods()
    }

    /// Classes of the distribution grid `kind`, `None` if absent.
    pub fn grid_classes(&self, kind: DistrType) -> Option<usize> {
        self.flowsheet
            .grid()
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.classes_count())
    }

    /// Display name of a compound key.
    pub fn compound_name(&self, key: &str) -> String {
        compound_display_name(&self.materials, key)
    }
}

fn write_all(stream: &mut dyn StreamLike, slices: &[(f64, StreamUpdate)], exclusive: bool) -> Result<()> {
    for (time, update) in slices {
        update.apply(stream, *time)?;
    }
    if exclusive {
        for t in stream.time_points() {
            if !slices.iter().any(|(time, _)| (time - t).abs() <= TIME_EPS) {
                stream.remove_time_point(t);
            }
        }
    }
    Ok(())
}
