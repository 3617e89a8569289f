//! In‑memory engine.
//!
//! Stores every stream‑like as a list of time‑stamped states with linear
//! interpolation between them, persists flowsheets as JSON, and reads
//! materials and model descriptors from JSON files. It carries no
//! process models: simulating holds every holdup and stream at its last
//! state up to the end time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::*;
use crate::error::*;
use crate::names::{DistrType, OverallProperty, Phase};
use crate::options::SimulationOptions;
use crate::parameters::UnitParameter;

/// Two time points closer than this are the same point.
const TIME_TOL: f64 = 1e-9;
/// Standard conditions used for states that were never written.
const STANDARD_TEMPERATURE: f64 = 298.15;
const STANDARD_PRESSURE: f64 = 101_325.0;

const SNAPSHOT_FORMAT: &str = "dyssol-memory";
const SNAPSHOT_VERSION: u32 = 1;

// ================================================================
//  Stream state
// ================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StreamState {
    time: f64,
    mass: f64,
    temperature: f64,
    pressure: f64,
    #[serde(default)]
    compounds: BTreeMap<String, BTreeMap<Phase, f64>>,
    #[serde(default)]
    phases: BTreeMap<Phase, f64>,
    #[serde(default)]
    distributions: BTreeMap<DistrType, Vec<f64>>,
}

impl StreamState {
    fn empty(time: f64) -> Self {
        Self {
            time,
            mass: 0.0,
            temperature: STANDARD_TEMPERATURE,
            pressure: STANDARD_PRESSURE,
            compounds: BTreeMap::new(),
            phases: BTreeMap::new(),
            distributions: BTreeMap::new(),
        }
    }

    /// Linear blend of two neighbouring states. Distributions are not
    /// blended: the earlier state's vectors are kept.
    fn lerp(a: &Self, b: &Self, time: f64) -> Self {
        let w = if b.time > a.time {
            (time - a.time) / (b.time - a.time)
        } else {
            0.0
        };
        let mix = |x: f64, y: f64| x + (y - x) * w;

        let mut compounds = a.compounds.clone();
        for (key, phases) in &b.compounds {
            compounds.entry(key.clone()).or_default().extend(phases.keys().map(|p| (*p, 0.0)));
        }
        for (key, phases) in compounds.iter_mut() {
            for (phase, m) in phases.iter_mut() {
                let ma = a.compounds.get(key).and_then(|x| x.get(phase)).copied().unwrap_or(0.0);
                let mb = b.compounds.get(key).and_then(|x| x.get(phase)).copied().unwrap_or(0.0);
                *m = mix(ma, mb);
            }
        }
        let mut phases = a.phases.clone();
        for p in b.phases.keys() {
            phases.entry(*p).or_insert(0.0);
        }
        for (p, m) in phases.iter_mut() {
            let ma = a.phases.get(p).copied().unwrap_or(0.0);
            let mb = b.phases.get(p).copied().unwrap_or(0.0);
            *m = mix(ma, mb);
        }

        Self {
            time,
            mass: mix(a.mass, b.mass),
            temperature: mix(a.temperature, b.temperature),
            pressure: mix(a.pressure, b.pressure),
            compounds,
            phases,
            distributions: a.distributions.clone(),
        }
    }
}

// ================================================================
//  Stream
// ================================================================

/// Time‑dependent material state; used for feeds, holdups, unit streams
/// and flowsheet streams alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStream {
    pub name: String,
    states: Vec<StreamState>,
    /// Classes per grid dimension, kept in sync by the flowsheet.
    #[serde(skip)]
    layout: Vec<(DistrType, usize)>,
    /// Flowsheet compound keys, in order.
    #[serde(skip)]
    compounds: Vec<String>,
}

impl MemoryStream {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            states: Vec::new(),
            layout: Vec::new(),
            compounds: Vec::new(),
        }
    }

    fn state_at(&self, time: f64) -> StreamState {
        let Some(first) = self.states.first() else {
            return StreamState::empty(time);
        };
        match self.states.iter().position(|s| s.time > time + TIME_TOL) {
            Some(0) => StreamState { time, ..first.clone() },
            Some(i) => {
                let prev = &self.states[i - 1];
                if (prev.time - time).abs() <= TIME_TOL {
                    prev.clone()
                } else {
                    StreamState::lerp(prev, &self.states[i], time)
                }
            }
            None => {
                let last = &self.states[self.states.len() - 1];
                StreamState { time, ..last.clone() }
            }
        }
    }

    /// State at `time`, inserted (as an interpolated copy) if missing.
    fn state_mut(&mut self, time: f64) -> &mut StreamState {
        let index = match self.states.iter().position(|s| (s.time - time).abs() <= TIME_TOL) {
            Some(i) => i,
            None => {
                let state = self.state_at(time);
                let i = self.states.partition_point(|s| s.time < time);
                self.states.insert(i, state);
                i
            }
        };
        &mut self.states[index]
    }

    fn classes(&self, kind: DistrType) -> Option<usize> {
        self.layout.iter().find(|(k, _)| *k == kind).map(|(_, n)| *n)
    }

    /// Repeat the last state at `time` if the stream ends earlier.
    fn hold_until(&mut self, time: f64) {
        if let Some(last) = self.states.last() {
            if last.time + TIME_TOL < time {
                let held = StreamState { time, ..last.clone() };
                self.states.push(held);
            }
        }
    }

    fn clear_after(&mut self, time: f64) {
        self.states.retain(|s| s.time <= time + TIME_TOL);
    }
}

impl StreamLike for MemoryStream {
    fn time_points(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.time).collect()
    }

    fn overall(&self, time: f64, property: OverallProperty) -> f64 {
        let s = self.state_at(time);
        match property {
            OverallProperty::Mass => s.mass,
            OverallProperty::Temperature => s.temperature,
            OverallProperty::Pressure => s.pressure,
        }
    }

    fn compound_mass(&self, time: f64, compound: &str, phase: Phase) -> f64 {
        self.state_at(time)
            .compounds
            .get(compound)
            .and_then(|p| p.get(&phase))
            .copied()
            .unwrap_or(0.0)
    }

    fn phase_mass(&self, time: f64, phase: Phase) -> f64 {
        let s = self.state_at(time);
        match s.phases.get(&phase) {
            Some(m) => *m,
            None => s.compounds.values().filter_map(|p| p.get(&phase)).sum(),
        }
    }

    fn distribution(&self, time: f64, kind: DistrType) -> Vec<f64> {
        let Some(n) = self.classes(kind) else {
            return Vec::new();
        };
        let mut state = self.state_at(time);
        match state.distributions.remove(&kind) {
            Some(v) if v.len() == n => v,
            _ if kind == DistrType::Compounds => compound_fractions(&state, &self.compounds),
            _ => vec![0.0; n],
        }
    }

    fn set_overall(&mut self, time: f64, property: OverallProperty, value: f64) {
        let s = self.state_mut(time);
        match property {
            OverallProperty::Mass => s.mass = value,
            OverallProperty::Temperature => s.temperature = value,
            OverallProperty::Pressure => s.pressure = value,
        }
    }

    fn set_compound_mass(&mut self, time: f64, compound: &str, phase: Phase, value: f64) {
        let s = self.state_mut(time);
        s.compounds
            .entry(compound.to_string())
            .or_default()
            .insert(phase, value);
        // An explicit compound distribution is stale now.
        s.distributions.remove(&DistrType::Compounds);
    }

    fn set_phase_mass(&mut self, time: f64, phase: Phase, value: f64) {
        let s = self.state_mut(time);
        s.phases.insert(phase, value);
        s.mass = s.phases.values().sum();
    }

    fn set_distribution(&mut self, time: f64, kind: DistrType, values: &[f64]) {
        self.state_mut(time).distributions.insert(kind, values.to_vec());
    }

    fn remove_time_point(&mut self, time: f64) {
        self.states.retain(|s| (s.time - time).abs() > TIME_TOL);
    }
}

/// Mass fraction of every compound over all phases; zeros for an empty
/// state.
fn compound_fractions(state: &StreamState, keys: &[String]) -> Vec<f64> {
    let masses: Vec<f64> = keys
        .iter()
        .map(|k| state.compounds.get(k).map(|p| p.values().sum()).unwrap_or(0.0))
        .collect();
    let total: f64 = masses.iter().sum();
    if total > 0.0 {
        masses.iter().map(|m| m / total).collect()
    } else {
        masses
    }
}

// ================================================================
//  Unit
// ================================================================

/// Parameters listed in `members` are active only while `selector` is
/// set to `option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    pub selector: String,
    pub option: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUnit {
    pub name: String,
    pub key: String,
    pub model: Option<ModelDescriptor>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub parameters: Vec<UnitParameter>,
    #[serde(default)]
    pub groups: Vec<ParameterGroup>,
    #[serde(default)]
    pub feeds: Vec<MemoryStream>,
    #[serde(default)]
    pub holdups: Vec<MemoryStream>,
    #[serde(default)]
    pub feeds_init: Vec<MemoryStream>,
    #[serde(default)]
    pub holdups_init: Vec<MemoryStream>,
    #[serde(default)]
    pub streams: Vec<MemoryStream>,
}

impl MemoryUnit {
    pub fn new(name: &str, model: Option<ModelDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            key: format!("unit:{name}"),
            model,
            ports: Vec::new(),
            parameters: Vec::new(),
            groups: Vec::new(),
            feeds: Vec::new(),
            holdups: Vec::new(),
            feeds_init: Vec::new(),
            holdups_init: Vec::new(),
            streams: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: UnitParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_group(mut self, selector: &str, option: &str, members: &[&str]) -> Self {
        self.groups.push(ParameterGroup {
            selector: selector.to_string(),
            option: option.to_string(),
            members: members.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_port(mut self, name: &str, direction: PortDirection, stream: Option<&str>) -> Self {
        self.ports.push(Port {
            name: name.to_string(),
            direction,
            stream: stream.map(str::to_string),
        });
        self
    }

    /// Adds a feed together with its initial‑state copy.
    pub fn with_feed(mut self, name: &str) -> Self {
        self.feeds.push(MemoryStream::new(name));
        self.feeds_init.push(MemoryStream::new(name));
        self
    }

    /// Adds a holdup together with its initial‑state copy.
    pub fn with_holdup(mut self, name: &str) -> Self {
        self.holdups.push(MemoryStream::new(name));
        self.holdups_init.push(MemoryStream::new(name));
        self
    }

    pub fn with_stream(mut self, name: &str) -> Self {
        self.streams.push(MemoryStream::new(name));
        self
    }

    fn collection(&self, kind: StreamKind) -> &[MemoryStream] {
        match kind {
            StreamKind::Feed => &self.feeds,
            StreamKind::Holdup => &self.holdups,
            StreamKind::Stream => &self.streams,
        }
    }

    fn collection_mut(&mut self, kind: StreamKind) -> &mut Vec<MemoryStream> {
        match kind {
            StreamKind::Feed => &mut self.feeds,
            StreamKind::Holdup => &mut self.holdups,
            StreamKind::Stream => &mut self.streams,
        }
    }

    fn all_streams_mut(&mut self) -> impl Iterator<Item = &mut MemoryStream> {
        self.feeds
            .iter_mut()
            .chain(self.holdups.iter_mut())
            .chain(self.feeds_init.iter_mut())
            .chain(self.holdups_init.iter_mut())
            .chain(self.streams.iter_mut())
    }

    /// Rebuilds initial copies missing from documents that predate them.
    fn fill_initial_copies(&mut self) {
        for (working, initial) in [
            (&self.feeds, &mut self.feeds_init),
            (&self.holdups, &mut self.holdups_init),
        ] {
            for s in working {
                if !initial.iter().any(|i| i.name == s.name) {
                    initial.push(s.clone());
                }
            }
        }
    }

    fn restore_initial_copies(&mut self) {
        for (working, initial) in [
            (&mut self.feeds, &self.feeds_init),
            (&mut self.holdups, &self.holdups_init),
        ] {
            for s in working.iter_mut() {
                if let Some(init) = initial.iter().find(|i| i.name == s.name) {
                    *s = init.clone();
                }
            }
        }
    }

    fn selected_option(&self, selector: &str) -> Option<&str> {
        self.parameter(selector)
            .and_then(|p| p.value.as_combo())
            .and_then(|c| c.selected_name())
    }
}

impl Unit for MemoryUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn model(&self) -> Option<&ModelDescriptor> {
        self.model.as_ref()
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn parameters(&self) -> &[UnitParameter] {
        &self.parameters
    }

    fn parameter_mut(&mut self, name: &str) -> Option<&mut UnitParameter> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }

    fn active_parameters(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| {
                let mut groups = self
                    .groups
                    .iter()
                    .filter(|g| g.members.contains(&p.name))
                    .peekable();
                groups.peek().is_none()
                    || groups.any(|g| self.selected_option(&g.selector) == Some(g.option.as_str()))
            })
            .map(|p| p.name.clone())
            .collect()
    }

    fn stream_names(&self, kind: StreamKind) -> Vec<String> {
        self.collection(kind).iter().map(|s| s.name.clone()).collect()
    }

    fn stream_like(&self, kind: StreamKind, name: &str) -> Option<&dyn StreamLike> {
        self.collection(kind)
            .iter()
            .find(|s| s.name == name)
            .map(|s| s as &dyn StreamLike)
    }

    fn stream_like_mut(&mut self, kind: StreamKind, name: &str) -> Option<&mut dyn StreamLike> {
        self.collection_mut(kind)
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| s as &mut dyn StreamLike)
    }

    fn initial_mut(&mut self, kind: StreamKind, name: &str) -> Option<&mut dyn StreamLike> {
        let initial = match kind {
            StreamKind::Feed => &mut self.feeds_init,
            StreamKind::Holdup => &mut self.holdups_init,
            StreamKind::Stream => return None,
        };
        initial
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| s as &mut dyn StreamLike)
    }
}

// ================================================================
//  Flowsheet
// ================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFlowsheet {
    #[serde(default)]
    units: Vec<MemoryUnit>,
    #[serde(default)]
    streams: Vec<MemoryStream>,
    #[serde(default)]
    compounds: Vec<String>,
    #[serde(default)]
    phases: Vec<PhaseDescriptor>,
    /// Dimensions other than the compound one.
    #[serde(default)]
    grid: Vec<GridDimension>,
    #[serde(default)]
    options: SimulationOptions,
    /// Full grid including the compound dimension, rebuilt on change.
    #[serde(skip)]
    full_grid: Vec<GridDimension>,
    #[serde(skip)]
    runs: usize,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: String,
    version: u32,
    flowsheet: MemoryFlowsheet,
}

impl MemoryFlowsheet {
    pub fn new() -> Self {
        let mut fs = Self::default();
        fs.sync_layout();
        fs
    }

    /// Registers a unit (engine‑side construction; the binding itself
    /// never adds units).
    pub fn add_unit(&mut self, unit: MemoryUnit) -> &mut Self {
        self.units.push(unit);
        self.sync_layout();
        self
    }

    pub fn add_stream(&mut self, name: &str) -> &mut Self {
        self.streams.push(MemoryStream::new(name));
        self.sync_layout();
        self
    }

    /// Number of completed solver runs.
    pub fn runs(&self) -> usize {
        self.runs
    }

    fn sync_layout(&mut self) {
        let mut full = Vec::with_capacity(self.grid.len() + 1);
        full.push(GridDimension {
            kind: DistrType::Compounds,
            classes: GridClasses::Symbolic(self.compounds.clone()),
        });
        full.extend(self.grid.iter().cloned());
        let layout: Vec<(DistrType, usize)> =
            full.iter().map(|d| (d.kind, d.classes_count())).collect();
        self.full_grid = full;

        let compounds = &self.compounds;
        let streams = self
            .units
            .iter_mut()
            .flat_map(|u| u.all_streams_mut())
            .chain(self.streams.iter_mut());
        for s in streams {
            s.layout = layout.clone();
            s.compounds = compounds.clone();
        }
    }

    fn read_json(path: &Path) -> Result<serde_json::Value> {
        let text = fs::read_to_string(path)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))
    }

    fn replace_with(&mut self, loaded: MemoryFlowsheet) {
        *self = loaded;
        for unit in &mut self.units {
            unit.fill_initial_copies();
        }
        self.sync_layout();
    }
}

impl Flowsheet for MemoryFlowsheet {
    fn units(&self) -> Vec<&dyn Unit> {
        self.units.iter().map(|u| u as &dyn Unit).collect()
    }

    fn unit(&self, name: &str) -> Option<&dyn Unit> {
        self.units
            .iter()
            .find(|u| u.name == name)
            .map(|u| u as &dyn Unit)
    }

    fn unit_mut(&mut self, name: &str) -> Option<&mut dyn Unit> {
        self.units
            .iter_mut()
            .find(|u| u.name == name)
            .map(|u| u as &mut dyn Unit)
    }

    fn stream_names(&self) -> Vec<String> {
        self.streams.iter().map(|s| s.name.clone()).collect()
    }

    fn stream(&self, name: &str) -> Option<&dyn StreamLike> {
        self.streams
            .iter()
            .find(|s| s.name == name)
            .map(|s| s as &dyn StreamLike)
    }

    fn stream_mut(&mut self, name: &str) -> Option<&mut dyn StreamLike> {
        self.streams
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| s as &mut dyn StreamLike)
    }

    fn compounds(&self) -> &[String] {
        &self.compounds
    }

    fn set_compounds(&mut self, keys: Vec<String>) {
        self.compounds = keys;
        self.sync_layout();
    }

    fn add_compound(&mut self, key: &str) {
        if !self.compounds.iter().any(|k| k == key) {
            self.compounds.push(key.to_string());
            self.sync_layout();
        }
    }

    fn phases(&self) -> &[PhaseDescriptor] {
        &self.phases
    }

    fn set_phases(&mut self, phases: Vec<PhaseDescriptor>) {
        let mut unique: Vec<PhaseDescriptor> = Vec::with_capacity(phases.len());
        for p in phases {
            match unique.iter_mut().find(|u| u.state == p.state) {
                Some(existing) => *existing = p,
                None => unique.push(p),
            }
        }
        self.phases = unique;
    }

    fn add_phase(&mut self, state: Phase, name: &str) {
        match self.phases.iter_mut().find(|p| p.state == state) {
            Some(existing) => existing.name = name.to_string(),
            None => self.phases.push(PhaseDescriptor {
                state,
                name: name.to_string(),
            }),
        }
    }

    fn grid(&self) -> &[GridDimension] {
        &self.full_grid
    }

    fn set_grid(&mut self, dimensions: Vec<GridDimension>) {
        self.grid = dimensions
            .into_iter()
            .filter(|d| d.kind != DistrType::Compounds)
            .collect();
        self.sync_layout();
    }

    fn options(&self) -> &SimulationOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut SimulationOptions {
        &mut self.options
    }

    fn initialize(&mut self) -> String {
        if self.compounds.is_empty() {
            return "No compounds defined".to_string();
        }
        if self.phases.is_empty() {
            return "No phases defined".to_string();
        }
        if let Some(unit) = self.units.iter().find(|u| u.model.is_none()) {
            return format!("Model is not set for unit '{}'", unit.name);
        }

        // Working feeds and holdups restart from their initial state.
        let start = self.options.start_simulation_time;
        for unit in &mut self.units {
            unit.restore_initial_copies();
            for s in unit.streams.iter_mut() {
                s.clear_after(start);
            }
        }
        for s in &mut self.streams {
            s.clear_after(start);
        }
        self.sync_layout();
        String::new()
    }

    fn simulate(&mut self) -> Result<()> {
        let (start, end) = (
            self.options.start_simulation_time,
            self.options.end_simulation_time,
        );
        if end <= start {
            return Err(DyssolError::Engine(format!(
                "Simulation end time ({end}) must be greater than start time ({start})"
            )));
        }
        for unit in &mut self.units {
            for s in unit.holdups.iter_mut().chain(unit.streams.iter_mut()) {
                s.hold_until(end);
            }
        }
        for s in &mut self.streams {
            s.hold_until(end);
        }
        self.runs += 1;
        Ok(())
    }

    fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let snapshot: Snapshot = serde_json::from_value(Self::read_json(path)?)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        if snapshot.format != SNAPSHOT_FORMAT || snapshot.version != SNAPSHOT_VERSION {
            return Err(DyssolError::LoadFailed(format!(
                "{}: unsupported format '{}' v{}",
                path.display(),
                snapshot.format,
                snapshot.version
            )));
        }
        self.replace_with(snapshot.flowsheet);
        Ok(())
    }

    /// Accepts a bare flowsheet document without the snapshot header.
    fn load_direct(&mut self, path: &Path) -> Result<()> {
        let flowsheet: MemoryFlowsheet = serde_json::from_value(Self::read_json(path)?)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        self.replace_with(flowsheet);
        Ok(())
    }

    fn save_to_file(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            format: SNAPSHOT_FORMAT.to_string(),
            version: SNAPSHOT_VERSION,
            flowsheet: self.clone(),
        };
        let text = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| DyssolError::SaveFailed(e.to_string()))?;
        fs::write(path, text).map_err(|e| DyssolError::SaveFailed(format!("{}: {e}", path.display())))
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

// ================================================================
//  Materials and models
// ================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryMaterials {
    compounds: Vec<Compound>,
}

impl MemoryMaterials {
    pub fn with_compounds(compounds: &[(&str, &str)]) -> Self {
        Self {
            compounds: compounds
                .iter()
                .map(|(key, name)| Compound {
                    key: key.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

impl MaterialsDatabase for MemoryMaterials {
    /// Reads a JSON array of `{ "key": …, "name": … }` objects.
    fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        self.compounds = serde_json::from_str(&text)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    fn compounds(&self) -> &[Compound] {
        &self.compounds
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryModels {
    models: Vec<ModelDescriptor>,
}

impl MemoryModels {
    pub fn with_models(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }
}

impl ModelsRegistry for MemoryModels {
    /// Registers every `*.json` model descriptor found in `path`.
    fn add_dir(&mut self, path: &Path) -> Result<()> {
        let entries = fs::read_dir(path)
            .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", path.display())))?;
        for entry in entries.flatten() {
            let file = entry.path();
            if file.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let text = fs::read_to_string(&file)
                .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", file.display())))?;
            let model: ModelDescriptor = serde_json::from_str(&text)
                .map_err(|e| DyssolError::LoadFailed(format!("{}: {e}", file.display())))?;
            if !self.models.iter().any(|m| m.key == model.key) {
                self.models.push(model);
            }
        }
        Ok(())
    }

    fn available_models(&self) -> &[ModelDescriptor] {
        &self.models
    }
}

// ================================================================
//  Engine bundle
// ================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    pub flowsheet: MemoryFlowsheet,
    pub materials: MemoryMaterials,
    pub models: MemoryModels,
}

impl MemoryEngine {
    pub fn new(flowsheet: MemoryFlowsheet, materials: MemoryMaterials, models: MemoryModels) -> Self {
        Self {
            flowsheet,
            materials,
            models,
        }
    }
}

impl Engine for MemoryEngine {
    type Flowsheet = MemoryFlowsheet;
    type Materials = MemoryMaterials;
    type Models = MemoryModels;

    fn into_parts(self) -> (MemoryFlowsheet, MemoryMaterials, MemoryModels) {
        (self.flowsheet, self.materials, self.models)
    }
}

