// ── Output records ──────────────────────────────────────────────────
//
// Plain data returned by the projection and introspection queries, each
// with a human‑readable `Display`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::names::format_double;
use crate::parameters::ParameterEntry;

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_double(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_width<'a>(keys: impl Iterator<Item = &'a String>) -> usize {
    keys.map(|k| k.chars().count()).max().unwrap_or(0)
}

// ── Single‑time record ──────────────────────────────────────────────

/// State of a stream‑like object at one time point.
///
/// `overall` holds `mass` (holdups) or `massflow` (feeds and streams)
/// plus `temperature` and `pressure`. `composition` is keyed by
/// `"<Name> [<phase>]"` and omits numerically zero entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub overall: IndexMap<String, f64>,
    pub composition: IndexMap<String, f64>,
    pub distributions: IndexMap<String, Vec<f64>>,
}

impl fmt::Display for StreamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overall:")?;
        let w = key_width(self.overall.keys());
        for (k, v) in &self.overall {
            writeln!(f, "  {k:<w$} = {}", format_double(*v))?;
        }
        writeln!(f, "Composition:")?;
        let w = key_width(self.composition.keys());
        for (k, v) in &self.composition {
            writeln!(f, "  {k:<w$} = {}", format_double(*v))?;
        }
        write!(f, "Distributions:")?;
        let w = key_width(self.distributions.keys());
        for (k, v) in &self.distributions {
            write!(f, "\n  {k:<w$} = [{}]", join(v))?;
        }
        Ok(())
    }
}

// ── Time series ─────────────────────────────────────────────────────

/// One block of an all‑times projection: the shared time axis and one
/// series per field, each as long as `timepoints`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T> {
    pub timepoints: Vec<f64>,
    #[serde(flatten)]
    pub series: IndexMap<String, Vec<T>>,
}

impl<T> TimeSeries<T> {
    pub fn new(timepoints: Vec<f64>) -> Self {
        Self {
            timepoints,
            series: IndexMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[T]> {
        self.series.get(field).map(Vec::as_slice)
    }
}

/// State of a stream‑like object at every known time point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSeries {
    pub overall: TimeSeries<f64>,
    pub composition: TimeSeries<f64>,
    pub distributions: TimeSeries<Vec<f64>>,
}

impl fmt::Display for StreamSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time points: [{}]", join(&self.overall.timepoints))?;
        writeln!(f, "Overall:")?;
        for (k, v) in &self.overall.series {
            writeln!(f, "  {k}: [{}]", join(v))?;
        }
        writeln!(f, "Composition:")?;
        for (k, v) in &self.composition.series {
            writeln!(f, "  {k}: [{}]", join(v))?;
        }
        write!(f, "Distributions:")?;
        for (k, rows) in &self.distributions.series {
            write!(f, "\n  {k}:")?;
            for (t, row) in self.distributions.timepoints.iter().zip(rows) {
                write!(f, "\n    t={:<8} [{}]", format_double(*t), join(row))?;
            }
        }
        Ok(())
    }
}

// ── Introspection ───────────────────────────────────────────────────

/// Everything known about the model behind one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub unit: String,
    /// Unique model ID.
    pub key: String,
    pub model: String,
    pub author: String,
    /// Port name → `input` / `output` / `undefined`.
    pub ports: IndexMap<String, String>,
    pub parameters: IndexMap<String, ParameterEntry>,
    pub holdups: Vec<String>,
    pub feeds: Vec<String>,
    pub streams: Vec<String>,
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unit:    {}", self.unit)?;
        writeln!(f, "Model:   {} ({})", self.model, self.key)?;
        writeln!(f, "Author:  {}", self.author)?;
        writeln!(f, "Ports:")?;
        for (name, direction) in &self.ports {
            writeln!(f, "  {name} ({direction})")?;
        }
        writeln!(f, "Parameters:")?;
        let w = key_width(self.parameters.keys());
        for (name, entry) in &self.parameters {
            writeln!(f, "  {name:<w$} = {entry}")?;
        }
        writeln!(f, "Holdups: {}", self.holdups.join(", "))?;
        writeln!(f, "Feeds:   {}", self.feeds.join(", "))?;
        write!(f, "Streams: {}", self.streams.join(", "))
    }
}

/// Connections of one unit. Unconnected ports map to an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTopology {
    pub unit: String,
    pub model: String,
    pub ports: IndexMap<String, String>,
}

/// Counts and names of the main flowsheet entities.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowsheetSummary {
    /// `(unit, model display name)`.
    pub units: Vec<(String, String)>,
    pub streams: Vec<String>,
    /// Compound display names.
    pub compounds: Vec<String>,
    /// `(phase display name, state)`.
    pub phases: Vec<(String, String)>,
}

impl fmt::Display for FlowsheetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Units: {}", self.units.len())?;
        for (unit, model) in &self.units {
            writeln!(f, "  {unit} (Model: {model})")?;
        }
        writeln!(f, "Streams: {}", self.streams.len())?;
        for s in &self.streams {
            writeln!(f, "  {s}")?;
        }
        writeln!(f, "Compounds: {}", self.compounds.len())?;
        for c in &self.compounds {
            writeln!(f, "  {c}")?;
        }
        write!(f, "Phases: {}", self.phases.len())?;
        for (name, state) in &self.phases {
            write!(f, "\n  {name} ({state})")?;
        }
        Ok(())
    }
}
