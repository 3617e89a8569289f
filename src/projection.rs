//! Read side of stream‑like objects: uniform `{overall, composition,
//! distributions}` records at one time or across all time points.

use indexmap::IndexMap;

use crate::compounds::named_compounds;
use crate::engine::{Flowsheet, MaterialsDatabase, StreamKind, StreamLike};
use crate::names::{composition_label, distr_name, DistrType, OverallProperty, Phase};
use crate::records::{StreamRecord, StreamSeries, TimeSeries};

/// Composition entries at or below this magnitude are omitted from
/// single‑time records.
pub const COMPOSITION_EPS: f64 = 1e-12;
/// Series whose every element is at or below this magnitude are dropped
/// from all‑times records.
pub const SERIES_EPS: f64 = 1e-15;
/// Tolerance when comparing the last time point with the end time.
pub const TIME_EPS: f64 = 1e-6;

/// Flowsheet‑wide naming context shared by every projection and
/// mutation: compounds, phases, grid dimensions and the end time.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// `(key, display name)` in flowsheet order.
    pub compounds: Vec<(String, String)>,
    pub phases: Vec<Phase>,
    pub dimensions: Vec<DistrType>,
    pub end_time: f64,
}

impl Catalog {
    pub fn new<F, M>(flowsheet: &F, db: &M) -> Self
    where
        F: Flowsheet + ?Sized,
        M: MaterialsDatabase + ?Sized,
    {
        Self {
            compounds: named_compounds(db, flowsheet.compounds()),
            phases: flowsheet.phases().iter().map(|p| p.state).collect(),
            dimensions: flowsheet.grid().iter().map(|d| d.kind).collect(),
            end_time: flowsheet.options().end_simulation_time,
        }
    }

    /// Dimensions visible to a stream‑like; holdups do not report the
    /// compound dimension.
    pub fn dimensions_for(&self, kind: StreamKind) -> impl Iterator<Item = DistrType> + '_ {
        self.dimensions
            .iter()
            .copied()
            .filter(move |d| kind.is_flowing() || *d != DistrType::Compounds)
    }
}

// ── Raw samples ─────────────────────────────────────────────────────

fn overall_at(stream: &dyn StreamLike, kind: StreamKind, time: f64) -> Vec<(String, f64)> {
    OverallProperty::ALL
        .iter()
        .map(|p| (p.key(kind.is_flowing()).to_string(), stream.overall(time, *p)))
        .collect()
}

fn composition_at(stream: &dyn StreamLike, catalog: &Catalog, time: f64) -> Vec<(String, f64)> {
    let mut out = Vec::with_capacity(catalog.compounds.len() * catalog.phases.len());
    for (key, name) in &catalog.compounds {
        for phase in &catalog.phases {
            out.push((
                composition_label(name, *phase),
                stream.compound_mass(time, key, *phase),
            ));
        }
    }
    out
}

fn distributions_at(
    stream: &dyn StreamLike,
    catalog: &Catalog,
    kind: StreamKind,
    time: f64,
) -> Vec<(String, Vec<f64>)> {
    catalog
        .dimensions_for(kind)
        .map(|d| (distr_name(d).to_string(), stream.distribution(time, d)))
        .collect()
}

// ── Single time ─────────────────────────────────────────────────────

pub fn project_overall(stream: &dyn StreamLike, kind: StreamKind, time: f64) -> IndexMap<String, f64> {
    overall_at(stream, kind, time).into_iter().collect()
}

pub fn project_composition(stream: &dyn StreamLike, catalog: &Catalog, time: f64) -> IndexMap<String, f64> {
    composition_at(stream, catalog, time)
        .into_iter()
        .filter(|(_, v)| v.abs() > COMPOSITION_EPS)
        .collect()
}

pub fn project_distributions(
    stream: &dyn StreamLike,
    catalog: &Catalog,
    kind: StreamKind,
    time: f64,
) -> IndexMap<String, Vec<f64>> {
    distributions_at(stream, catalog, kind, time)
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

pub fn project(stream: &dyn StreamLike, catalog: &Catalog, kind: StreamKind, time: f64) -> StreamRecord {
    StreamRecord {
        overall: project_overall(stream, kind, time),
        composition: project_composition(stream, catalog, time),
        distributions: project_distributions(stream, catalog, kind, time),
    }
}

// ── All times ───────────────────────────────────────────────────────

/// Time axis of an all‑times projection: the stream's own points,
/// extended by the end time when the last point falls short of it.
pub fn series_timepoints(stream: &dyn StreamLike, end_time: f64) -> Vec<f64> {
    let mut times = stream.time_points();
    times.sort_by(f64::total_cmp);
    times.dedup();
    if times.last().is_none_or(|last| end_time - last > TIME_EPS) {
        times.push(end_time);
    }
    times
}

fn collect_series<T>(
    timepoints: &[f64],
    mut sample: impl FnMut(f64) -> Vec<(String, T)>,
) -> IndexMap<String, Vec<T>> {
    let mut out: IndexMap<String, Vec<T>> = IndexMap::new();
    for &t in timepoints {
        for (key, value) in sample(t) {
            out.entry(key)
                .or_insert_with(|| Vec::with_capacity(timepoints.len()))
                .push(value);
        }
    }
    out
}

pub fn project_overall_series(stream: &dyn StreamLike, catalog: &Catalog, kind: StreamKind) -> TimeSeries<f64> {
    let timepoints = series_timepoints(stream, catalog.end_time);
    let series = collect_series(&timepoints, |t| overall_at(stream, kind, t));
    TimeSeries { timepoints, series }
}

pub fn project_composition_series(stream: &dyn StreamLike, catalog: &Catalog) -> TimeSeries<f64> {
    let timepoints = series_timepoints(stream, catalog.end_time);
    let mut series = collect_series(&timepoints, |t| composition_at(stream, catalog, t));
    series.retain(|_, values| values.iter().any(|v| v.abs() > SERIES_EPS));
    TimeSeries { timepoints, series }
}

pub fn project_distribution_series(
    stream: &dyn StreamLike,
    catalog: &Catalog,
    kind: StreamKind,
) -> TimeSeries<Vec<f64>> {
    let timepoints = series_timepoints(stream, catalog.end_time);
    let mut series = collect_series(&timepoints, |t| distributions_at(stream, catalog, kind, t));
    series.retain(|_, rows| rows.iter().flatten().any(|v| v.abs() > SERIES_EPS));
    TimeSeries { timepoints, series }
}

pub fn project_series(stream: &dyn StreamLike, catalog: &Catalog, kind: StreamKind) -> StreamSeries {
    StreamSeries {
        overall: project_overall_series(stream, catalog, kind),
        composition: project_composition_series(stream, catalog),
        distributions: project_distribution_series(stream, catalog, kind),
    }
}
