//! Write side of stream‑like objects.
//!
//! A [`StreamData`] record is first resolved into a [`StreamUpdate`]
//! (labels parsed, compounds looked up, distributions normalized), then
//! applied to one or more stream‑likes. Planning borrows only the
//! materials database, so the same update can be applied to a working
//! feed or holdup and to its initial copy in turn.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::compounds::resolve_compound;
use crate::engine::{MaterialsDatabase, StreamLike};
use crate::error::*;
use crate::names::{distr_name, distr_type, parse_composition_label, parse_overall, DistrType, OverallProperty, Phase};
use crate::projection::{Catalog, TIME_EPS};
use crate::records::{StreamRecord, StreamSeries, TimeSeries};

/// Time used when a write omits it.
pub const DEFAULT_TIME: f64 = 0.0;

/// Caller‑side record for stream‑like writes. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<IndexMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<IndexMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributions: Option<IndexMap<String, Vec<f64>>>,
}

impl StreamData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overall(mut self, key: &str, value: f64) -> Self {
        self.overall
            .get_or_insert_with(IndexMap::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn composition(mut self, label: &str, mass: f64) -> Self {
        self.composition
            .get_or_insert_with(IndexMap::new)
            .insert(label.to_string(), mass);
        self
    }

    pub fn distribution(mut self, name: &str, values: Vec<f64>) -> Self {
        self.distributions
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), values);
        self
    }
}

impl From<StreamRecord> for StreamData {
    fn from(record: StreamRecord) -> Self {
        Self {
            overall: Some(record.overall),
            composition: Some(record.composition),
            distributions: Some(record.distributions),
        }
    }
}

/// Fully resolved write, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamUpdate {
    compounds: Vec<(String, Phase, f64)>,
    phase_totals: Vec<(Phase, f64)>,
    overall: Vec<(OverallProperty, f64)>,
    distributions: Vec<(DistrType, Vec<f64>)>,
}

impl StreamUpdate {
    pub fn plan<M>(data: &StreamData, db: &M, catalog: &Catalog) -> Result<Self>
    where
        M: MaterialsDatabase + ?Sized,
    {
        let mut compounds = Vec::new();
        let mut phase_totals: Vec<(Phase, f64)> = Vec::new();
        for (label, mass) in data.composition.iter().flatten() {
            let (name, phase) = parse_composition_label(label)?;
            let key = resolve_compound(db, &name)?.key.clone();
            compounds.push((key, phase, *mass));
            match phase_totals.iter_mut().find(|(p, _)| *p == phase) {
                Some((_, total)) => *total += mass,
                None => phase_totals.push((phase, *mass)),
            }
        }

        // With a composition present the mass channel follows the phase
        // totals, so an explicit mass entry is ignored.
        let total: f64 = phase_totals.iter().map(|(_, m)| m).sum();
        let mut overall = Vec::new();
        if !phase_totals.is_empty() && total > 0.0 {
            overall.push((OverallProperty::Mass, total));
        }
        for (key, value) in data.overall.iter().flatten() {
            let property = parse_overall(key)?;
            if property == OverallProperty::Mass && !phase_totals.is_empty() {
                continue;
            }
            overall.push((property, *value));
        }

        let mut distributions = Vec::new();
        for (name, values) in data.distributions.iter().flatten() {
            let kind = distr_type(name)?;
            if !catalog.dimensions.contains(&kind) {
                return Err(DyssolError::InvalidArgument(format!(
                    "Distribution '{name}' is not part of the flowsheet grid"
                )));
            }
            distributions.push((kind, normalized(name, values)?));
        }

        Ok(Self {
            compounds,
            phase_totals,
            overall,
            distributions,
        })
    }

    /// Writes the update at `time`. Distribution lengths are checked
    /// against the stream before anything is written.
    pub fn apply(&self, stream: &mut dyn StreamLike, time: f64) -> Result<()> {
        self.check(stream, time)?;
        for (key, phase, mass) in &self.compounds {
            stream.set_compound_mass(time, key, *phase, *mass);
        }
        for (phase, total) in &self.phase_totals {
            stream.set_phase_mass(time, *phase, *total);
        }
        for (property, value) in &self.overall {
            stream.set_overall(time, *property, *value);
        }
        for (kind, values) in &self.distributions {
            stream.set_distribution(time, *kind, values);
        }
        Ok(())
    }

    /// Distribution lengths must match the stream's grid.
    pub fn check(&self, stream: &dyn StreamLike, time: f64) -> Result<()> {
        for (kind, values) in &self.distributions {
            let expected = stream.distribution(time, *kind).len();
            if values.len() != expected {
                return Err(DyssolError::SizeMismatch(format!(
                    "Distribution '{}' has {} classes, got {} values",
                    distr_name(*kind),
                    expected,
                    values.len()
                )));
            }
        }
        Ok(())
    }
}

// ── Series ──────────────────────────────────────────────────────────

/// Splits an all‑times record into one [`StreamData`] per time point.
///
/// Every non‑empty section must share the same time axis and every
/// series must have one entry per time point. Distribution rows that are
/// all zero mean "not set at this time" and are skipped. A slice with a
/// composition drops the compound distribution, which follows from it;
/// an empty composition section leaves the mass channel to `overall`.
pub fn series_slices(series: &StreamSeries) -> Result<Vec<(f64, StreamData)>> {
    let axis = [
        &series.overall.timepoints,
        &series.composition.timepoints,
        &series.distributions.timepoints,
    ]
    .into_iter()
    .find(|t| !t.is_empty())
    .cloned()
    .unwrap_or_default();

    check_axis("overall", &axis, &series.overall)?;
    check_axis("composition", &axis, &series.composition)?;
    check_axis("distributions", &axis, &series.distributions)?;

    let slices = axis
        .iter()
        .enumerate()
        .map(|(i, &time)| {
            let overall: IndexMap<String, f64> =
                series.overall.series.iter().map(|(k, v)| (k.clone(), v[i])).collect();
            let composition: IndexMap<String, f64> =
                series.composition.series.iter().map(|(k, v)| (k.clone(), v[i])).collect();
            let derived = (!composition.is_empty()).then(|| distr_name(DistrType::Compounds));
            let distributions: IndexMap<String, Vec<f64>> = series
                .distributions
                .series
                .iter()
                .filter(|(k, _)| Some(k.as_str()) != derived)
                .filter(|(_, rows)| rows[i].iter().any(|v| *v != 0.0))
                .map(|(k, rows)| (k.clone(), rows[i].clone()))
                .collect();
            let data = StreamData {
                overall: (!overall.is_empty()).then_some(overall),
                composition: (!composition.is_empty()).then_some(composition),
                distributions: (!distributions.is_empty()).then_some(distributions),
            };
            (time, data)
        })
        .collect();
    Ok(slices)
}

fn check_axis<T>(section: &str, axis: &[f64], series: &TimeSeries<T>) -> Result<()> {
    if series.series.is_empty() && series.timepoints.is_empty() {
        return Ok(());
    }
    let same_axis = series.timepoints.len() == axis.len()
        && series
            .timepoints
            .iter()
            .zip(axis)
            .all(|(a, b)| (a - b).abs() <= TIME_EPS);
    if !same_axis {
        return Err(DyssolError::InvalidArgument(format!(
            "Time points of '{section}' differ from the other sections"
        )));
    }
    if let Some((key, values)) = series.series.iter().find(|(_, v)| v.len() != axis.len()) {
        return Err(DyssolError::SizeMismatch(format!(
            "Series '{key}' in '{section}' has {} values for {} time points",
            values.len(),
            axis.len()
        )));
    }
    Ok(())
}

/// Scale `values` to sum to one.
pub fn normalized(name: &str, values: &[f64]) -> Result<Vec<f64>> {
    let sum: f64 = values.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(DyssolError::InvalidArgument(format!(
            "Distribution '{name}' cannot be normalized (sum = {sum})"
        )));
    }
    Ok(values.iter().map(|v| v / sum).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_scales_to_one() {
        let v = normalized("Size", &[1.0, 1.0, 2.0]).unwrap();
        assert_eq!(v, vec![0.25, 0.25, 0.5]);
        assert!(matches!(
            normalized("Size", &[0.0, 0.0]),
            Err(DyssolError::InvalidArgument(_))
        ));
        assert!(normalized("Size", &[]).is_err());
    }

    #[test]
    fn builder_collects_sections() {
        let data = StreamData::new()
            .overall("temperature", 300.0)
            .composition("Sand [solid]", 2.0);
        assert_eq!(data.overall.unwrap()["temperature"], 300.0);
        assert_eq!(data.composition.unwrap().len(), 1);
        assert!(data.distributions.is_none());
    }

    #[test]
    fn series_slices_skip_unset_and_derived_distributions() {
        let mut series = StreamSeries::default();
        series.overall.timepoints = vec![0.0, 10.0];
        series.overall.series.insert("temperature".to_string(), vec![300.0, 310.0]);
        series.composition.timepoints = vec![0.0, 10.0];
        series.composition.series.insert("Sand [solid]".to_string(), vec![1.0, 2.0]);
        series.distributions.timepoints = vec![0.0, 10.0];
        series.distributions.series.insert("Size".to_string(), vec![vec![0.0, 0.0], vec![1.0, 3.0]]);
        series.distributions.series.insert("Compounds".to_string(), vec![vec![1.0], vec![1.0]]);

        let slices = series_slices(&series).unwrap();
        assert_eq!(slices.len(), 2);
        let (t0, first) = &slices[0];
        assert_eq!(*t0, 0.0);
        assert!(first.distributions.is_none(), "zero row means not set");
        let (t1, second) = &slices[1];
        assert_eq!(*t1, 10.0);
        assert_eq!(second.composition.as_ref().unwrap()["Sand [solid]"], 2.0);
        let dists = second.distributions.as_ref().unwrap();
        assert_eq!(dists.keys().collect::<Vec<_>>(), vec!["Size"]);
    }

    #[test]
    fn series_slices_of_empty_record() {
        assert!(series_slices(&StreamSeries::default()).unwrap().is_empty());
    }
}
