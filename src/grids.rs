//! Distribution grids: listing and validated replacement.
//!
//! The compound dimension is owned by the compound list and never
//! appears here.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::{GridClasses, GridDimension};
use crate::error::*;
use crate::names::{allowed_distr_names, distr_name, distr_type, DistrType};

/// `{ "type": "Size", "grid": [0.0, 1e-4, 1e-3] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub grid: GridClasses,
}

impl GridSpec {
    pub fn numeric(kind: &str, limits: Vec<f64>) -> Self {
        Self {
            kind: kind.to_string(),
            grid: GridClasses::Numeric(limits),
        }
    }

    pub fn symbolic(kind: &str, names: &[&str]) -> Self {
        Self {
            kind: kind.to_string(),
            grid: GridClasses::Symbolic(names.iter().map(|s| s.to_string()).collect()),
        }
    }
}

pub fn read_grids(dimensions: &[GridDimension]) -> Vec<GridSpec> {
    dimensions
        .iter()
        .filter(|d| d.kind != DistrType::Compounds)
        .map(|d| GridSpec {
            kind: distr_name(d.kind).to_string(),
            grid: d.classes.clone(),
        })
        .collect()
}

fn check(spec: &GridSpec) -> std::result::Result<GridDimension, String> {
    let kind = distr_type(&spec.kind).map_err(|_| {
        format!(
            "Invalid grid type '{}'. Valid types: {}",
            spec.kind,
            allowed_distr_names()
        )
    })?;
    if kind == DistrType::Compounds {
        return Err("The 'Compounds' grid follows the compound list; use set_compounds".to_string());
    }
    match &spec.grid {
        GridClasses::Numeric(limits) => {
            if limits.len() < 2 {
                return Err(format!(
                    "Numeric grid '{}' needs at least two class limits",
                    spec.kind
                ));
            }
            if limits.windows(2).any(|w| w[1] <= w[0]) {
                return Err(format!(
                    "Numeric grid '{}' must be strictly increasing",
                    spec.kind
                ));
            }
        }
        GridClasses::Symbolic(names) => {
            if names.is_empty() {
                return Err(format!("Empty grid provided for type '{}'", spec.kind));
            }
            let mut sorted: Vec<&String> = names.iter().collect();
            sorted.sort();
            sorted.dedup();
            if sorted.len() != names.len() {
                return Err(format!(
                    "Symbolic grid '{}' entries must be unique",
                    spec.kind
                ));
            }
        }
    }
    Ok(GridDimension {
        kind,
        classes: spec.grid.clone(),
    })
}

/// Validate every spec; all problems are reported at once.
pub fn validate_grids(specs: &[GridSpec]) -> Result<Vec<GridDimension>> {
    let mut dimensions = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();
    for spec in specs {
        match check(spec) {
            Ok(d) if dimensions.iter().any(|x: &GridDimension| x.kind == d.kind) => {
                errors.push(format!("Grid type '{}' given twice", spec.kind))
            }
            Ok(d) => dimensions.push(d),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        return Err(DyssolError::InvalidArgument(format!(
            "Failed to set grids:\n  - {}",
            errors.join("\n  - ")
        )));
    }
    Ok(dimensions)
}

/// Non‑compound dimensions after adding `spec`, replacing a dimension of
/// the same type if present.
pub fn with_grid(current: &[GridDimension], spec: &GridSpec) -> Result<Vec<GridDimension>> {
    let added = validate_grids(std::slice::from_ref(spec))?.remove(0);
    let mut out: Vec<GridDimension> = current
        .iter()
        .filter(|d| d.kind != DistrType::Compounds)
        .cloned()
        .collect();
    match out.iter_mut().find(|d| d.kind == added.kind) {
        Some(existing) => {
            warn!("Replacing existing grid of type '{}'", spec.kind);
            *existing = added;
        }
        None => out.push(added),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_problems_are_listed() {
        let specs = vec![
            GridSpec::numeric("Size", vec![0.0, 2.0, 1.0]),
            GridSpec::symbolic("Color", &["red", "red"]),
            GridSpec::numeric("Temperature", vec![0.0, 1.0]),
        ];
        let Err(DyssolError::InvalidArgument(msg)) = validate_grids(&specs) else {
            panic!("expected InvalidArgument");
        };
        assert!(msg.contains("strictly increasing"));
        assert!(msg.contains("unique"));
        assert!(msg.contains("Temperature"));
    }

    #[test]
    fn compound_grid_is_refused() {
        let specs = vec![GridSpec::symbolic("Compounds", &["A"])];
        assert!(validate_grids(&specs).is_err());
    }

    #[test]
    fn add_replaces_same_type() {
        let current = vec![
            GridDimension {
                kind: DistrType::Compounds,
                classes: GridClasses::Symbolic(vec!["A".into()]),
            },
            GridDimension {
                kind: DistrType::Size,
                classes: GridClasses::Numeric(vec![0.0, 1.0]),
            },
        ];
        let next = with_grid(&current, &GridSpec::numeric("Size", vec![0.0, 1.0, 2.0])).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].classes_count(), 2);
    }
}
