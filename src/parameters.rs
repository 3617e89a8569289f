//! Unit parameters and their conversion to and from [`Value`].
//!
//! Reads turn any of the seventeen parameter kinds into a dynamic value
//! (combo selections by option name, compounds by display name). Writes
//! dispatch on the pair *(incoming value, declared kind)* and accept a
//! small set of lossless coercions; everything else is a
//! [`DyssolError::TypeMismatch`].

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::compounds::{compound_display_name, resolve_compound};
use crate::engine::{MaterialsDatabase, Unit};
use crate::error::*;
use crate::names::Phase;
use crate::value::{ReactionRecord, SubstanceRecord, Value};

/// Returned by the generic read path for reaction parameters. Use
/// [`read_reactions`] for the full records.
pub const REACTION_PLACEHOLDER: &str = "[Reaction object]";

// ── Parameter model ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitParameter {
    pub name: String,
    /// Unit of measurement, informational only.
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub description: String,
    pub value: ParameterValue,
}

impl UnitParameter {
    pub fn new(name: &str, units: &str, value: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            description: String::new(),
            value,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn kind(&self) -> ParameterKind {
        self.value.kind()
    }
}

/// Current value of a unit parameter, one constructor per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Constant(f64),
    ConstDouble(f64),
    ConstInt64(i64),
    ConstUint64(u64),
    String(String),
    Checkbox(bool),
    Combo(ComboParameter),
    Solver(ComboParameter),
    Group(ComboParameter),
    /// Compound key from the flowsheet compound list.
    Compound(String),
    /// Compound key from the whole materials database.
    MdbCompound(String),
    Reaction(Vec<ChemicalReaction>),
    ListDouble(Vec<f64>),
    ListInt64(Vec<i64>),
    ListUint64(Vec<u64>),
    TimeDependent(DependentValues),
    ParamDependent {
        /// Name of the independent parameter supplying the x values.
        param_name: String,
        values: DependentValues,
    },
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Constant(_) => ParameterKind::Constant,
            ParameterValue::ConstDouble(_) => ParameterKind::ConstDouble,
            ParameterValue::ConstInt64(_) => ParameterKind::ConstInt64,
            ParameterValue::ConstUint64(_) => ParameterKind::ConstUint64,
            ParameterValue::String(_) => ParameterKind::String,
            ParameterValue::Checkbox(_) => ParameterKind::Checkbox,
            ParameterValue::Combo(_) => ParameterKind::Combo,
            ParameterValue::Solver(_) => ParameterKind::Solver,
            ParameterValue::Group(_) => ParameterKind::Group,
            ParameterValue::Compound(_) => ParameterKind::Compound,
            ParameterValue::MdbCompound(_) => ParameterKind::MdbCompound,
            ParameterValue::Reaction(_) => ParameterKind::Reaction,
            ParameterValue::ListDouble(_) => ParameterKind::ListDouble,
            ParameterValue::ListInt64(_) => ParameterKind::ListInt64,
            ParameterValue::ListUint64(_) => ParameterKind::ListUint64,
            ParameterValue::TimeDependent(_) => ParameterKind::TimeDependent,
            ParameterValue::ParamDependent { .. } => ParameterKind::ParamDependent,
        }
    }

    pub fn as_combo(&self) -> Option<&ComboParameter> {
        match self {
            ParameterValue::Combo(c) | ParameterValue::Solver(c) | ParameterValue::Group(c) => {
                Some(c)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Constant,
    ConstDouble,
    ConstInt64,
    ConstUint64,
    String,
    Checkbox,
    Combo,
    Solver,
    Group,
    Compound,
    MdbCompound,
    Reaction,
    ListDouble,
    ListInt64,
    ListUint64,
    TimeDependent,
    ParamDependent,
}

impl ParameterKind {
    /// Kind name reported by introspection queries. Legacy `Constant`
    /// parameters report as `CONSTANT_DOUBLE`.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKind::Constant | ParameterKind::ConstDouble => "CONSTANT_DOUBLE",
            ParameterKind::ConstInt64 => "CONSTANT_INT64",
            ParameterKind::ConstUint64 => "CONSTANT_UINT64",
            ParameterKind::String => "STRING",
            ParameterKind::Checkbox => "CHECKBOX",
            ParameterKind::Combo => "COMBO",
            ParameterKind::Solver => "SOLVER",
            ParameterKind::Group => "GROUP",
            ParameterKind::Compound => "COMPOUND",
            ParameterKind::MdbCompound => "MDB_COMPOUND",
            ParameterKind::Reaction => "REACTION",
            ParameterKind::ListDouble => "LIST_DOUBLE",
            ParameterKind::ListInt64 => "LIST_INT64",
            ParameterKind::ListUint64 => "LIST_UINT64",
            ParameterKind::TimeDependent => "TIME_DEPENDENT",
            ParameterKind::ParamDependent => "PARAM_DEPENDENT",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector over a fixed list of named options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboParameter {
    pub items: Vec<String>,
    pub selected: usize,
}

impl ComboParameter {
    pub fn new(items: &[&str], selected: &str) -> Self {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        let selected = items.iter().position(|s| s == selected).unwrap_or(0);
        Self { items, selected }
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|s| s == name)
    }
}

/// Parallel x/y vectors of a dependent parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependentValues {
    pub params: Vec<f64>,
    pub values: Vec<f64>,
}

impl DependentValues {
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let (params, values) = pairs.iter().copied().unzip();
        Self { params, values }
    }

    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.params
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalReaction {
    pub name: String,
    /// Index of the base substance in the flowsheet compound list.
    pub base_substance: usize,
    pub substances: Vec<ChemicalSubstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalSubstance {
    pub key: String,
    pub nu: f64,
    pub order: f64,
    pub phase: Phase,
}

// ── Read path ───────────────────────────────────────────────────────

/// `(value, kind, units)` triple returned by parameter listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub value: Value,
    pub kind: ParameterKind,
    pub units: String,
}

impl fmt::Display for ParameterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.units.is_empty() {
            write!(f, "{} ({})", self.value, self.kind)
        } else {
            write!(f, "{} [{}] ({})", self.value, self.units, self.kind)
        }
    }
}

pub fn read_value<M>(param: &UnitParameter, db: &M) -> Value
where
    M: MaterialsDatabase + ?Sized,
{
    match &param.value {
        ParameterValue::Constant(v) | ParameterValue::ConstDouble(v) => Value::Double(*v),
        ParameterValue::ConstInt64(v) => Value::Int(*v),
        ParameterValue::ConstUint64(v) => Value::UInt(*v),
        ParameterValue::String(s) => Value::String(s.clone()),
        ParameterValue::Checkbox(b) => Value::Bool(*b),
        ParameterValue::Combo(c) | ParameterValue::Solver(c) | ParameterValue::Group(c) => {
            Value::String(c.selected_name().unwrap_or_default().to_string())
        }
        ParameterValue::Compound(key) | ParameterValue::MdbCompound(key) => {
            Value::String(compound_display_name(db, key))
        }
        ParameterValue::Reaction(_) => Value::String(REACTION_PLACEHOLDER.to_string()),
        ParameterValue::ListDouble(v) => Value::DoubleList(v.clone()),
        ParameterValue::ListInt64(v) => Value::IntList(v.clone()),
        ParameterValue::ListUint64(v) => Value::UIntList(v.clone()),
        ParameterValue::TimeDependent(d) | ParameterValue::ParamDependent { values: d, .. } => {
            Value::Pairs(d.pairs())
        }
    }
}

pub fn describe<M>(param: &UnitParameter, db: &M) -> ParameterEntry
where
    M: MaterialsDatabase + ?Sized,
{
    ParameterEntry {
        value: read_value(param, db),
        kind: param.kind(),
        units: param.units.clone(),
    }
}

/// Parameters of a unit keyed by name, in declaration order.
pub fn list_parameters<M>(unit: &dyn Unit, db: &M, active_only: bool) -> IndexMap<String, ParameterEntry>
where
    M: MaterialsDatabase + ?Sized,
{
    let active = if active_only {
        Some(unit.active_parameters())
    } else {
        None
    };
    unit.parameters()
        .iter()
        .filter(|p| active.as_ref().is_none_or(|names| names.contains(&p.name)))
        .map(|p| (p.name.clone(), describe(p, db)))
        .collect()
}

/// Option names accepted by the write path of a combo‑style parameter.
pub fn combo_options(param: &UnitParameter) -> Result<Vec<String>> {
    param
        .value
        .as_combo()
        .map(|c| c.items.clone())
        .ok_or_else(|| DyssolError::TypeMismatch {
            parameter: param.name.clone(),
            expected: "COMBO, SOLVER or GROUP".to_string(),
            received: param.kind().to_string(),
        })
}

// ── Write path ──────────────────────────────────────────────────────

/// What the write path needs besides the parameter itself.
pub struct WriteContext<'a, M: MaterialsDatabase + ?Sized> {
    pub db: &'a M,
    /// Flowsheet compound keys, used to index reaction base substances.
    pub compounds: &'a [String],
}

pub fn write_value<M>(param: &mut UnitParameter, value: &Value, ctx: &WriteContext<'_, M>) -> Result<()>
where
    M: MaterialsDatabase + ?Sized,
{
    let name = param.name.clone();
    let kind = param.kind();
    let mismatch = || DyssolError::TypeMismatch {
        parameter: name.clone(),
        expected: kind.to_string(),
        received: value.kind_name().to_string(),
    };

    match (value, &mut param.value) {
        (Value::Bool(b), ParameterValue::Checkbox(v)) => *v = *b,

        (Value::Double(x), ParameterValue::Constant(v) | ParameterValue::ConstDouble(v)) => *v = *x,

        (Value::Int(i), ParameterValue::ConstInt64(v)) => *v = *i,
        (Value::Int(i), ParameterValue::ConstUint64(v)) => *v = to_unsigned(&name, *i)?,
        (Value::UInt(u), ParameterValue::ConstUint64(v)) => *v = *u,
        (Value::UInt(u), ParameterValue::ConstInt64(v)) => {
            *v = i64::try_from(*u).map_err(|_| {
                DyssolError::OutOfRange(format!("Parameter '{name}': {u} does not fit into int64"))
            })?
        }

        (Value::String(s), ParameterValue::String(v)) => *v = s.clone(),
        (Value::String(s), ParameterValue::Compound(v) | ParameterValue::MdbCompound(v)) => {
            *v = resolve_compound(ctx.db, s)?.key.clone()
        }
        (
            Value::String(s),
            ParameterValue::Combo(c) | ParameterValue::Solver(c) | ParameterValue::Group(c),
        ) => {
            c.selected = c.index_of(s).ok_or_else(|| {
                DyssolError::NotFound(format!(
                    "Option '{s}' of parameter '{name}'. Available: {}",
                    c.items.join(", ")
                ))
            })?
        }
        (Value::String(s), ParameterValue::ListInt64(v)) => *v = parse_int_list(&name, s)?,
        (Value::String(s), ParameterValue::ListUint64(v)) => {
            *v = parse_int_list(&name, s)?
                .into_iter()
                .map(|x| to_unsigned(&name, x))
                .collect::<Result<_>>()?
        }

        (Value::DoubleList(xs), ParameterValue::ListDouble(v)) => *v = xs.clone(),
        (Value::DoubleList(xs), ParameterValue::ListInt64(v)) => {
            *v = integral_list(&name, kind, xs)?
        }
        (Value::DoubleList(xs), ParameterValue::ListUint64(v)) => {
            *v = integral_list(&name, kind, xs)?
                .into_iter()
                .map(|x| to_unsigned(&name, x))
                .collect::<Result<_>>()?
        }

        (Value::IntList(xs), ParameterValue::ListInt64(_) | ParameterValue::ListUint64(_)) if xs.is_empty() => {
            return Err(empty_list(&name));
        }
        (Value::UIntList(xs), ParameterValue::ListUint64(_)) if xs.is_empty() => {
            return Err(empty_list(&name));
        }
        (Value::IntList(xs), ParameterValue::ListInt64(v)) => *v = xs.clone(),
        (Value::IntList(xs), ParameterValue::ListUint64(v)) => {
            *v = xs
                .iter()
                .map(|x| to_unsigned(&name, *x))
                .collect::<Result<_>>()?
        }
        (Value::UIntList(xs), ParameterValue::ListUint64(v)) => *v = xs.clone(),

        (
            Value::Pairs(pairs),
            ParameterValue::TimeDependent(d) | ParameterValue::ParamDependent { values: d, .. },
        ) => *d = DependentValues::from_pairs(pairs),

        (Value::Records(records), ParameterValue::Reaction(v)) => {
            *v = build_reactions(records, ctx.compounds)?
        }

        _ => return Err(mismatch()),
    }

    debug!("Set parameter '{name}' to {value}");
    Ok(())
}

fn to_unsigned(name: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        DyssolError::OutOfRange(format!(
            "Parameter '{name}' expects an unsigned integer, got {value}"
        ))
    })
}

fn empty_list(name: &str) -> DyssolError {
    DyssolError::Parse(format!("Parameter '{name}' received an empty list of integers"))
}

/// `"1, 2,3"` → `[1, 2, 3]`. Every token must be an integer in full.
fn parse_int_list(name: &str, text: &str) -> Result<Vec<i64>> {
    let values = text
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<i64>().map_err(|e| {
                DyssolError::Parse(format!(
                    "Parameter '{name}': invalid integer '{token}' in list ({e})"
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(empty_list(name));
    }
    Ok(values)
}

/// Doubles with zero fractional part, checked against the int64 range.
fn integral_list(name: &str, kind: ParameterKind, values: &[f64]) -> Result<Vec<i64>> {
    if values.is_empty() {
        return Err(empty_list(name));
    }
    values
        .iter()
        .map(|&x| {
            if !x.is_finite() || x.fract() != 0.0 {
                return Err(DyssolError::TypeMismatch {
                    parameter: name.to_string(),
                    expected: kind.to_string(),
                    received: format!("non-integer value {x}"),
                });
            }
            // i64::MAX is not representable as f64; 2^63 is the first value out of range.
            if x >= 9_223_372_036_854_775_808.0 || x < -9_223_372_036_854_775_808.0 {
                return Err(DyssolError::OutOfRange(format!(
                    "Parameter '{name}': {x} does not fit into int64"
                )));
            }
            Ok(x as i64)
        })
        .collect()
}

// ── Reactions ───────────────────────────────────────────────────────

fn build_reactions(records: &[ReactionRecord], compounds: &[String]) -> Result<Vec<ChemicalReaction>> {
    records
        .iter()
        .map(|record| {
            let base_substance = compounds
                .iter()
                .position(|k| *k == record.base)
                .ok_or_else(|| {
                    DyssolError::NotFound(format!(
                        "Base substance '{}' in flowsheet compounds",
                        record.base
                    ))
                })?;
            let substances = record
                .substances
                .iter()
                .map(|s| {
                    Ok(ChemicalSubstance {
                        key: s.key.clone(),
                        nu: s.nu,
                        order: s.order,
                        phase: s.phase.resolve()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ChemicalReaction {
                name: record.name.clone(),
                base_substance,
                substances,
            })
        })
        .collect()
}

/// Reactions of a reaction parameter in the same record format the
/// write path accepts.
///
/// Fails with [`DyssolError::NotFound`] when a stored base‑substance
/// index no longer points into the compound list.
pub fn read_reactions(param: &UnitParameter, compounds: &[String]) -> Result<Vec<ReactionRecord>> {
    let ParameterValue::Reaction(reactions) = &param.value else {
        return Err(DyssolError::TypeMismatch {
            parameter: param.name.clone(),
            expected: ParameterKind::Reaction.to_string(),
            received: param.kind().to_string(),
        });
    };
    reactions
        .iter()
        .map(|r| {
            let base = compounds.get(r.base_substance).ok_or_else(|| {
                DyssolError::NotFound(format!(
                    "Base substance #{} of reaction '{}' (flowsheet has {} compounds)",
                    r.base_substance,
                    r.name,
                    compounds.len()
                ))
            })?;
            Ok(ReactionRecord {
                name: r.name.clone(),
                base: base.clone(),
                substances: r
                    .substances
                    .iter()
                    .map(|s| SubstanceRecord {
                        key: s.key.clone(),
                        nu: s.nu,
                        order: s.order,
                        phase: s.phase.as_str().into(),
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Reactions rewritten for a new compound order: each base substance
/// keeps its key. A stored index that is already stale is left alone.
///
/// Fails with [`DyssolError::NotFound`] when a base substance is missing
/// from `new`.
pub fn remap_reactions(
    reactions: &[ChemicalReaction],
    old: &[String],
    new: &[String],
) -> Result<Vec<ChemicalReaction>> {
    reactions
        .iter()
        .map(|r| {
            let Some(key) = old.get(r.base_substance) else {
                return Ok(r.clone());
            };
            let base_substance = new.iter().position(|k| k == key).ok_or_else(|| {
                DyssolError::NotFound(format!(
                    "Base substance '{key}' of reaction '{}' in the new compound list",
                    r.name
                ))
            })?;
            Ok(ChemicalReaction {
                base_substance,
                ..r.clone()
            })
        })
        .collect()
}

// ── Dependent parameters ────────────────────────────────────────────

/// `(x, y)` pairs of a dependent parameter. For parameter‑dependent
/// kinds the x values come from the named independent parameter.
pub fn dependent_values(param: &UnitParameter, all: &[UnitParameter]) -> Result<Vec<(f64, f64)>> {
    let (xs, ys) = match &param.value {
        ParameterValue::TimeDependent(d) => (d.params.clone(), &d.values),
        ParameterValue::ParamDependent { param_name, values } => {
            let independent = all
                .iter()
                .find(|p| p.name == *param_name)
                .ok_or_else(|| {
                    DyssolError::NotFound(format!("Independent parameter '{param_name}'"))
                })?;
            let xs = match &independent.value {
                ParameterValue::Constant(x) | ParameterValue::ConstDouble(x) => vec![*x],
                ParameterValue::ListDouble(v) => v.clone(),
                ParameterValue::TimeDependent(d)
                | ParameterValue::ParamDependent { values: d, .. } => d.params.clone(),
                _ => {
                    return Err(DyssolError::TypeMismatch {
                        parameter: param_name.clone(),
                        expected: "CONSTANT_DOUBLE, LIST_DOUBLE or a dependent parameter"
                            .to_string(),
                        received: independent.kind().to_string(),
                    });
                }
            };
            (xs, &values.values)
        }
        _ => {
            return Err(DyssolError::TypeMismatch {
                parameter: param.name.clone(),
                expected: "TIME_DEPENDENT or PARAM_DEPENDENT".to_string(),
                received: param.kind().to_string(),
            });
        }
    };

    if xs.len() != ys.len() {
        return Err(DyssolError::SizeMismatch(format!(
            "Parameter '{}': {} independent values but {} dependent values",
            param.name,
            xs.len(),
            ys.len()
        )));
    }
    Ok(xs.into_iter().zip(ys.iter().copied()).collect())
}

/// Pairs of every dependent parameter of a unit. Parameters whose pairs
/// cannot be built are logged and skipped.
pub fn dependent_parameters(all: &[UnitParameter]) -> IndexMap<String, Vec<(f64, f64)>> {
    all.iter()
        .filter(|p| {
            matches!(
                p.kind(),
                ParameterKind::TimeDependent | ParameterKind::ParamDependent
            )
        })
        .filter_map(|p| match dependent_values(p, all) {
            Ok(pairs) => Some((p.name.clone(), pairs)),
            Err(e) => {
                warn!("Skipping dependent parameter '{}': {e}", p.name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_list_parsing_trims_and_rejects_garbage() {
        assert_eq!(parse_int_list("p", " 1, 2 ,3").unwrap(), vec![1, 2, 3]);
        assert!(matches!(parse_int_list("p", "1,2x"), Err(DyssolError::Parse(_))));
        assert!(matches!(parse_int_list("p", "1,,2"), Err(DyssolError::Parse(_))));
        assert!(matches!(parse_int_list("p", ""), Err(DyssolError::Parse(_))));
    }

    #[test]
    fn integral_list_rejects_fractions_and_overflow() {
        let kind = ParameterKind::ListInt64;
        assert_eq!(integral_list("p", kind, &[1.0, -2.0]).unwrap(), vec![1, -2]);
        assert!(matches!(
            integral_list("p", kind, &[3.7]),
            Err(DyssolError::TypeMismatch { .. })
        ));
        assert!(matches!(
            integral_list("p", kind, &[1e19]),
            Err(DyssolError::OutOfRange(_))
        ));
    }

    #[test]
    fn time_dependent_pairs_split_and_join() {
        let d = DependentValues::from_pairs(&[(0.0, 1.0), (10.0, 2.0)]);
        assert_eq!(d.params, vec![0.0, 10.0]);
        assert_eq!(d.values, vec![1.0, 2.0]);
        assert_eq!(d.pairs(), vec![(0.0, 1.0), (10.0, 2.0)]);
    }

    #[test]
    fn param_dependent_takes_x_from_list() {
        let all = vec![
            UnitParameter::new("x", "m", ParameterValue::ListDouble(vec![1.0, 2.0])),
            UnitParameter::new(
                "y",
                "-",
                ParameterValue::ParamDependent {
                    param_name: "x".to_string(),
                    values: DependentValues {
                        params: vec![],
                        values: vec![5.0, 6.0],
                    },
                },
            ),
        ];
        assert_eq!(
            dependent_values(&all[1], &all).unwrap(),
            vec![(1.0, 5.0), (2.0, 6.0)]
        );
    }

    #[test]
    fn param_dependent_size_mismatch() {
        let all = vec![
            UnitParameter::new("x", "m", ParameterValue::ConstDouble(1.0)),
            UnitParameter::new(
                "y",
                "-",
                ParameterValue::ParamDependent {
                    param_name: "x".to_string(),
                    values: DependentValues {
                        params: vec![],
                        values: vec![5.0, 6.0],
                    },
                },
            ),
        ];
        assert!(matches!(
            dependent_values(&all[1], &all),
            Err(DyssolError::SizeMismatch(_))
        ));
        assert!(dependent_parameters(&all).is_empty());
    }
}
