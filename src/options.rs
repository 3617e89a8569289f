//! Flat option map over the engine's simulation parameter holder.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::value::Value;

// ── Enumerations ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConvergenceMethod {
    DirectSubstitution,
    Wegstein,
    Steffensen,
}

impl ConvergenceMethod {
    pub const ALL: [ConvergenceMethod; 3] = [
        ConvergenceMethod::DirectSubstitution,
        ConvergenceMethod::Wegstein,
        ConvergenceMethod::Steffensen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConvergenceMethod::DirectSubstitution => "DIRECT_SUBSTITUTION",
            ConvergenceMethod::Wegstein => "WEGSTEIN",
            ConvergenceMethod::Steffensen => "STEFFENSEN",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| {
                DyssolError::InvalidArgument(format!(
                    "Unknown convergence method '{name}'. Valid: {}",
                    Self::ALL.map(Self::name).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtrapolationMethod {
    Linear,
    Spline,
    Nearest,
}

impl ExtrapolationMethod {
    pub const ALL: [ExtrapolationMethod; 3] = [
        ExtrapolationMethod::Linear,
        ExtrapolationMethod::Spline,
        ExtrapolationMethod::Nearest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExtrapolationMethod::Linear => "LINEAR",
            ExtrapolationMethod::Spline => "SPLINE",
            ExtrapolationMethod::Nearest => "NEAREST",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| {
                DyssolError::InvalidArgument(format!(
                    "Unknown extrapolation method '{name}'. Valid: {}",
                    Self::ALL.map(Self::name).join(", ")
                ))
            })
    }
}

// ── Parameter holder ────────────────────────────────────────────────

/// Solver settings of a flowsheet.
///
/// Times are in seconds, temperatures in kelvin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationOptions {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub min_fraction: f64,
    pub start_simulation_time: f64,
    pub end_simulation_time: f64,
    pub init_time_window: f64,
    pub min_time_window: f64,
    pub max_time_window: f64,
    pub max_iters_number: u32,
    pub iters_upper_limit: u32,
    pub iters_lower_limit: u32,
    #[serde(rename = "iters1stUpperLimit")]
    pub iters_1st_upper_limit: u32,
    pub magnification_ratio: f64,
    pub convergence_method: ConvergenceMethod,
    pub wegstein_accel_param: f64,
    pub relaxation_param: f64,
    pub extrapolation_method: ExtrapolationMethod,
    pub save_time_step: f64,
    pub save_time_step_flag_holdups: bool,
    #[serde(rename = "enthalpyMinT")]
    pub enthalpy_min_t: f64,
    #[serde(rename = "enthalpyMaxT")]
    pub enthalpy_max_t: f64,
    pub enthalpy_int: u32,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            abs_tol: 1e-6,
            rel_tol: 1e-3,
            min_fraction: 1e-9,
            start_simulation_time: 0.0,
            end_simulation_time: 3600.0,
            init_time_window: 1.0,
            min_time_window: 1e-9,
            max_time_window: 1e6,
            max_iters_number: 500,
            iters_upper_limit: 7,
            iters_lower_limit: 3,
            iters_1st_upper_limit: 20,
            magnification_ratio: 1.2,
            convergence_method: ConvergenceMethod::Wegstein,
            wegstein_accel_param: -0.5,
            relaxation_param: 1.0,
            extrapolation_method: ExtrapolationMethod::Linear,
            save_time_step: 0.0,
            save_time_step_flag_holdups: false,
            enthalpy_min_t: 173.0,
            enthalpy_max_t: 1273.0,
            enthalpy_int: 100,
        }
    }
}

// ── Key table ───────────────────────────────────────────────────────

/// Every option key, in listing order.
pub const OPTION_KEYS: [&str; 22] = [
    "absTol",
    "relTol",
    "minFraction",
    "startSimulationTime",
    "endSimulationTime",
    "initTimeWindow",
    "minTimeWindow",
    "maxTimeWindow",
    "maxItersNumber",
    "itersUpperLimit",
    "itersLowerLimit",
    "iters1stUpperLimit",
    "magnificationRatio",
    "convergenceMethod",
    "wegsteinAccelParam",
    "relaxationParam",
    "extrapolationMethod",
    "saveTimeStep",
    "saveTimeStepFlagHoldups",
    "enthalpyMinT",
    "enthalpyMaxT",
    "enthalpyInt",
];

/// Typed handle on one field of [`SimulationOptions`].
enum Field<'a> {
    Double(&'a mut f64),
    UInt32(&'a mut u32),
    Bool(&'a mut bool),
    Convergence(&'a mut ConvergenceMethod),
    Extrapolation(&'a mut ExtrapolationMethod),
}

fn field<'a>(o: &'a mut SimulationOptions, key: &str) -> Option<Field<'a>> {
    Some(match key {
        "absTol" => Field::Double(&mut o.abs_tol),
        "relTol" => Field::Double(&mut o.rel_tol),
        "minFraction" => Field::Double(&mut o.min_fraction),
        "startSimulationTime" => Field::Double(&mut o.start_simulation_time),
        "endSimulationTime" => Field::Double(&mut o.end_simulation_time),
        "initTimeWindow" => Field::Double(&mut o.init_time_window),
        "minTimeWindow" => Field::Double(&mut o.min_time_window),
        "maxTimeWindow" => Field::Double(&mut o.max_time_window),
        "maxItersNumber" => Field::UInt32(&mut o.max_iters_number),
        "itersUpperLimit" => Field::UInt32(&mut o.iters_upper_limit),
        "itersLowerLimit" => Field::UInt32(&mut o.iters_lower_limit),
        "iters1stUpperLimit" => Field::UInt32(&mut o.iters_1st_upper_limit),
        "magnificationRatio" => Field::Double(&mut o.magnification_ratio),
        "convergenceMethod" => Field::Convergence(&mut o.convergence_method),
        "wegsteinAccelParam" => Field::Double(&mut o.wegstein_accel_param),
        "relaxationParam" => Field::Double(&mut o.relaxation_param),
        "extrapolationMethod" => Field::Extrapolation(&mut o.extrapolation_method),
        "saveTimeStep" => Field::Double(&mut o.save_time_step),
        "saveTimeStepFlagHoldups" => Field::Bool(&mut o.save_time_step_flag_holdups),
        "enthalpyMinT" => Field::Double(&mut o.enthalpy_min_t),
        "enthalpyMaxT" => Field::Double(&mut o.enthalpy_max_t),
        "enthalpyInt" => Field::UInt32(&mut o.enthalpy_int),
        _ => return None,
    })
}

impl Field<'_> {
    fn get(&self) -> Value {
        match self {
            Field::Double(v) => Value::Double(**v),
            Field::UInt32(v) => Value::UInt(u64::from(**v)),
            Field::Bool(v) => Value::Bool(**v),
            Field::Convergence(v) => Value::String(v.name().to_string()),
            Field::Extrapolation(v) => Value::String(v.name().to_string()),
        }
    }

    fn set(self, key: &str, value: &Value) -> Result<()> {
        let mismatch = |expected: &str| DyssolError::TypeMismatch {
            parameter: key.to_string(),
            expected: expected.to_string(),
            received: value.kind_name().to_string(),
        };
        match self {
            Field::Double(v) => *v = value.as_f64().ok_or_else(|| mismatch("double"))?,
            Field::UInt32(v) => {
                let wide = match value {
                    Value::UInt(u) => *u,
                    Value::Int(i) => u64::try_from(*i).map_err(|_| out_of_range(key, i))?,
                    _ => return Err(mismatch("uint32")),
                };
                *v = u32::try_from(wide).map_err(|_| out_of_range(key, &wide))?;
            }
            Field::Bool(v) => *v = value.as_bool().ok_or_else(|| mismatch("bool"))?,
            Field::Convergence(v) => {
                *v = ConvergenceMethod::from_name(value.as_str().ok_or_else(|| mismatch("string"))?)?
            }
            Field::Extrapolation(v) => {
                *v = ExtrapolationMethod::from_name(value.as_str().ok_or_else(|| mismatch("string"))?)?
            }
        }
        Ok(())
    }
}

fn out_of_range(key: &str, value: &dyn std::fmt::Display) -> DyssolError {
    DyssolError::OutOfRange(format!("Option '{key}' expects a uint32, got {value}"))
}

// ── Codec ───────────────────────────────────────────────────────────

pub fn read_options(options: &SimulationOptions) -> IndexMap<String, Value> {
    let mut scratch = options.clone();
    let mut out = IndexMap::new();
    for key in OPTION_KEYS {
        if let Some(f) = field(&mut scratch, key) {
            out.insert(key.to_string(), f.get());
        }
    }
    out
}

/// Apply every known key of `incoming`; unknown keys are skipped. The
/// write is all‑or‑nothing: on error `options` is left untouched.
pub fn write_options(options: &mut SimulationOptions, incoming: &IndexMap<String, Value>) -> Result<()> {
    let mut staged = options.clone();
    for (key, value) in incoming {
        match field(&mut staged, key) {
            Some(f) => f.set(key, value)?,
            None => debug!("Ignoring unknown option '{key}'"),
        }
    }
    *options = staged;
    Ok(())
}

/// Accepted names of the two enumeration options.
pub fn option_methods() -> IndexMap<String, Vec<String>> {
    let mut out = IndexMap::new();
    out.insert(
        "convergenceMethod".to_string(),
        ConvergenceMethod::ALL.iter().map(|m| m.name().to_string()).collect(),
    );
    out.insert(
        "extrapolationMethod".to_string(),
        ExtrapolationMethod::ALL.iter().map(|m| m.name().to_string()).collect(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_readable() {
        let map = read_options(&SimulationOptions::default());
        assert_eq!(map.len(), 22);
        assert_eq!(map["convergenceMethod"], Value::from("WEGSTEIN"));
        assert_eq!(map["maxItersNumber"], Value::UInt(500));
    }

    #[test]
    fn uint32_range_is_checked() {
        let mut o = SimulationOptions::default();
        let mut m = IndexMap::new();
        m.insert("enthalpyInt".to_string(), Value::Int(-1));
        assert!(matches!(write_options(&mut o, &m), Err(DyssolError::OutOfRange(_))));
        m.insert("enthalpyInt".to_string(), Value::UInt(u64::from(u32::MAX) + 1));
        assert!(matches!(write_options(&mut o, &m), Err(DyssolError::OutOfRange(_))));
        assert_eq!(o.enthalpy_int, 100);
    }

    #[test]
    fn rejected_write_leaves_options_untouched() {
        let mut o = SimulationOptions::default();
        let mut m = IndexMap::new();
        m.insert("absTol".to_string(), Value::Double(1e-9));
        m.insert("extrapolationMethod".to_string(), Value::from("CUBIC"));
        assert!(matches!(write_options(&mut o, &m), Err(DyssolError::InvalidArgument(_))));
        assert_eq!(o, SimulationOptions::default());
    }
}
