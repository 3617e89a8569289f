//! Name ↔ enum codecs shared by every stream‑like projection.
//!
//! Phases, composition labels (`"Sand [solid]"`), overall‑property keys
//! and grid‑dimension names all pass through here so that readers and
//! writers agree on spelling.

use serde::{Deserialize, Serialize};

use crate::error::*;

// ── Phases ──────────────────────────────────────────────────────────

/// Aggregate state of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Solid,
    Liquid,
    Vapor,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Solid, Phase::Liquid, Phase::Vapor];

    /// Lower‑case name used in composition labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Solid => "solid",
            Phase::Liquid => "liquid",
            Phase::Vapor => "vapor",
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Phase::Solid => 0,
            Phase::Liquid => 1,
            Phase::Vapor => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = DyssolError;

    fn from_str(s: &str) -> Result<Self> {
        parse_phase(s)
    }
}

/// Case‑insensitive phase parsing. `GAS` is accepted as an alias of
/// `VAPOR`; surrounding whitespace is ignored, so `" solid "` parses.
pub fn parse_phase(name: &str) -> Result<Phase> {
    match name.trim().to_uppercase().as_str() {
        "SOLID" => Ok(Phase::Solid),
        "LIQUID" => Ok(Phase::Liquid),
        "VAPOR" | "GAS" => Ok(Phase::Vapor),
        _ => Err(DyssolError::InvalidArgument(format!(
            "Unknown phase '{name}'. Use 'solid', 'liquid', 'vapor' or 'gas'"
        ))),
    }
}

/// Integer phase code: 0 = solid, 1 = liquid, 2 = vapor.
pub fn phase_from_index(index: i64) -> Result<Phase> {
    match index {
        0 => Ok(Phase::Solid),
        1 => Ok(Phase::Liquid),
        2 => Ok(Phase::Vapor),
        _ => Err(DyssolError::InvalidArgument(format!(
            "Phase index must be 0 (solid), 1 (liquid) or 2 (vapor), got {index}"
        ))),
    }
}

/// Any of the accepted ways to name a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseSpec {
    Index(i64),
    Name(String),
}

impl PhaseSpec {
    pub fn resolve(&self) -> Result<Phase> {
        match self {
            PhaseSpec::Index(i) => phase_from_index(*i),
            PhaseSpec::Name(s) => parse_phase(s),
        }
    }
}

impl From<Phase> for PhaseSpec {
    fn from(phase: Phase) -> Self {
        PhaseSpec::Index(phase.index())
    }
}

impl From<&str> for PhaseSpec {
    fn from(name: &str) -> Self {
        PhaseSpec::Name(name.to_string())
    }
}

impl From<i64> for PhaseSpec {
    fn from(index: i64) -> Self {
        PhaseSpec::Index(index)
    }
}

// ── Composition labels ──────────────────────────────────────────────

/// Canonical `"<Name> [<phase>]"` label.
pub fn composition_label(compound_name: &str, phase: Phase) -> String {
    format!("{compound_name} [{}]", phase.as_str())
}

/// Split a composition label into compound name and phase.
///
/// Labels without a trailing `[phase]` are taken as a bare compound
/// name in the solid phase.
pub fn parse_composition_label(label: &str) -> Result<(String, Phase)> {
    let trimmed = label.trim_end();
    let (name, phase) = match (trimmed.strip_suffix(']'), trimmed.rfind(" [")) {
        (Some(body), Some(split)) if split < body.len() => {
            let phase = parse_phase(&body[split + 2..])?;
            (body[..split].trim(), phase)
        }
        _ => (trimmed, Phase::Solid),
    };
    if name.is_empty() {
        return Err(DyssolError::Parse(format!(
            "Composition label '{label}' has no compound name"
        )));
    }
    Ok((name.to_string(), phase))
}

// ── Overall properties ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallProperty {
    Mass,
    Temperature,
    Pressure,
}

impl OverallProperty {
    pub const ALL: [OverallProperty; 3] = [
        OverallProperty::Mass,
        OverallProperty::Temperature,
        OverallProperty::Pressure,
    ];

    /// Record key: holdups carry `mass`, flowing stream‑likes `massflow`.
    pub fn key(self, flowing: bool) -> &'static str {
        match self {
            OverallProperty::Mass if flowing => "massflow",
            OverallProperty::Mass => "mass",
            OverallProperty::Temperature => "temperature",
            OverallProperty::Pressure => "pressure",
        }
    }
}

/// `mass` and `massflow` both address the mass channel.
pub fn parse_overall(key: &str) -> Result<OverallProperty> {
    match key {
        "mass" | "massflow" => Ok(OverallProperty::Mass),
        "temperature" => Ok(OverallProperty::Temperature),
        "pressure" => Ok(OverallProperty::Pressure),
        _ => Err(DyssolError::InvalidArgument(format!(
            "Unknown overall property '{key}'. Use 'mass', 'massflow', 'temperature' or 'pressure'"
        ))),
    }
}

// ── Distribution types ──────────────────────────────────────────────

/// Grid dimension tags known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistrType {
    Compounds,
    Size,
    ParticlePorosity,
    FormFactor,
    Color,
    Moisture,
    UserDefined01,
    UserDefined02,
    UserDefined03,
    UserDefined04,
    UserDefined05,
    UserDefined06,
    UserDefined07,
    UserDefined08,
    UserDefined09,
    UserDefined10,
}

pub const DISTR_TYPES: [DistrType; 16] = [
    DistrType::Compounds,
    DistrType::Size,
    DistrType::ParticlePorosity,
    DistrType::FormFactor,
    DistrType::Color,
    DistrType::Moisture,
    DistrType::UserDefined01,
    DistrType::UserDefined02,
    DistrType::UserDefined03,
    DistrType::UserDefined04,
    DistrType::UserDefined05,
    DistrType::UserDefined06,
    DistrType::UserDefined07,
    DistrType::UserDefined08,
    DistrType::UserDefined09,
    DistrType::UserDefined10,
];

pub const DISTR_NAMES: [&str; 16] = [
    "Compounds",
    "Size",
    "Particle porosity",
    "Form factor",
    "Color",
    "Moisture",
    "User defined 01",
    "User defined 02",
    "User defined 03",
    "User defined 04",
    "User defined 05",
    "User defined 06",
    "User defined 07",
    "User defined 08",
    "User defined 09",
    "User defined 10",
];

pub fn distr_name(kind: DistrType) -> &'static str {
    DISTR_TYPES
        .iter()
        .position(|t| *t == kind)
        .map(|i| DISTR_NAMES[i])
        .unwrap_or("Unknown")
}

pub fn distr_type(name: &str) -> Result<DistrType> {
    DISTR_NAMES
        .iter()
        .position(|n| *n == name)
        .map(|i| DISTR_TYPES[i])
        .ok_or_else(|| {
            DyssolError::InvalidArgument(format!(
                "Unknown distribution '{name}'. Valid names: {}",
                allowed_distr_names()
            ))
        })
}

pub fn allowed_distr_names() -> String {
    DISTR_NAMES.join(", ")
}

// ── Number formatting ───────────────────────────────────────────────

/// Compact rendering used by the pretty printers: four decimals with
/// trailing zeros stripped, scientific notation outside `[1e-6, 1e6]`.
pub fn format_double(value: f64) -> String {
    fn trim(s: &str) -> &str {
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s
        }
    }

    let abs = value.abs();
    if abs > 0.0 && !(1e-6..=1e6).contains(&abs) {
        let s = format!("{value:.4e}");
        match s.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{exponent}", trim(mantissa)),
            None => s,
        }
    } else {
        let s = format!("{value:.4}");
        let t = trim(&s);
        if t == "-0" { "0".to_string() } else { t.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_with_spaces_in_name() {
        let (name, phase) = parse_composition_label("Sodium chloride [liquid]").unwrap();
        assert_eq!(name, "Sodium chloride");
        assert_eq!(phase, Phase::Liquid);
    }

    #[test]
    fn label_with_unknown_phase_is_rejected() {
        assert!(matches!(
            parse_composition_label("Sand [plasma]"),
            Err(DyssolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bracket_only_label_is_a_parse_error() {
        assert!(matches!(
            parse_composition_label(" [solid]"),
            Err(DyssolError::Parse(_))
        ));
    }

    #[test]
    fn distr_tables_are_parallel() {
        for (kind, name) in DISTR_TYPES.iter().zip(DISTR_NAMES) {
            assert_eq!(distr_name(*kind), name);
            assert_eq!(distr_type(name).unwrap(), *kind);
        }
    }

    #[test]
    fn format_double_trims() {
        assert_eq!(format_double(2.5), "2.5");
        assert_eq!(format_double(300.0), "300");
        assert_eq!(format_double(0.0), "0");
        assert_eq!(format_double(1e-11), "1e-11");
        assert_eq!(format_double(2.5e7), "2.5e7");
    }
}
