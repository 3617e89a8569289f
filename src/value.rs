use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::{format_double, PhaseSpec};

/// Dynamic value exchanged with callers of the parameter and options
/// surfaces.
///
/// The variant order matters for untagged deserialization: JSON `5`
/// lands in [`Value::Int`], `[1, 2]` in [`Value::IntList`], and
/// `[[0.0, 1.0]]` in [`Value::Pairs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    IntList(Vec<i64>),
    UIntList(Vec<u64>),
    DoubleList(Vec<f64>),
    Pairs(Vec<(f64, f64)>),
    Records(Vec<ReactionRecord>),
}

impl Value {
    /// Short tag used in type‑mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::IntList(_) => "list<int>",
            Value::UIntList(_) => "list<uint>",
            Value::DoubleList(_) => "list<double>",
            Value::Pairs(_) => "list<(double, double)>",
            Value::Records(_) => "list<reaction>",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntList(v)
    }
}

impl From<Vec<u64>> for Value {
    fn from(v: Vec<u64>) -> Self {
        Value::UIntList(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::DoubleList(v)
    }
}

impl From<Vec<(f64, f64)>> for Value {
    fn from(v: Vec<(f64, f64)>) -> Self {
        Value::Pairs(v)
    }
}

impl From<Vec<ReactionRecord>> for Value {
    fn from(v: Vec<ReactionRecord>) -> Self {
        Value::Records(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T>(f: &mut fmt::Formatter<'_>, items: &[T], mut one: impl FnMut(&T) -> String) -> fmt::Result {
            let parts: Vec<String> = items.iter().map(|x| one(x)).collect();
            write!(f, "[{}]", parts.join(", "))
        }

        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Double(v) => f.write_str(&format_double(*v)),
            Value::String(s) => f.write_str(s),
            Value::IntList(v) => list(f, v, |x| x.to_string()),
            Value::UIntList(v) => list(f, v, |x| x.to_string()),
            Value::DoubleList(v) => list(f, v, |x| format_double(*x)),
            Value::Pairs(v) => list(f, v, |(x, y)| {
                format!("({}, {})", format_double(*x), format_double(*y))
            }),
            Value::Records(v) => list(f, v, |r| r.name.clone()),
        }
    }
}

// ── Reaction records ────────────────────────────────────────────────

/// Write format of a chemical reaction.
///
/// `base` is a compound key; it must be part of the flowsheet compound
/// list at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub name: String,
    pub base: String,
    pub substances: Vec<SubstanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceRecord {
    pub key: String,
    /// Stoichiometric coefficient (negative for reactants).
    pub nu: f64,
    pub order: f64,
    pub phase: PhaseSpec,
}
