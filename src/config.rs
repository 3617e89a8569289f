use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::error::*;

/// Environment variable naming the materials database file.
pub const MATERIALS_PATH_VAR: &str = "DYSSOL_MATERIALS_PATH";
/// Environment variable naming the directory of unit‑model plugins.
pub const MODELS_PATH_VAR: &str = "DYSSOL_MODELS_PATH";

/// Default resource locations of a [`crate::Dyssol`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub materials_path: PathBuf,
    pub models_path: PathBuf,
}

impl Config {
    pub fn new(materials_path: impl Into<PathBuf>, models_path: impl Into<PathBuf>) -> Self {
        Self {
            materials_path: materials_path.into(),
            models_path: models_path.into(),
        }
    }

    /// Read both paths from the environment (a `.env` file is honoured),
    /// falling back to the platform's standard install locations.
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Ok(Self {
            materials_path: find_path(MATERIALS_PATH_VAR, &standard_materials_paths())?,
            models_path: find_path(MODELS_PATH_VAR, &standard_models_paths())?,
        })
    }
}

// ── .env loading (once) ─────────────────────────────────────────────

fn load_dotenv() {
    static DOTENV_INIT: Once = Once::new();
    DOTENV_INIT.call_once(|| {
        if dotenvy::dotenv().is_ok() { return; }
        if let Ok(dir) = env::var("CARGO_MANIFEST_DIR") {
            let p = PathBuf::from(dir).join(".env");
            if p.exists() { let _ = dotenvy::from_path(&p); return; }
        }
        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                let p = dir.join(".env");
                if p.exists() { let _ = dotenvy::from_path(&p); }
            }
        }
    });
}

// ── Path discovery ──────────────────────────────────────────────────

#[cfg(target_os = "windows")]
fn standard_materials_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from(r"C:\Program Files\Dyssol\Materials.dmdb"),
        PathBuf::from(r"C:\Program Files (x86)\Dyssol\Materials.dmdb"),
    ]
}
#[cfg(target_os = "windows")]
fn standard_models_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from(r"C:\Program Files\Dyssol\Units"),
        PathBuf::from(r"C:\Program Files (x86)\Dyssol\Units"),
    ]
}

#[cfg(not(target_os = "windows"))]
fn standard_materials_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/local/share/dyssol/Materials.dmdb"),
        PathBuf::from("/usr/share/dyssol/Materials.dmdb"),
        PathBuf::from("/opt/dyssol/Materials.dmdb"),
    ]
}
#[cfg(not(target_os = "windows"))]
fn standard_models_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/local/lib/dyssol/units"),
        PathBuf::from("/usr/lib/dyssol/units"),
        PathBuf::from("/opt/dyssol/units"),
    ]
}

fn find_path(var: &str, standard: &[PathBuf]) -> Result<PathBuf> {
    let mut tried = Vec::<String>::new();

    if let Ok(path) = env::var(var) {
        if Path::new(&path).exists() { return Ok(PathBuf::from(path)); }
        tried.push(format!("{var}={path} (does not exist)"));
    }

    for path in standard {
        if path.exists() { return Ok(path.clone()); }
        tried.push(format!("{} (not found)", path.display()));
    }

    Err(DyssolError::LoadFailed(format!(
        "Dyssol resource not found. Tried:\n  - {}\nSet {var} to the correct location.",
        tried.join("\n  - ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_lists_every_candidate() {
        let candidates = [PathBuf::from("/definitely/not/here")];
        let Err(DyssolError::LoadFailed(msg)) = find_path("DYSSOL_TEST_UNSET_VAR", &candidates) else {
            panic!("expected LoadFailed");
        };
        assert!(msg.contains("/definitely/not/here"));
        assert!(msg.contains("DYSSOL_TEST_UNSET_VAR"));
    }
}
