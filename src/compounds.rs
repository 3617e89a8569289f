use crate::engine::{Compound, MaterialsDatabase};
use crate::error::*;

/// Resolve a user‑supplied compound reference: key first, then exact
/// (case‑sensitive) name.
pub fn resolve_compound<'a, M>(db: &'a M, key_or_name: &str) -> Result<&'a Compound>
where
    M: MaterialsDatabase + ?Sized,
{
    db.compound(key_or_name)
        .or_else(|| db.compound_by_name(key_or_name))
        .ok_or_else(|| DyssolError::NotFound(format!("Compound '{key_or_name}'")))
}

/// Display name of a compound key; falls back to the key itself when the
/// database does not know it.
pub fn compound_display_name<M>(db: &M, key: &str) -> String
where
    M: MaterialsDatabase + ?Sized,
{
    db.compound(key)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| key.to_string())
}

/// `(key, label name)` for every compound key of a flowsheet, in order
/// and without repeated keys. A display name shared by several compounds
/// is replaced by the key, so every label stays unique and resolvable.
pub fn named_compounds<M>(db: &M, keys: &[String]) -> Vec<(String, String)>
where
    M: MaterialsDatabase + ?Sized,
{
    let mut unique: Vec<&String> = Vec::with_capacity(keys.len());
    for k in keys {
        if !unique.contains(&k) {
            unique.push(k);
        }
    }
    let names: Vec<String> = unique.iter().map(|k| compound_display_name(db, k)).collect();
    unique
        .iter()
        .zip(&names)
        .map(|(k, name)| {
            let shared = names.iter().filter(|n| *n == name).count() > 1;
            let label = if shared { (*k).clone() } else { name.clone() };
            ((*k).clone(), label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryMaterials;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shared_names_fall_back_to_keys() {
        let db = MemoryMaterials::with_compounds(&[("C_A", "Salt"), ("C_B", "Salt"), ("C_W", "Water")]);
        let named = named_compounds(&db, &keys(&["C_A", "C_W", "C_B"]));
        let labels: Vec<&str> = named.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(labels, vec!["C_A", "Water", "C_B"]);
    }

    #[test]
    fn repeated_keys_are_listed_once() {
        let db = MemoryMaterials::with_compounds(&[("C_W", "Water")]);
        let named = named_compounds(&db, &keys(&["C_W", "C_X", "C_W"]));
        assert_eq!(
            named,
            vec![
                ("C_W".to_string(), "Water".to_string()),
                ("C_X".to_string(), "C_X".to_string())
            ]
        );
    }
}
