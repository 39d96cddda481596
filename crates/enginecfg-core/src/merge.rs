//! Pure merge functions for the env-var collection.
//!
//! The control plane replaces the whole collection on write, so the merged
//! result must be a superset-by-key of what was fetched. These functions have
//! no network or clock dependency.

use crate::model::EnvVar;

/// Merge `updates` into `existing`, override-by-key.
///
/// Untouched existing entries keep their fetched order; an existing entry
/// whose name appears in `updates` is replaced in place; names new to the
/// collection are appended in the order the caller supplied them. When
/// `updates` itself repeats a name, the last occurrence wins.
pub fn merge_env(existing: &[EnvVar], updates: &[EnvVar]) -> Vec<EnvVar> {
    let mut merged: Vec<EnvVar> = existing
        .iter()
        .map(|var| {
            updates
                .iter()
                .rfind(|u| u.name == var.name)
                .unwrap_or(var)
                .clone()
        })
        .collect();

    for update in updates {
        if existing.iter().any(|e| e.name == update.name) {
            continue;
        }
        match merged.iter_mut().find(|m| m.name == update.name) {
            Some(slot) => slot.value = update.value.clone(),
            None => merged.push(update.clone()),
        }
    }

    merged
}

/// Drop entries whose name is in the removal set, preserving the order of
/// the survivors. Unknown names are ignored.
pub fn remove_env(existing: &[EnvVar], names: &[String]) -> Vec<EnvVar> {
    existing
        .iter()
        .filter(|var| !names.iter().any(|n| n == &var.name))
        .cloned()
        .collect()
}
