use std::collections::HashSet;

/// Dedup key for a display name: lowercase ASCII letters and digits only.
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Set of dedup keys already claimed. Empty keys are never stored, so two
/// records whose names normalize to nothing are never considered equal.
#[derive(Debug, Default)]
pub struct DedupKeys {
    seen: HashSet<String>,
}

impl DedupKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the key was non-empty and not seen before.
    pub fn insert(&mut self, key: String) -> bool {
        if key.is_empty() {
            return false;
        }
        self.seen.insert(key)
    }
}
