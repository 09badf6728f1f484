//! Deterministic tool naming (spec.md §4.1, "Naming").

/// `tool_name = "{service_name}__{operation_id}"`.
#[must_use]
pub fn tool_name(service_name: &str, operation_id: &str) -> String {
    format!("{service_name}__{operation_id}")
}

/// Derive a spec-local operation id from an HTTP method and path when the
/// source format doesn't supply one: `{method}_{path}` with every
/// non-identifier character collapsed to `_`.
#[must_use]
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let raw = format!("{}_{}", method.to_ascii_lowercase(), path);
    let mut id = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            id.push('_');
            prev_underscore = true;
        }
    }
    id.trim_matches('_').to_string()
}

/// A registry of already-assigned tool names, used to detect collisions
/// across services (spec.md §3 invariant: `tool_name` unique process-wide).
#[derive(Debug, Default)]
pub struct NameLedger {
    seen: std::collections::HashSet<String>,
}

impl NameLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, returning `false` if it was already taken.
    #[must_use]
    pub fn claim(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_joins_with_double_underscore() {
        assert_eq!(tool_name("petstore", "listPets"), "petstore__listPets");
    }

    #[test]
    fn derive_operation_id_collapses_path_segments() {
        assert_eq!(derive_operation_id("GET", "/pets/{id}"), "get_pets_id");
    }

    #[test]
    fn derive_operation_id_collapses_repeated_separators() {
        assert_eq!(derive_operation_id("POST", "//v1//users"), "post_v1_users");
    }

    #[test]
    fn name_ledger_detects_collision() {
        let mut ledger = NameLedger::new();
        assert!(ledger.claim("a__b"));
        assert!(!ledger.claim("a__b"));
    }
}
