//! Layered variable namespace for one document execution.
//!
//! A [`SymbolTable`] is built once per execution and never shared across
//! executions. Entries arrive in three ordered layers, later layers
//! overwriting earlier ones by key:
//!
//! 1. process environment variables
//! 2. declared variables, inserted in declaration order; a value carrying
//!    template syntax ("composite") resolves against the environment and
//!    the declarations before it only
//! 3. externally supplied overrides (CLI or parent workflow)
//!
//! A final layer of runtime outputs (`_response`, `_data`, `_steps.<task>`)
//! is bound after payload execution, before assertions and expose run.

use crate::template;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use specrun_types::SpecError;

/// Declared variable names must start with a letter; a leading underscore is
/// reserved for runtime outputs.
static VARIABLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static pattern"));

/// Mapping from variable name to resolved value.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Map<String, Value>,
}

impl SymbolTable {
    /// An empty table; workflow-level tables start here.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table seeded with the process environment (layer 1).
    pub fn with_process_env() -> Self {
        let mut table = Self::new();
        for (key, value) in std::env::vars() {
            table.entries.insert(key, Value::String(value));
        }
        table
    }

    /// Inserts declared variables in declaration order, one single pass.
    ///
    /// A composite value substitutes against the table as it stands when
    /// its turn comes, so it sees the environment and the variables declared
    /// before it only. Referencing a variable declared later in the same
    /// block keeps the token as literal text rather than erroring.
    pub fn insert_declared(&mut self, variables: &Map<String, Value>) -> Result<(), SpecError> {
        for name in variables.keys() {
            if !VARIABLE_NAME.is_match(name) {
                return Err(SpecError::VariableNaming(name.clone()));
            }
        }

        for (name, value) in variables {
            let resolved = if template::value_has_tokens(value) {
                template::deep_substitute(value, self)
            } else {
                value.clone()
            };
            self.entries.insert(name.clone(), resolved);
        }

        Ok(())
    }

    /// Unconditional overwrite-by-key for externally supplied values, which
    /// win regardless of internal declaration order.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) {
        for (name, value) in overrides {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    /// Binds one computed value post-execution (e.g. `_response`, `_data`).
    pub fn bind_output(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_string(), value);
    }

    /// Binds a value under `<namespace>.<key>`, creating the namespace
    /// object if needed. Used for `_steps.<task>` workflow outputs.
    pub fn bind_namespaced_output(&mut self, namespace: &str, key: &str, value: Value) {
        let entry = self
            .entries
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value);
        }
    }

    /// Dot-path lookup. Numeric segments index into sequences. Any missing
    /// key, non-numeric index into a sequence, or out-of-range index yields
    /// `None` rather than an error.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.entries.get(segments.next()?)?;

        for segment in segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    current = items.get(index)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Dot-path lookup with a default for missing paths.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Number of entries currently in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
