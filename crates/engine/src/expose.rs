//! Rendering of a document's `expose` list into reportable values.

use crate::symbols::SymbolTable;
use crate::template;
use serde_json::{Map, Value};
use specrun_types::{ExposeEntry, ExposedValue};

/// Substitutes each expose expression against the table, in order. Entries
/// without an authored name are labeled by their position.
pub fn render(entries: &[ExposeEntry], table: &SymbolTable) -> Vec<ExposedValue> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| ExposedValue {
            label: entry.label.clone().unwrap_or_else(|| index.to_string()),
            value: template::substitute(&entry.expr, table),
        })
        .collect()
}

/// Collects exposed values into the mapping bound under `_steps.<task>`.
pub fn as_map(exposed: &[ExposedValue]) -> Value {
    let mut map = Map::new();
    for item in exposed {
        map.insert(item.label.clone(), item.value.clone());
    }
    Value::Object(map)
}
