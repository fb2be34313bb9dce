//! JSON rendering of values and tables.
//!
//! Object keys keep their document order, and integers stay distinct from
//! floats.
//!
//! ```
//! use djc::Value;
//! use djc::output::{to_json, to_json_pretty};
//!
//! let value = Value::Integer(42);
//! assert_eq!(to_json(&value), "42");
//! assert_eq!(to_json_pretty(&value), "42");
//! ```

use serde_json::json;

use crate::{extractor::Table, value::Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.render(&serde_json::Value::from(value.clone()))
    }

    fn render(&self, json: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(json)
        } else {
            serde_json::to_string(json)
        };
        // serde_json::Value always serializes
        rendered.unwrap_or_default()
    }
}

/// `{"header": [...], "rows": [{...}, ...]}`, each row keyed in header
/// order with absent columns as null.
pub fn table_to_json(table: &Table) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let fields: serde_json::Map<String, serde_json::Value> = table
                .header
                .iter()
                .map(|column| {
                    let value = row.get(column).cloned().unwrap_or(Value::Null);
                    (column.clone(), serde_json::Value::from(value))
                })
                .collect();
            serde_json::Value::Object(fields)
        })
        .collect();
    json!({ "header": table.header, "rows": rows })
}

pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Row;

    #[test]
    fn test_compact_keeps_key_order() {
        let value = Value::from(json!({"b": 1, "a": [1.5, null, "x"]}));
        assert_eq!(to_json(&value), r#"{"b":1,"a":[1.5,null,"x"]}"#);
    }

    #[test]
    fn test_table_fills_missing_columns() {
        let mut row = Row::new();
        row.insert("b".into(), Value::Integer(2));
        let table = Table {
            header: vec!["a".into(), "b".into()],
            rows: vec![row],
        };
        assert_eq!(
            table_to_json(&table),
            json!({"header": ["a", "b"], "rows": [{"a": null, "b": 2}]})
        );
    }
}
