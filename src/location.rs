use std::fmt;

use crate::value::Value;

/// One step of an address inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Object field access by name
    Field(String),

    /// Array element access by position
    Index(usize),
}

/// Address of a node inside a document, from the root down.
///
/// The mapper locates the nodes a path selects and writes through these
/// addresses, since evaluating a path only yields copies.
///
/// # Examples
///
/// For `customers[1].employees` the location is:
/// - `Step::Field("customers")`
/// - `Step::Index(1)`
/// - `Step::Field("employees")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location(Vec<Step>);

impl Location {
    /// The document itself.
    pub fn root() -> Self {
        Location(Vec::new())
    }

    pub fn field(&self, key: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step::Field(key.to_string()));
        Location(steps)
    }

    pub fn index(&self, i: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step::Index(i));
        Location(steps)
    }

    /// Follow the address; `None` once a step no longer matches the data.
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for step in &self.0 {
            current = match (step, current) {
                (Step::Field(key), Value::Object(map)) => map.get(key)?,
                (Step::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = document;
        for step in &self.0 {
            current = match (step, current) {
                (Step::Field(key), Value::Object(map)) => map.get_mut(key)?,
                (Step::Index(i), Value::Array(items)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for step in &self.0 {
            match step {
                Step::Field(key) => write!(f, ".{key}")?,
                Step::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_and_display() {
        let doc = Value::from(json!({"a": [{"b": 1}, {"b": 2}]}));
        let loc = Location::root().field("a").index(1).field("b");
        assert_eq!(loc.get(&doc), Some(&Value::Integer(2)));
        assert_eq!(loc.to_string(), "$.a[1].b");
        assert_eq!(Location::root().field("a").field("b").get(&doc), None);
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut doc = Value::from(json!({"a": [{"b": 1}]}));
        let loc = Location::root().field("a").index(0).field("b");
        if let Some(slot) = loc.get_mut(&mut doc) {
            *slot = Value::Integer(9);
        }
        assert_eq!(doc, Value::from(json!({"a": [{"b": 9}]})));
    }
}
