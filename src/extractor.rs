//! Row projection.
//!
//! An [`Extractor`] holds a tree of [`ExtractNode`]s shaped like the part of
//! the document it flattens. Walking a document alongside that tree yields
//! one [`Row`] per combination of list elements met on the way down:
//!
//! - an interior node over a list repeats its subtree once per element;
//! - sibling subtrees combine by cross product, in declaration order;
//! - a capture leaf writes one field (or several, when splatted).
//!
//! Missing data becomes a null field, never a missing row.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    ast::Token,
    builder::{BuildError, NodeBuilder},
    compose::{Compose, apply_chain},
    evaluator::{EvalError, Evaluator},
    value::Value,
};

static NULL: Value = Value::Null;

/// One output record: column name to value, in column order.
pub type Row = IndexMap<String, Value>;

/// Rows plus the column list they are rendered under.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

/// Node of the extraction tree.
#[derive(Debug, Clone)]
pub struct ExtractNode {
    /// Direct key for a plain interior node
    pub(crate) key: Option<String>,
    /// Captured paths, or the finder path of an interior node
    pub(crate) paths: Vec<Token>,
    pub(crate) output_name: String,
    pub(crate) is_capture: bool,
    pub(crate) is_finder: bool,
    pub(crate) is_splat: bool,
    pub(crate) composition: Vec<Compose>,
    pub(crate) children: Vec<ExtractNode>,
}

impl ExtractNode {
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn children(&self) -> &[ExtractNode] {
        &self.children
    }

    pub fn is_capture(&self) -> bool {
        self.is_capture
    }

    /// Column names of every capture below this node, in declaration order.
    /// Splatted captures report their base name.
    pub fn capture_names(&self) -> Vec<String> {
        if self.is_capture {
            return vec![self.output_name.clone()];
        }
        self.children
            .iter()
            .flat_map(ExtractNode::capture_names)
            .collect()
    }
}

/// Compiled extraction tree.
///
/// # Examples
///
/// ```
/// use djc::{Extractor, Value};
/// use serde_json::json;
///
/// let extractor = Extractor::build(|root| {
///     root.capture("id");
///     root.child("tags", |tags| {
///         tags.capture("name");
///     });
/// })
/// .unwrap();
///
/// let doc = Value::from(json!({"id": 7, "tags": [{"name": "a"}, {"name": "b"}]}));
/// let rows = extractor.rows(&doc).unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1]["tags_name"], Value::String("b".into()));
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    root: ExtractNode,
    header: Option<Vec<String>>,
    evaluator: Evaluator,
}

impl Extractor {
    /// Build an extraction tree by configuring its synthetic root.
    pub fn build(configure: impl FnOnce(&mut NodeBuilder)) -> Result<Self, BuildError> {
        let mut root = NodeBuilder::root();
        configure(&mut root);
        Self::from_builder(&root)
    }

    pub fn from_builder(root: &NodeBuilder) -> Result<Self, BuildError> {
        Ok(Extractor {
            root: root.compile(&[])?,
            header: None,
            evaluator: Evaluator::new(),
        })
    }

    /// Fix the column list instead of deriving it from the rows.
    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn root(&self) -> &ExtractNode {
        &self.root
    }

    /// Flatten a document into rows.
    pub fn rows(&self, document: &Value) -> Result<Vec<Row>, EvalError> {
        let rows = self.expand(&self.root, document, document)?;
        debug!(rows = rows.len(), "projected document");
        Ok(rows)
    }

    /// Rows plus their header.
    pub fn table(&self, document: &Value) -> Result<Table, EvalError> {
        let rows = self.rows(document)?;
        Ok(Table {
            header: self.header(&rows),
            rows,
        })
    }

    /// The explicit header, or every column seen in `rows` in first-seen
    /// order (declared captures first when there are no rows).
    pub fn header(&self, rows: &[Row]) -> Vec<String> {
        if let Some(header) = &self.header {
            return header.clone();
        }
        if rows.is_empty() {
            return self.root.capture_names();
        }
        let mut columns: IndexMap<&str, ()> = IndexMap::new();
        for row in rows {
            for key in row.keys() {
                columns.insert(key, ());
            }
        }
        columns.into_keys().map(str::to_string).collect()
    }

    fn expand(&self, node: &ExtractNode, current: &Value, root: &Value) -> Result<Vec<Row>, EvalError> {
        if node.is_capture {
            return self.capture(node, current, root);
        }
        let data = self.narrow(node, current, root)?;
        self.combine(node, &data, root)
    }

    /// Step from the parent's data into this node's data.
    fn narrow(&self, node: &ExtractNode, current: &Value, root: &Value) -> Result<Value, EvalError> {
        if node.is_finder
            && let Some(path) = node.paths.first()
        {
            return self.evaluator.eval(path, current, root);
        }
        match &node.key {
            Some(key) => Ok(current.get(key).cloned().unwrap_or(Value::Null)),
            None => Ok(current.clone()),
        }
    }

    /// Broadcast over list data, otherwise cross the children's rows. An
    /// empty list still yields one row, with its captures null.
    fn combine(&self, node: &ExtractNode, data: &Value, root: &Value) -> Result<Vec<Row>, EvalError> {
        let data = match data {
            Value::Array(items) if items.is_empty() => &NULL,
            Value::Array(items) => {
                let mut rows = Vec::new();
                for item in items {
                    rows.extend(self.combine(node, item, root)?);
                }
                return Ok(rows);
            }
            data => data,
        };

        let mut rows = vec![Row::new()];
        for child in &node.children {
            let produced = self.expand(child, data, root)?;
            if !produced.is_empty() {
                rows = cross(&rows, &produced);
            }
        }
        Ok(rows)
    }

    fn capture(&self, node: &ExtractNode, current: &Value, root: &Value) -> Result<Vec<Row>, EvalError> {
        let value = self.capture_value(node, current, root)?;
        let mut row = Row::new();
        match value {
            Value::Object(map) if node.is_splat => {
                for (key, field) in map {
                    row.insert(format!("{}_{}", node.output_name, key), field);
                }
            }
            Value::Array(items) if node.is_splat => {
                for (i, field) in items.into_iter().enumerate() {
                    row.insert(format!("{}[{}]", node.output_name, i), field);
                }
            }
            value => {
                row.insert(node.output_name.clone(), value);
            }
        }
        Ok(vec![row])
    }

    /// Evaluate the captured path(s) and run the composition chain.
    fn capture_value(&self, node: &ExtractNode, current: &Value, root: &Value) -> Result<Value, EvalError> {
        match node.paths.as_slice() {
            [] => Ok(apply_chain(&node.composition, current.clone())),
            [path] => {
                let raw = self.evaluator.eval(path, current, root)?;
                Ok(apply_chain(&node.composition, raw))
            }
            paths => {
                let values = paths
                    .iter()
                    .map(|path| self.evaluator.eval(path, current, root))
                    .collect::<Result<Vec<_>, _>>()?;
                let results = collate(values)
                    .into_iter()
                    .map(|row| apply_chain(&node.composition, row))
                    .collect();
                Ok(Value::sequester(results))
            }
        }
    }
}

/// Every row of `left` merged with every row of `right`; the left side
/// varies slowest.
fn cross(left: &[Row], right: &[Row]) -> Vec<Row> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            let mut row = l.clone();
            row.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
            out.push(row);
        }
    }
    out
}

/// Line up the values of several paths by position.
///
/// Lists are spread one element per collated row; scalars repeat on every
/// row. Each collated row is a positional list, one slot per path.
fn collate(values: Vec<Value>) -> Vec<Value> {
    let height = values
        .iter()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .filter(|h| *h > 0);

    let Some(height) = height else {
        return vec![Value::Array(values)];
    };

    (0..height)
        .map(|r| {
            Value::Array(
                values
                    .iter()
                    .map(|value| match value {
                        Value::Array(items) => items.get(r).cloned().unwrap_or(Value::Null),
                        scalar => scalar.clone(),
                    })
                    .collect(),
            )
        })
        .collect()
}
