use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    ast::{IndexSpec, Pattern, Token, token::WILDCARD},
    location::Location,
    parser,
    value::Value,
};

/// How many lookups may nest before the document is assumed to loop.
pub const MAX_LOOKUP_DEPTH: usize = 32;

/// Errors that can occur while walking a document.
///
/// Missing data is never an error: absent keys and indexes resolve to null.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Lookups kept resolving into further lookups
    #[error("lookup of `{key}` exceeded depth {limit}; the document references itself")]
    Cycle { key: String, limit: usize },

    /// Token without defined semantics
    #[error("unsupported operator: {0}")]
    Unsupported(String),
}

/// Evaluation context shared by one walk.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The document lookups resolve against
    pub root: &'a Value,
    /// Number of lookups currently being resolved
    pub depth: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(root: &'a Value) -> Self {
        EvalContext { root, depth: 0 }
    }

    fn deeper(&self) -> Self {
        EvalContext {
            root: self.root,
            depth: self.depth + 1,
        }
    }
}

/// Walks token trees over documents.
///
/// Holds no per-call state, so one evaluator can serve any number of
/// documents.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    max_lookup_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator {
            max_lookup_depth: MAX_LOOKUP_DEPTH,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_lookup_depth(max_lookup_depth: usize) -> Self {
        Evaluator { max_lookup_depth }
    }

    /// Evaluates a token against a whole document.
    ///
    /// # Examples
    ///
    /// ```
    /// use djc::{parse, Evaluator, Value};
    /// use serde_json::json;
    ///
    /// let doc = Value::from(json!({"a": [{"x": 1}, {"x": 2}]}));
    /// let token = parse("a[0].x").unwrap();
    ///
    /// let result = Evaluator::new().evaluate(&token, &doc).unwrap();
    /// assert_eq!(result, Value::Integer(1));
    /// ```
    pub fn evaluate(&self, token: &Token, document: &Value) -> Result<Value, EvalError> {
        self.eval(token, document, document)
    }

    /// Evaluates a token against `node`, resolving lookups from `root`.
    pub fn eval(&self, token: &Token, node: &Value, root: &Value) -> Result<Value, EvalError> {
        self.eval_token(token, node, &EvalContext::new(root))
    }

    fn eval_token(
        &self,
        token: &Token,
        node: &Value,
        ctx: &EvalContext,
    ) -> Result<Value, EvalError> {
        match token {
            Token::Literal(text) => Ok(Value::String(text.clone())),
            Token::PathSegment { key, index } => Ok(self.eval_segment(key, index.as_ref(), node)),
            Token::RegexKey(pattern) => Ok(self.eval_regex_key(pattern, node)),
            Token::Any(branches) => {
                for branch in branches {
                    let value = self.eval_token(branch, node, ctx)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                Ok(Value::Null)
            }
            Token::All(branches) => {
                let mut values = Vec::with_capacity(branches.len());
                for branch in branches {
                    let value = self.eval_token(branch, node, ctx)?;
                    if value.is_null() {
                        return Ok(Value::Null);
                    }
                    values.push(value);
                }
                Ok(Value::Array(values))
            }
            Token::Each(branches) => {
                let values = branches
                    .iter()
                    .map(|branch| self.eval_token(branch, node, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }
            Token::Lookup(inner) => self.eval_lookup(inner, node, ctx),
            Token::Inverse(_) => Err(EvalError::Unsupported("inverse selection".to_string())),
            Token::Root(steps) => self.eval_sequence(steps, node, ctx),
        }
    }

    /// Thread `node` through `steps`.
    ///
    /// A list meeting a navigating step has the rest of the sequence mapped
    /// over its elements and flattened one level. After an explicit `*` the
    /// rest is mapped positionally, one result per element.
    fn eval_sequence(
        &self,
        steps: &[Token],
        node: &Value,
        ctx: &EvalContext,
    ) -> Result<Value, EvalError> {
        let Some((head, rest)) = steps.split_first() else {
            return Ok(node.clone());
        };

        if let Value::Array(items) = node
            && head.navigates()
        {
            let mapped = items
                .iter()
                .map(|item| self.eval_sequence(steps, item, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::sequester(Value::flatten_one(mapped)));
        }

        let next = self.eval_token(head, node, ctx)?;

        if head.is_wildcard()
            && !rest.is_empty()
            && let Value::Array(items) = &next
        {
            let mapped = items
                .iter()
                .map(|item| self.eval_sequence(rest, item, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::sequester(mapped));
        }

        self.eval_sequence(rest, &next, ctx)
    }

    fn eval_segment(&self, key: &str, index: Option<&IndexSpec>, node: &Value) -> Value {
        match node {
            Value::Object(map) => {
                let value = if key == WILDCARD {
                    Value::Array(map.values().cloned().collect())
                } else {
                    map.get(key).cloned().unwrap_or(Value::Null)
                };
                apply_index(value, index)
            }
            Value::Array(items) => {
                if key == WILDCARD {
                    return apply_index(node.clone(), index);
                }
                if let Ok(position) = key.parse::<i64>() {
                    let picked = IndexSpec::single(position).resolve(items);
                    return apply_index(picked, index);
                }
                let mapped = items
                    .iter()
                    .map(|item| self.eval_segment(key, index, item))
                    .collect();
                Value::sequester(Value::flatten_one(mapped))
            }
            Value::Null => Value::Null,
            scalar if key == WILDCARD => apply_index(scalar.clone(), index),
            _ => Value::Null,
        }
    }

    fn eval_regex_key(&self, pattern: &Pattern, node: &Value) -> Value {
        match node {
            Value::Object(map) => {
                let matched: Vec<Value> = map
                    .iter()
                    .filter(|(key, _)| pattern.regex().is_match(key))
                    .map(|(_, value)| value.clone())
                    .collect();
                if matched.is_empty() {
                    Value::Null
                } else {
                    Value::sequester(matched)
                }
            }
            Value::Array(items) => {
                let mapped = items
                    .iter()
                    .map(|item| self.eval_regex_key(pattern, item))
                    .collect();
                Value::sequester(Value::flatten_one(mapped))
            }
            _ => Value::Null,
        }
    }

    fn eval_lookup(
        &self,
        inner: &Token,
        node: &Value,
        ctx: &EvalContext,
    ) -> Result<Value, EvalError> {
        match self.eval_token(inner, node, ctx)? {
            Value::Null => Ok(Value::Null),
            Value::Array(keys) => {
                let resolved = keys
                    .iter()
                    .map(|key| self.resolve_key(key, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::sequester(Value::flatten_one(resolved)))
            }
            key => self.resolve_key(&key, ctx),
        }
    }

    /// Resolve one lookup key as a fresh path from the root.
    fn resolve_key(&self, key: &Value, ctx: &EvalContext) -> Result<Value, EvalError> {
        match self.key_path(key, ctx)? {
            Some(path) => self.eval_token(&path, ctx.root, &ctx.deeper()),
            None => Ok(Value::Null),
        }
    }

    /// Parse a lookup key into a path, enforcing the depth limit.
    fn key_path(&self, key: &Value, ctx: &EvalContext) -> Result<Option<Token>, EvalError> {
        let Some(text) = key.as_key() else {
            return Ok(None);
        };
        if ctx.depth >= self.max_lookup_depth {
            warn!(key = %text, limit = self.max_lookup_depth, "lookup cycle detected");
            return Err(EvalError::Cycle {
                key: text,
                limit: self.max_lookup_depth,
            });
        }
        trace!(key = %text, depth = ctx.depth, "resolving lookup");
        match parser::parse(&text) {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                debug!(key = %text, error = %e, "lookup key is not a path");
                Ok(None)
            }
        }
    }

    // ========================================
    // Locating
    // ========================================

    /// Addresses of the nodes a token selects in `document`.
    ///
    /// Follows the same rules as evaluation, but yields where values live
    /// instead of copies of them. Literals select nothing.
    pub fn locate(&self, token: &Token, document: &Value) -> Result<Vec<Location>, EvalError> {
        let ctx = EvalContext::new(document);
        self.locate_token(token, &Location::root(), &ctx)
    }

    fn locate_token(
        &self,
        token: &Token,
        at: &Location,
        ctx: &EvalContext,
    ) -> Result<Vec<Location>, EvalError> {
        let node = at.get(ctx.root).unwrap_or(&Value::Null);
        match token {
            Token::Literal(_) => Ok(Vec::new()),
            Token::PathSegment { key, index } => {
                Ok(self.locate_segment(key, index.as_ref(), at, node))
            }
            Token::RegexKey(pattern) => Ok(self.locate_regex_key(pattern, at, node)),
            Token::Any(branches) => {
                for branch in branches {
                    let found = self.locate_token(branch, at, ctx)?;
                    if !found.is_empty() {
                        return Ok(found);
                    }
                }
                Ok(Vec::new())
            }
            Token::All(branches) => {
                let mut found = Vec::new();
                for branch in branches {
                    let locations = self.locate_token(branch, at, ctx)?;
                    if locations.is_empty() {
                        return Ok(Vec::new());
                    }
                    found.extend(locations);
                }
                Ok(found)
            }
            Token::Each(branches) => {
                let mut found = Vec::new();
                for branch in branches {
                    found.extend(self.locate_token(branch, at, ctx)?);
                }
                Ok(found)
            }
            Token::Lookup(inner) => {
                let keys = match self.eval_token(inner, node, ctx)? {
                    Value::Array(keys) => keys,
                    Value::Null => Vec::new(),
                    key => vec![key],
                };
                let mut found = Vec::new();
                for key in &keys {
                    if let Some(path) = self.key_path(key, ctx)? {
                        found.extend(self.locate_token(&path, &Location::root(), &ctx.deeper())?);
                    }
                }
                Ok(found)
            }
            Token::Inverse(_) => Err(EvalError::Unsupported("inverse selection".to_string())),
            Token::Root(steps) => {
                let mut current = vec![at.clone()];
                for step in steps {
                    let mut next = Vec::new();
                    for location in &current {
                        next.extend(self.locate_token(step, location, ctx)?);
                    }
                    current = next;
                }
                Ok(current)
            }
        }
    }

    fn locate_segment(
        &self,
        key: &str,
        index: Option<&IndexSpec>,
        at: &Location,
        node: &Value,
    ) -> Vec<Location> {
        match node {
            Value::Object(map) if key == WILDCARD => {
                let keys: Vec<&String> = map.keys().collect();
                let positions = match index {
                    Some(spec) => spec.positions(keys.len()),
                    None => (0..keys.len()).collect(),
                };
                positions.into_iter().map(|i| at.field(keys[i])).collect()
            }
            Value::Object(map) => match map.get(key) {
                Some(value) => narrow_locations(at.field(key), value, index),
                None => Vec::new(),
            },
            Value::Array(items) if key == WILDCARD => {
                let positions = match index {
                    Some(spec) => spec.positions(items.len()),
                    None => (0..items.len()).collect(),
                };
                positions.into_iter().map(|i| at.index(i)).collect()
            }
            Value::Array(items) => {
                if let Ok(position) = key.parse::<i64>() {
                    return IndexSpec::single(position)
                        .positions(items.len())
                        .into_iter()
                        .flat_map(|i| narrow_locations(at.index(i), &items[i], index))
                        .collect();
                }
                items
                    .iter()
                    .enumerate()
                    .flat_map(|(i, item)| self.locate_segment(key, index, &at.index(i), item))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn locate_regex_key(&self, pattern: &Pattern, at: &Location, node: &Value) -> Vec<Location> {
        match node {
            Value::Object(map) => map
                .keys()
                .filter(|key| pattern.regex().is_match(key))
                .map(|key| at.field(key))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| self.locate_regex_key(pattern, &at.index(i), item))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Apply an optional index spec to a selected value. A non-list value acts
/// as a one-element list, matching scalar sequestration.
fn apply_index(value: Value, index: Option<&IndexSpec>) -> Value {
    match (index, value) {
        (None, value) => value,
        (Some(_), Value::Null) => Value::Null,
        (Some(spec), Value::Array(items)) => spec.resolve(&items),
        (Some(spec), scalar) => spec.resolve(std::slice::from_ref(&scalar)),
    }
}

/// Location counterpart of [`apply_index`].
fn narrow_locations(at: Location, value: &Value, index: Option<&IndexSpec>) -> Vec<Location> {
    match (index, value) {
        (None, _) => vec![at],
        (Some(_), Value::Null) => Vec::new(),
        (Some(spec), Value::Array(items)) => spec
            .positions(items.len())
            .into_iter()
            .map(|i| at.index(i))
            .collect(),
        (Some(spec), _) => {
            if spec.positions(1).is_empty() {
                Vec::new()
            } else {
                vec![at]
            }
        }
    }
}
